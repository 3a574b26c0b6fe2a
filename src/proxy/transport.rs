//! Outbound HTTP transport.
//!
//! # Responsibilities
//! - Issue exactly one outbound request per forward
//! - Stream the request body out and the response body back
//!
//! # Design Decisions
//! - `Transport` is the seam between forwarding logic and the network, so the
//!   gateway can be driven by a recording mock in tests
//! - The production transport is hyper-util's pooled client; it sends bodies
//!   as they are polled and resolves as soon as response headers arrive, which
//!   gives duplex streaming without any extra flag

use std::future::Future;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::BoxError;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};

use crate::config::TimeoutConfig;

/// Sends one outbound request and yields the upstream response.
pub trait Transport: Send + Sync + 'static {
    fn send(
        &self,
        request: Request<Body>,
    ) -> impl Future<Output = Result<Response<Body>, BoxError>> + Send;
}

/// Pooled HTTP/1.1 client backed by hyper-util.
#[derive(Clone)]
pub struct HyperTransport {
    client: Client<HttpConnector, Body>,
}

impl HyperTransport {
    pub fn new(timeouts: &TimeoutConfig) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(timeouts.connect());
        connector.set_nodelay(true);

        let client = Client::builder(TokioExecutor::new())
            .pool_idle_timeout(timeouts.pool_idle())
            .build(connector);

        Self { client }
    }
}

impl Default for HyperTransport {
    fn default() -> Self {
        Self::new(&TimeoutConfig::default())
    }
}

impl Transport for HyperTransport {
    fn send(
        &self,
        request: Request<Body>,
    ) -> impl Future<Output = Result<Response<Body>, BoxError>> + Send {
        let fut = self.client.request(request);
        async move {
            fut.await
                .map(|response| response.map(Body::new))
                .map_err(BoxError::from)
        }
    }
}
