//! The forwarding operation.
//!
//! Each call is one linear pass: check the origin, build the outbound
//! request, send it, relay the response or translate the failure. No
//! retries, no shared mutable state.

use std::future::Future;
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::http::{HeaderMap, Method, Request, Response};
use axum::response::IntoResponse;
use tokio::sync::oneshot;

use crate::config::{GatewayConfig, OriginError, UpstreamOrigin};
use crate::error::GatewayError;
use crate::observability::metrics;
use crate::proxy::body::{relay_body, upload_body};
use crate::proxy::headers::{outbound_headers, relay_headers};
use crate::proxy::path::{ForwardPath, MountPrefix};
use crate::proxy::transport::{HyperTransport, Transport};

/// One inbound request as seen below the mount prefix.
#[derive(Debug)]
pub struct InboundRequest {
    pub method: Method,
    pub path: ForwardPath,
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: Body,
}

impl InboundRequest {
    pub fn new(method: Method, path: ForwardPath) -> Self {
        Self {
            method,
            path,
            query: None,
            headers: HeaderMap::new(),
            body: Body::empty(),
        }
    }

    /// Split an axum request, capturing the raw sub-path below `prefix`.
    pub fn from_request(request: Request<Body>, prefix: &MountPrefix) -> Self {
        let (parts, body) = request.into_parts();
        Self {
            path: ForwardPath::from_request_path(parts.uri.path(), prefix),
            query: parts.uri.query().map(str::to_string),
            method: parts.method,
            headers: parts.headers,
            body,
        }
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_body(mut self, body: impl Into<Body>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }
}

/// Relays requests to a single upstream origin.
pub struct Gateway<T = HyperTransport> {
    origin: Result<UpstreamOrigin, OriginError>,
    transport: T,
    response_timeout: Option<Duration>,
}

impl Gateway<HyperTransport> {
    /// Build the production gateway from a loaded configuration.
    pub fn from_config(config: &GatewayConfig) -> Self {
        let origin = UpstreamOrigin::resolve(config.upstream.origin.as_deref());
        match &origin {
            Ok(origin) => tracing::info!(origin = %origin, "Upstream origin configured"),
            Err(e) => tracing::error!(
                error = %e,
                "Upstream origin unusable; every request will be refused"
            ),
        }

        Gateway::new(origin, HyperTransport::new(&config.timeouts))
            .with_response_timeout(config.timeouts.response())
    }
}

impl<T: Transport> Gateway<T> {
    pub fn new(origin: Result<UpstreamOrigin, OriginError>, transport: T) -> Self {
        Self {
            origin,
            transport,
            response_timeout: None,
        }
    }

    /// Bound the wait for the upstream status and headers.
    pub fn with_response_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.response_timeout = timeout;
        self
    }

    pub fn origin(&self) -> Result<&UpstreamOrigin, &OriginError> {
        self.origin.as_ref()
    }

    /// Forward a request and relay the upstream response.
    ///
    /// Always yields a response: failures become structured 500/502 bodies.
    pub async fn forward(&self, request: InboundRequest) -> Response<Body> {
        let start_time = Instant::now();
        let method = request.method.clone();
        let path = request.path.joined();

        let response = match self.try_forward(request).await {
            Ok(response) => response,
            Err(err) => {
                report(&err, &method, &path);
                metrics::record_error(err.kind());
                err.into_response()
            }
        };

        metrics::record_request(method.as_str(), response.status().as_u16(), start_time);
        response
    }

    /// The fallible core of [`Gateway::forward`].
    pub async fn try_forward(
        &self,
        request: InboundRequest,
    ) -> Result<Response<Body>, GatewayError> {
        let origin = self
            .origin
            .as_ref()
            .map_err(|e| GatewayError::NotConfigured(e.clone()))?;

        let InboundRequest {
            method,
            path,
            query,
            headers,
            body,
        } = request;

        let target = origin.target(&path, query.as_deref());
        let forward_body = method != Method::GET && method != Method::HEAD;

        let (body, uploaded) = if forward_body {
            let (body, uploaded) = upload_body(body);
            (body, Some(uploaded))
        } else {
            (Body::empty(), None)
        };

        let mut builder = Request::builder().method(method.clone()).uri(target.as_str());
        if let Some(outbound) = builder.headers_mut() {
            *outbound = outbound_headers(headers, forward_body);
        }
        let outbound = builder
            .body(body)
            .map_err(|source| GatewayError::InvalidTarget {
                target: target.clone(),
                source,
            })?;

        tracing::debug!(method = %method, upstream_url = %target, "Forwarding request");

        let sent = self.transport.send(outbound);
        let result = match self.response_timeout {
            Some(after) => match response_within(sent, uploaded, after).await {
                Some(result) => result,
                None => {
                    return Err(GatewayError::UpstreamTimeout {
                        method,
                        target,
                        after,
                    })
                }
            },
            None => sent.await,
        };

        let response = result.map_err(|source| GatewayError::Upstream {
            method: method.clone(),
            target: target.clone(),
            source,
        })?;

        let (mut parts, body) = response.into_parts();
        relay_headers(&mut parts.headers);

        tracing::debug!(
            method = %method,
            upstream_url = %target,
            status = parts.status.as_u16(),
            "Relaying upstream response"
        );

        Ok(Response::from_parts(parts, relay_body(body, &method, &target)))
    }
}

/// Wait for the upstream response head, giving up `after` the request body
/// has been fully sent. An upstream that answers mid-upload is taken at once.
async fn response_within<F: Future>(
    sent: F,
    uploaded: Option<oneshot::Receiver<()>>,
    after: Duration,
) -> Option<F::Output> {
    tokio::pin!(sent);
    if let Some(uploaded) = uploaded {
        tokio::select! {
            result = &mut sent => return Some(result),
            _ = uploaded => {}
        }
    }
    tokio::time::timeout(after, sent).await.ok()
}

fn report(err: &GatewayError, method: &Method, path: &str) {
    match err {
        GatewayError::NotConfigured(reason) => tracing::error!(
            method = %method,
            path = %path,
            reason = %reason,
            "Upstream origin is not configured; request refused"
        ),
        GatewayError::Upstream { target, source, .. } => tracing::error!(
            method = %method,
            upstream_url = %target,
            error = %source,
            "Upstream request failed"
        ),
        GatewayError::UpstreamTimeout { target, after, .. } => tracing::error!(
            method = %method,
            upstream_url = %target,
            timeout = ?after,
            "Upstream did not respond in time"
        ),
        GatewayError::InvalidTarget { target, source } => tracing::error!(
            method = %method,
            upstream_url = %target,
            error = %source,
            "Cannot build outbound request"
        ),
    }
}
