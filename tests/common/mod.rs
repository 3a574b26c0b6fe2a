//! Shared utilities for gateway integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;

use axum::Router;
use forwarding_gateway::{GatewayConfig, HttpServer, Shutdown};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Serve `app` as a mock upstream on an ephemeral port.
pub async fn start_upstream(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

/// An address nothing listens on.
pub async fn closed_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

/// A gateway running on an ephemeral port; stops when dropped.
pub struct RunningGateway {
    pub addr: SocketAddr,
    pub server: JoinHandle<()>,
    shutdown: Shutdown,
}

impl RunningGateway {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn stop(&self) {
        self.shutdown.trigger();
    }
}

impl Drop for RunningGateway {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Start a gateway mounted at `/api` forwarding to `origin`.
pub async fn start_gateway(origin: Option<String>) -> RunningGateway {
    start_gateway_with(origin, |_| {}).await
}

/// Like [`start_gateway`], letting the test adjust the configuration first.
pub async fn start_gateway_with(
    origin: Option<String>,
    configure: impl FnOnce(&mut GatewayConfig),
) -> RunningGateway {
    let mut config = GatewayConfig::default();
    config.upstream.origin = origin;
    config.timeouts.connect_secs = 2;
    configure(&mut config);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    config.listener.bind_address = addr.to_string();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let server = HttpServer::new(config);
    let server = tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    RunningGateway {
        addr,
        server,
        shutdown,
    }
}

/// Start a gateway in front of a freshly started upstream.
pub async fn start_pair(upstream: Router) -> (RunningGateway, SocketAddr) {
    let upstream_addr = start_upstream(upstream).await;
    let gateway = start_gateway(Some(format!("http://{upstream_addr}"))).await;
    (gateway, upstream_addr)
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}
