//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the axum Router for the mount prefix
//! - Register every supported method against one shared handler
//! - Wire up tracing middleware
//! - Serve with graceful shutdown

use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::{ConnectInfo, DefaultBodyLimit, State},
    http::Request,
    response::Response,
    routing::{on, MethodFilter, MethodRouter},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::config::GatewayConfig;
use crate::lifecycle::shutdown::notified;
use crate::proxy::{Gateway, HyperTransport, InboundRequest, MountPrefix, Transport};

/// Methods routed through the gateway. Anything else gets 405.
pub fn forwarded_methods() -> MethodFilter {
    MethodFilter::GET
        .or(MethodFilter::POST)
        .or(MethodFilter::PUT)
        .or(MethodFilter::DELETE)
        .or(MethodFilter::PATCH)
        .or(MethodFilter::HEAD)
        .or(MethodFilter::OPTIONS)
}

/// Application state injected into the handler.
pub struct AppState<T = HyperTransport> {
    pub gateway: Arc<Gateway<T>>,
    pub prefix: Arc<MountPrefix>,
}

impl<T> Clone for AppState<T> {
    fn clone(&self) -> Self {
        Self {
            gateway: self.gateway.clone(),
            prefix: self.prefix.clone(),
        }
    }
}

/// Build the router that mounts `gateway` under `prefix`.
///
/// `prefix`, `prefix/` and `prefix/{*path}` all share one method router.
pub fn router<T: Transport>(gateway: Arc<Gateway<T>>, prefix: MountPrefix) -> Router {
    let methods: MethodRouter<AppState<T>> = on(forwarded_methods(), gateway_handler::<T>);

    let routes = if prefix.is_root() {
        Router::new()
            .route("/", methods.clone())
            .route("/{*path}", methods)
    } else {
        let base = prefix.as_str();
        Router::new()
            .route(base, methods.clone())
            .route(&format!("{base}/"), methods.clone())
            .route(&format!("{base}/{{*path}}"), methods)
    };

    let state = AppState {
        gateway,
        prefix: Arc::new(prefix),
    };

    routes
        .with_state(state)
        .layer(DefaultBodyLimit::disable())
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
            let peer = request
                .extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|info| info.0);
            tracing::info_span!(
                "request",
                id = %Uuid::new_v4(),
                method = %request.method(),
                uri = %request.uri(),
                peer = ?peer
            )
        }))
}

/// HTTP server for the forwarding gateway.
pub struct HttpServer {
    router: Router,
    config: GatewayConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: GatewayConfig) -> Self {
        let gateway = Arc::new(Gateway::from_config(&config));
        let router = router(gateway, MountPrefix::new(&config.mount.prefix));
        Self { router, config }
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    ///
    /// Draining is bounded by `timeouts.shutdown_grace_secs`; relays still
    /// running at the deadline are dropped.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            mount_prefix = %self.config.mount.prefix,
            "HTTP server starting"
        );

        let grace = self.config.timeouts.shutdown_grace();
        let deadline = drain_deadline(shutdown.resubscribe(), grace);

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        let serve = axum::serve(listener, app)
            .with_graceful_shutdown(notified(shutdown))
            .into_future();

        tokio::select! {
            result = serve => {
                result?;
                tracing::info!("HTTP server stopped");
            }
            _ = deadline => {
                tracing::warn!(
                    grace = ?grace,
                    "Drain deadline reached; dropping in-flight requests"
                );
            }
        }
        Ok(())
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }
}

/// Resolve `grace` after shutdown is triggered, or never when unbounded.
async fn drain_deadline(shutdown: broadcast::Receiver<()>, grace: Option<Duration>) {
    notified(shutdown).await;
    match grace {
        Some(grace) => tokio::time::sleep(grace).await,
        None => std::future::pending().await,
    }
}

async fn gateway_handler<T: Transport>(
    State(state): State<AppState<T>>,
    request: Request<Body>,
) -> Response {
    let inbound = InboundRequest::from_request(request, &state.prefix);
    state.gateway.forward(inbound).await
}
