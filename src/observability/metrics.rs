//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): forwards by method, relayed status
//! - `gateway_request_duration_seconds` (histogram): time until the response
//!   head is relayed (body streaming is not included)
//! - `gateway_errors_total` (counter): failures by kind (`configuration_error`,
//!   `upstream_unavailable`, `partial_relay`)
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; without an installed
//!   recorder every call is a no-op
//! - The Prometheus exporter is opt-in

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape endpoint.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

/// Record one forwarded request.
pub fn record_request(method: &str, status: u16, start_time: Instant) {
    ::metrics::counter!(
        "gateway_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    ::metrics::histogram!(
        "gateway_request_duration_seconds",
        "method" => method.to_string()
    )
    .record(start_time.elapsed().as_secs_f64());
}

/// Record a failed or truncated forward.
pub fn record_error(kind: &'static str) {
    ::metrics::counter!("gateway_errors_total", "kind" => kind).increment(1);
}
