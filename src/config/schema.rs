//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the forwarding gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// The upstream origin all requests are forwarded to.
    pub upstream: UpstreamConfig,

    /// Inbound path prefix the gateway owns.
    pub mount: MountConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
        }
    }
}

/// Upstream origin configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Base URL of the backend (e.g., "http://backend:8000").
    ///
    /// Left unset, the gateway still starts but answers every request with
    /// a configuration error.
    pub origin: Option<String>,
}

/// Mount configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MountConfig {
    /// Path prefix under which every method/path is forwarded.
    /// An empty prefix forwards the whole path space.
    pub prefix: String,
}

impl Default for MountConfig {
    fn default() -> Self {
        Self {
            prefix: "/api".to_string(),
        }
    }
}

/// Timeouts applied to the outbound call.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Connection establishment timeout in seconds (0 = none).
    pub connect_secs: u64,

    /// Time allowed for the upstream status and headers to arrive, in
    /// seconds (0 = none). Body streaming is never timed out.
    pub response_secs: u64,

    /// How long idle pooled upstream connections are kept, in seconds.
    pub pool_idle_secs: u64,

    /// How long in-flight relays may drain after shutdown is triggered, in
    /// seconds (0 = wait for all of them).
    pub shutdown_grace_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 10,
            response_secs: 0,
            pool_idle_secs: 90,
            shutdown_grace_secs: 30,
        }
    }
}

impl TimeoutConfig {
    pub fn connect(&self) -> Option<Duration> {
        non_zero_secs(self.connect_secs)
    }

    pub fn response(&self) -> Option<Duration> {
        non_zero_secs(self.response_secs)
    }

    pub fn pool_idle(&self) -> Option<Duration> {
        non_zero_secs(self.pool_idle_secs)
    }

    pub fn shutdown_grace(&self) -> Option<Duration> {
        non_zero_secs(self.shutdown_grace_secs)
    }
}

fn non_zero_secs(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Default tracing filter, used when `RUST_LOG` is not set.
    pub log_filter: String,

    /// Enable the Prometheus exporter.
    pub metrics_enabled: bool,

    /// Address the Prometheus exporter listens on.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_filter: "forwarding_gateway=info,tower_http=info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
