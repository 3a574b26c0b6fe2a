//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! gateway / relay body / server produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stdout
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Each request runs inside a span carrying a generated request id
//! - Failures are logged with method and target URL, never returned to clients

pub mod logging;
pub mod metrics;
