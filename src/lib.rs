//! Forwarding gateway library.
//!
//! Mounts a catch-all route under a configurable prefix and relays every
//! request to one upstream origin, streaming bodies in both directions.

pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod proxy;

pub use config::schema::GatewayConfig;
pub use error::GatewayError;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use proxy::{Gateway, InboundRequest};
