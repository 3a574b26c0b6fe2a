//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (axum setup, method registration, trace span)
//!     → proxy::InboundRequest (method, raw sub-path, headers, body)
//!     → proxy::Gateway::forward
//!     → streamed response back to the client
//! ```

pub mod server;

pub use server::{router, AppState, HttpServer};
