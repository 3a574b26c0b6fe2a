//! Request forwarding subsystem.
//!
//! # Data Flow
//! ```text
//! InboundRequest (method, captured path, headers, body stream)
//!     → gateway.rs (origin check, target URL)
//!     → headers.rs (drop Host / framing)
//!     → transport.rs (one outbound call, body streamed)
//!     → headers.rs (drop connection-scoped response headers)
//!     → body.rs (stream upstream body back, report truncation)
//! ```

pub mod body;
pub mod gateway;
pub mod headers;
pub mod path;
pub mod transport;

pub use gateway::{Gateway, InboundRequest};
pub use path::{ForwardPath, MountPrefix};
pub use transport::{HyperTransport, Transport};
