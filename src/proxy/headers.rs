//! Hop-specific header handling.
//!
//! # Responsibilities
//! - Strip `Host` from the outbound request so the client sets the upstream's
//! - Strip body framing headers when the inbound body is dropped (GET/HEAD)
//! - Strip connection-scoped headers from the relayed response
//!
//! # Design Decisions
//! - Everything else is forwarded verbatim, duplicates and order included
//! - `Authorization` and custom headers are opaque and always forwarded

use axum::http::header::{self, HeaderMap, HeaderName};

/// Connection-scoped response headers owned by the server transport.
const RELAY_DENYLIST: [&str; 3] = ["connection", "keep-alive", "proxy-connection"];

/// Prepare inbound headers for the outbound request.
pub fn outbound_headers(mut headers: HeaderMap, body_forwarded: bool) -> HeaderMap {
    headers.remove(header::HOST);
    if !body_forwarded {
        headers.remove(header::CONTENT_LENGTH);
        headers.remove(header::TRANSFER_ENCODING);
    }
    headers
}

/// Remove connection-scoped headers from an upstream response.
pub fn relay_headers(headers: &mut HeaderMap) {
    for name in RELAY_DENYLIST {
        headers.remove(HeaderName::from_static(name));
    }
}
