//! Gateway error taxonomy.
//!
//! Every failure is caught at the gateway boundary and rendered as a small
//! JSON body. The status code tells the caller whether the fault is local
//! configuration (500) or upstream reachability (502). Upstream error details
//! are logged, never returned.

use std::time::Duration;

use axum::{
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use axum::BoxError;
use serde::Serialize;
use thiserror::Error;

use crate::config::OriginError;

/// A forward that could not be relayed.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The upstream origin is unset or unusable.
    #[error("gateway is not configured: {0}")]
    NotConfigured(#[from] OriginError),

    /// Connection refused, DNS failure, reset before headers, ...
    #[error("{method} {target} failed: {source}")]
    Upstream {
        method: Method,
        target: String,
        #[source]
        source: BoxError,
    },

    /// Upstream did not send status and headers in time.
    #[error("{method} {target} timed out after {after:?}")]
    UpstreamTimeout {
        method: Method,
        target: String,
        after: Duration,
    },

    /// The outbound request could not be built.
    #[error("cannot build outbound request for {target}")]
    InvalidTarget {
        target: String,
        #[source]
        source: axum::http::Error,
    },
}

/// JSON body returned for every gateway error.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub kind: &'static str,
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::NotConfigured(_) => StatusCode::INTERNAL_SERVER_ERROR,
            GatewayError::Upstream { .. }
            | GatewayError::UpstreamTimeout { .. }
            | GatewayError::InvalidTarget { .. } => StatusCode::BAD_GATEWAY,
        }
    }

    /// Stable machine-readable error class.
    pub fn kind(&self) -> &'static str {
        match self {
            GatewayError::NotConfigured(_) => "configuration_error",
            GatewayError::Upstream { .. }
            | GatewayError::UpstreamTimeout { .. }
            | GatewayError::InvalidTarget { .. } => "upstream_unavailable",
        }
    }

    fn public_message(&self) -> &'static str {
        match self {
            GatewayError::NotConfigured(_) => {
                "Backend service is not configured; contact the administrator."
            }
            GatewayError::UpstreamTimeout { .. } => {
                "Backend service did not respond in time."
            }
            GatewayError::Upstream { .. } | GatewayError::InvalidTarget { .. } => {
                "Error while proxying the request to the backend service."
            }
        }
    }

    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            error: self.public_message(),
            kind: self.kind(),
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.body())).into_response()
    }
}
