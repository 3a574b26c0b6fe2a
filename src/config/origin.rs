//! Upstream origin parsing.
//!
//! # Responsibilities
//! - Parse the configured origin string into a validated base URL
//! - Build outbound target URLs from a captured sub-path
//!
//! # Design Decisions
//! - Only `http` origins are accepted; the outbound client speaks plain HTTP/1.1
//! - A trailing `/` is trimmed so exactly one `/` separates origin and sub-path
//! - A base path is allowed and kept verbatim (`http://backend:8000/v1`)

use std::fmt;

use thiserror::Error;
use url::Url;

use crate::proxy::path::ForwardPath;

/// Why the upstream origin cannot be used.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OriginError {
    /// No origin was supplied.
    #[error("upstream origin is not set")]
    Missing,

    /// The origin string is not a usable absolute URL.
    #[error("upstream origin {value:?} is malformed: {reason}")]
    Malformed { value: String, reason: String },

    /// The origin uses a scheme the outbound transport cannot speak.
    #[error("upstream origin scheme {scheme:?} is not supported (expected http)")]
    UnsupportedScheme { scheme: String },
}

/// The single backend all forwarded requests go to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamOrigin {
    base: String,
}

impl UpstreamOrigin {
    /// Parse and validate an origin such as `http://backend:8000`.
    pub fn parse(value: &str) -> Result<Self, OriginError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(OriginError::Missing);
        }

        let url = Url::parse(trimmed).map_err(|e| OriginError::Malformed {
            value: trimmed.to_string(),
            reason: e.to_string(),
        })?;

        if url.scheme() != "http" {
            return Err(OriginError::UnsupportedScheme {
                scheme: url.scheme().to_string(),
            });
        }
        if url.host_str().map_or(true, str::is_empty) {
            return Err(OriginError::Malformed {
                value: trimmed.to_string(),
                reason: "missing host".to_string(),
            });
        }
        if url.query().is_some() || url.fragment().is_some() {
            return Err(OriginError::Malformed {
                value: trimmed.to_string(),
                reason: "origin must not carry a query or fragment".to_string(),
            });
        }

        Ok(Self {
            base: url.as_str().trim_end_matches('/').to_string(),
        })
    }

    /// Resolve an optional configured value, treating absence as `Missing`.
    pub fn resolve(value: Option<&str>) -> Result<Self, OriginError> {
        match value {
            Some(v) => Self::parse(v),
            None => Err(OriginError::Missing),
        }
    }

    /// The origin without a trailing slash.
    pub fn as_str(&self) -> &str {
        &self.base
    }

    /// Build `<origin>/<joined path>[?query]`.
    pub fn target(&self, path: &ForwardPath, query: Option<&str>) -> String {
        let mut target = format!("{}/{}", self.base, path.joined());
        if let Some(query) = query {
            target.push('?');
            target.push_str(query);
        }
        target
    }
}

impl fmt::Display for UpstreamOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.base)
    }
}
