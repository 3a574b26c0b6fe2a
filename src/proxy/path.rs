//! Mount prefix and sub-path reconstruction.
//!
//! # Design Decisions
//! - Segments come from the raw request path, so percent-encoding survives
//! - No `..` or duplicate-slash normalization; empty segments are kept
//! - Rejoining always uses a single `/`

/// Inbound path prefix owned by the gateway, normalized to `/a/b` form.
///
/// The empty prefix means the gateway owns the whole path space.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountPrefix(String);

impl MountPrefix {
    pub fn new(prefix: &str) -> Self {
        let trimmed = prefix.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            Self(String::new())
        } else if trimmed.starts_with('/') {
            Self(trimmed.to_string())
        } else {
            Self(format!("/{trimmed}"))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }
}

/// The ordered path segments captured after the mount prefix.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ForwardPath {
    segments: Vec<String>,
}

impl ForwardPath {
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    /// Capture the sub-path of a raw request path below `prefix`.
    ///
    /// `/api` and `/api/` both capture the empty sequence; `/api/a/` captures
    /// `["a", ""]` so the trailing slash is forwarded.
    pub fn from_request_path(path: &str, prefix: &MountPrefix) -> Self {
        let rest = match path.strip_prefix(prefix.as_str()) {
            Some(rest) if rest.is_empty() || rest.starts_with('/') => rest,
            _ => path,
        };
        let rest = rest.strip_prefix('/').unwrap_or(rest);

        if rest.is_empty() {
            return Self::default();
        }
        Self::new(rest.split('/'))
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Segments joined with `/`.
    pub fn joined(&self) -> String {
        self.segments.join("/")
    }
}
