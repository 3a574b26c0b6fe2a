//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → environment overrides (BACKEND_API_URL, ...)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!     → origin.rs resolves the upstream origin once at startup
//!     → shared via Arc with every request handler
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; there is no hot reload
//! - All fields have defaults to allow minimal configs
//! - A missing or malformed origin is not fatal at startup: every request
//!   reports it instead

pub mod loader;
pub mod origin;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError, ORIGIN_ENV};
pub use origin::{OriginError, UpstreamOrigin};
pub use schema::{
    GatewayConfig, ListenerConfig, MountConfig, ObservabilityConfig, TimeoutConfig,
    UpstreamConfig,
};
pub use validation::{validate_config, ValidationError};
