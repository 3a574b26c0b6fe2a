//! Configuration loading from disk and the environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable supplying the upstream origin.
pub const ORIGIN_ENV: &str = "BACKEND_API_URL";
/// Environment variable overriding the listener bind address.
pub const BIND_ENV: &str = "GATEWAY_BIND_ADDRESS";
/// Environment variable overriding the mount prefix.
pub const PREFIX_ENV: &str = "GATEWAY_MOUNT_PREFIX";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: GatewayConfig = toml::from_str(&content)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

impl GatewayConfig {
    /// Apply overrides from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_with(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary variable source.
    ///
    /// An empty `BACKEND_API_URL` clears the origin rather than being kept
    /// as a malformed value.
    pub fn apply_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(origin) = lookup(ORIGIN_ENV) {
            let origin = origin.trim();
            self.upstream.origin = (!origin.is_empty()).then(|| origin.to_string());
        }
        if let Some(bind) = lookup(BIND_ENV) {
            self.listener.bind_address = bind;
        }
        if let Some(prefix) = lookup(PREFIX_ENV) {
            self.mount.prefix = prefix;
        }
    }
}
