// crates/capmesh-server/src/config.rs
// ============================================================================
// Module: config
// Description: TOML configuration for the router process.
// Purpose: Select the bind address, backing store, and core cadences in
//          one validated document.
// Dependencies: serde, toml
// ============================================================================

//! ## Overview
//!
//! Router configuration is deliberately small: where to listen, where to
//! persist, and the two deadlines dispatch and federation carry. Every
//! field has a default so an empty document yields a runnable in-memory
//! router, which is also what the tests use.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;

/// Configuration parse or validation failure.
#[derive(Debug, thiserror::Error)]
pub enum RouterConfigError {
    /// The TOML document did not parse.
    #[error("configuration parse failure: {0}")]
    Parse(String),
    /// A field value failed validation.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Backing store selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum StoreConfig {
    /// Volatile in-process tables; state is lost on restart.
    Memory,
    /// Durable SQLite database at `path`.
    Sqlite {
        /// Database file location.
        path: PathBuf,
    },
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::Memory
    }
}

/// Full router process configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Host to bind the HTTP listener on.
    pub host: String,
    /// Port to bind the HTTP listener on; 0 picks an ephemeral port.
    pub port: u16,
    /// Backing store selection.
    pub store: StoreConfig,
    /// Health records retained per service.
    pub history_capacity: usize,
    /// Allocatable namespace slots, excluding the public namespace.
    pub namespace_pool_size: usize,
    /// Deadline in seconds for dispatched invocations.
    pub invoke_timeout_secs: u64,
    /// Deadline in seconds for remote catalog fetches.
    pub resolve_timeout_secs: u64,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            store: StoreConfig::default(),
            history_capacity: 10,
            namespace_pool_size: 10,
            invoke_timeout_secs: 30,
            resolve_timeout_secs: 10,
        }
    }
}

impl RouterConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`RouterConfigError::Parse`] when the document does not
    /// parse and [`RouterConfigError::Invalid`] when a field fails
    /// validation.
    pub fn from_toml_str(raw: &str) -> Result<Self, RouterConfigError> {
        let config: Self =
            toml::from_str(raw).map_err(|err| RouterConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks field-level constraints.
    ///
    /// # Errors
    ///
    /// Returns [`RouterConfigError::Invalid`] naming the offending field.
    pub fn validate(&self) -> Result<(), RouterConfigError> {
        if self.host.trim().is_empty() {
            return Err(RouterConfigError::Invalid(
                "host must not be empty".to_string(),
            ));
        }
        if self.history_capacity == 0 {
            return Err(RouterConfigError::Invalid(
                "history_capacity must be at least 1".to_string(),
            ));
        }
        if let StoreConfig::Sqlite { path } = &self.store {
            if path.as_os_str().is_empty() {
                return Err(RouterConfigError::Invalid(
                    "store.path must not be empty".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Dispatch deadline as a [`Duration`].
    #[must_use]
    pub fn invoke_timeout(&self) -> Duration {
        Duration::from_secs(self.invoke_timeout_secs)
    }

    /// Catalog fetch deadline as a [`Duration`].
    #[must_use]
    pub fn resolve_timeout(&self) -> Duration {
        Duration::from_secs(self.resolve_timeout_secs)
    }
}
