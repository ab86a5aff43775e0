// crates/capmesh-discovery/src/config.rs
// ============================================================================
// Module: config
// Description: TOML configuration for a capability service.
// Purpose: Describe the service announcement and the registration cadence
//          in one declarative document, validated before use.
// Dependencies: capmesh-core, serde, toml, url
// ============================================================================

//! ## Overview
//!
//! A capability service is configured once at startup. The document names
//! the service, the role it announces, the router it registers against,
//! and the retry and ping cadence of the registration loop. Parsing and
//! validation are separate steps so embedders can construct configs
//! programmatically and still run the same checks.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use capmesh_core::ServiceRole;
use capmesh_core::ServiceTarget;
use serde::Deserialize;
use serde::Serialize;
use url::Url;

// ==== SECTION: Errors ====

/// Configuration parse or validation failure.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The TOML document did not parse.
    #[error("configuration parse failure: {0}")]
    Parse(String),
    /// A field value failed validation.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

// ==== SECTION: Schema ====

/// Registration cadence and retry budget.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationConfig {
    /// Router base URL, for example `http://router:8080`.
    pub router_url: String,
    /// Registration attempts per tick before giving up until the next one.
    #[serde(default = "RegistrationConfig::default_retries")]
    pub retries: u32,
    /// Seconds to wait between failed attempts within one tick.
    #[serde(default = "RegistrationConfig::default_retry_wait_secs")]
    pub retry_wait_secs: u64,
    /// Whether a registered service degrades to liveness pings.
    #[serde(default = "RegistrationConfig::default_ping_enabled")]
    pub ping_enabled: bool,
    /// Seconds between scheduler ticks.
    #[serde(default = "RegistrationConfig::default_interval_secs")]
    pub interval_secs: u64,
}

impl RegistrationConfig {
    /// Default retry budget per tick.
    fn default_retries() -> u32 {
        3
    }

    /// Default wait between attempts.
    fn default_retry_wait_secs() -> u64 {
        1
    }

    /// Pings are on unless disabled.
    fn default_ping_enabled() -> bool {
        true
    }

    /// Default tick cadence.
    fn default_interval_secs() -> u64 {
        5
    }

    /// Wait between failed attempts as a [`Duration`].
    #[must_use]
    pub fn retry_wait(&self) -> Duration {
        Duration::from_secs(self.retry_wait_secs)
    }

    /// Scheduler tick cadence as a [`Duration`].
    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

/// Full configuration for one capability service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapabilityConfig {
    /// Service name announced to the router.
    pub name: String,
    /// Role the service fulfils.
    pub role: ServiceRole,
    /// Host the router should dial back to.
    pub host: String,
    /// Port the router should dial back to.
    pub port: u16,
    /// Directory holding the instance-data cache.
    pub data_dir: PathBuf,
    /// Registration cadence.
    pub registration: RegistrationConfig,
    /// Configuration options advertised to callers.
    #[serde(default)]
    pub configurations: BTreeMap<String, String>,
}

impl CapabilityConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the document does not parse
    /// and [`ConfigError::Invalid`] when a field fails validation.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks field-level constraints.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::Invalid("name must not be empty".to_string()));
        }
        if self.host.trim().is_empty() {
            return Err(ConfigError::Invalid("host must not be empty".to_string()));
        }
        if self.port == 0 {
            return Err(ConfigError::Invalid("port must be non-zero".to_string()));
        }
        if self.registration.interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "registration.interval_secs must be at least 1".to_string(),
            ));
        }
        Url::parse(&self.registration.router_url)
            .map_err(|err| ConfigError::Invalid(format!("registration.router_url: {err}")))?;
        Ok(())
    }

    /// Builds the target this service announces to the router.
    #[must_use]
    pub fn announce_target(&self) -> ServiceTarget {
        let mut target = ServiceTarget::new(&self.name, &self.host, self.port, self.role);
        for (option, description) in &self.configurations {
            target = target.with_configuration(option, description);
        }
        target
    }
}
