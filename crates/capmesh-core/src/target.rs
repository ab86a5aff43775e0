// crates/capmesh-core/src/target.rs
// ============================================================================
// Module: Service Targets
// Description: Identity records for registered capability instances.
// Purpose: Describe where a capability lives and what it advertises.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A [`ServiceTarget`] is the registry's record of one downstream capability
//! instance: its logical service name, network address, role, and advertised
//! configuration tunables. Multiple instances may share a
//! `(service_name, role)` pair and form a load-balancing group; the issued
//! [`ServiceId`] is what makes an instance unique.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::identifiers::ServiceId;

// ============================================================================
// SECTION: Service Role
// ============================================================================

/// Role a registered capability plays in the gateway.
///
/// # Invariants
/// - Wire labels are stable: `resource-provider` and `tool-invoker`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ServiceRole {
    /// Serves resource read requests.
    ResourceProvider,
    /// Invokes tools on behalf of callers.
    ToolInvoker,
}

impl ServiceRole {
    /// Returns the stable wire label for the role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ResourceProvider => "resource-provider",
            Self::ToolInvoker => "tool-invoker",
        }
    }
}

impl fmt::Display for ServiceRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Service Target
// ============================================================================

/// Key identifying the instance endpoint a target describes.
///
/// Registries deduplicate registrations by this key; advertised
/// configurations do not participate in instance identity.
pub type InstanceKey = (ServiceRole, String, String, u16);

/// Identity record for a registered capability instance.
///
/// # Invariants
/// - `id` is `None` until the registry issues one; populated afterwards.
/// - `(service_name, role)` may repeat across instances; `id` never does.
/// - `configurations` holds advertised tunables, keyed by option name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceTarget {
    /// Registry-issued identifier, absent before first registration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ServiceId>,
    /// Logical name shared by all instances of one capability type.
    pub service_name: String,
    /// Host address the capability listens on.
    pub host: String,
    /// Port the capability listens on.
    pub port: u16,
    /// Role the capability plays.
    pub role: ServiceRole,
    /// Advertised configuration tunables.
    #[serde(default)]
    pub configurations: BTreeMap<String, String>,
}

impl ServiceTarget {
    /// Creates an unregistered target for the given service.
    #[must_use]
    pub fn new(
        service_name: impl Into<String>,
        host: impl Into<String>,
        port: u16,
        role: ServiceRole,
    ) -> Self {
        Self {
            id: None,
            service_name: service_name.into(),
            host: host.into(),
            port,
            role,
            configurations: BTreeMap::new(),
        }
    }

    /// Adds an advertised configuration entry.
    #[must_use]
    pub fn with_configuration(mut self, option: impl Into<String>, value: impl Into<String>) -> Self {
        self.configurations.insert(option.into(), value.into());
        self
    }

    /// Renders the network address as `host:port`.
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Builds the key registries deduplicate registrations by.
    #[must_use]
    pub fn instance_key(&self) -> InstanceKey {
        (
            self.role,
            self.service_name.clone(),
            self.host.clone(),
            self.port,
        )
    }

    /// Returns true when both targets describe the same instance endpoint.
    ///
    /// The registry uses this to decide between issuing a fresh identifier
    /// and refreshing an existing registration.
    #[must_use]
    pub fn same_instance(&self, other: &Self) -> bool {
        self.instance_key() == other.instance_key()
    }
}
