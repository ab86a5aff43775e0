// crates/capmesh-core/src/catalog.rs
// ============================================================================
// Module: Catalog References
// Description: Tool, resource, and forward reference records.
// Purpose: Describe the entries the dispatcher resolves against the registry.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Catalog references are owned outside the routing core; the dispatcher only
//! reads them. Their `reference_type` field is the join key against
//! [`crate::ServiceTarget::service_name`] for the matching role. Forward
//! references identify remote routers whose catalogs are imported locally;
//! imported entries are tagged with the owning forward so they can be
//! unmounted when the forward is unlinked.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Input Schema
// ============================================================================

/// Schema for one tool input property.
///
/// # Invariants
/// - `property_type` is a JSON-schema primitive label (`string`, etc.).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertySchema {
    /// Property value type label.
    #[serde(rename = "type")]
    pub property_type: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// Whether callers must supply the property.
    #[serde(default)]
    pub required: bool,
}

/// Input schema advertised by a tool.
///
/// # Invariants
/// - `required` lists keys of `properties`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputSchema {
    /// Schema kind label, normally `object`.
    #[serde(rename = "type", default)]
    pub schema_type: String,
    /// Declared properties keyed by name.
    #[serde(default)]
    pub properties: BTreeMap<String, PropertySchema>,
    /// Names of required properties.
    #[serde(default)]
    pub required: Vec<String>,
}

// ============================================================================
// SECTION: Tool References
// ============================================================================

/// Catalog entry for an invocable tool.
///
/// # Invariants
/// - `reference_type` joins to a registered tool-invoker's service name.
/// - `forward` carries the owning forward's name for imported entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolReference {
    /// Unique tool name within the catalog.
    pub name: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// Endpoint URI template handed to the downstream invoker.
    pub uri: String,
    /// Join key against registered tool-invoker service names.
    #[serde(rename = "type")]
    pub reference_type: String,
    /// Declared input schema.
    #[serde(default)]
    pub input_schema: InputSchema,
    /// Per-reference configuration overrides.
    #[serde(default)]
    pub configurations: BTreeMap<String, String>,
    /// Name of the forward this entry was imported from, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forward: Option<String>,
}

/// Tool summary as listed by a remote router's catalog.
///
/// # Invariants
/// - Converts to a local [`ToolReference`] with the remote-tool type tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteToolReference {
    /// Tool name on the remote router.
    pub name: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// Declared input schema.
    #[serde(default)]
    pub input_schema: InputSchema,
}

impl RemoteToolReference {
    /// Converts the remote summary into a locally mountable reference.
    ///
    /// The entry is tagged with the owning forward so unlink can find it.
    #[must_use]
    pub fn into_local(self, forward_name: &str, address: &str) -> ToolReference {
        ToolReference {
            name: self.name,
            description: self.description,
            uri: address.to_string(),
            reference_type: "mcp-remote-tool".to_string(),
            input_schema: self.input_schema,
            configurations: BTreeMap::new(),
            forward: Some(forward_name.to_string()),
        }
    }
}

// ============================================================================
// SECTION: Resource References
// ============================================================================

/// Catalog entry for a readable resource.
///
/// # Invariants
/// - `reference_type` joins to a registered resource-provider's service name.
/// - `forward` carries the owning forward's name for imported entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceReference {
    /// Unique resource name within the catalog.
    pub name: String,
    /// Location handed to the downstream provider.
    pub location: String,
    /// Join key against registered resource-provider service names.
    #[serde(rename = "type")]
    pub reference_type: String,
    /// MIME type of the resource content.
    #[serde(default)]
    pub mime_type: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// Per-reference configuration overrides.
    #[serde(default)]
    pub configurations: BTreeMap<String, String>,
    /// Name of the forward this entry was imported from, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forward: Option<String>,
}

// ============================================================================
// SECTION: Forward References
// ============================================================================

/// Link descriptor for a remote router to federate with.
///
/// # Invariants
/// - `name` is unique among live links in a forward registry.
/// - `address` is the remote router's base URL.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ForwardReference {
    /// Local name for the link.
    pub name: String,
    /// Namespace the imported entries are grouped under, when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    /// Base address of the remote router.
    pub address: String,
}

impl ForwardReference {
    /// Creates a forward reference without a namespace.
    #[must_use]
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: None,
            address: address.into(),
        }
    }
}
