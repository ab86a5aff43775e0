// crates/capmesh-core/src/identifiers.rs
// ============================================================================
// Module: Capmesh Identifiers
// Description: Canonical opaque identifiers for registered capability instances.
// Purpose: Provide strongly typed, serializable identifiers with stable wire forms.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Service identifiers are issued by the registry on first registration and
//! remain stable across re-registration. They are opaque strings on the wire;
//! the registry chooses the rendering and nothing else may parse structure
//! out of it.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Identifier Types
// ============================================================================

/// Registry-issued identifier for one capability instance.
///
/// # Invariants
/// - Opaque UTF-8 string; uniqueness is guaranteed by the issuing registry.
/// - Stable for the lifetime of a registration, including re-registration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServiceId(String);

impl ServiceId {
    /// Creates a service identifier from an already-issued value.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Renders the identifier the registry issues for a given sequence number.
    ///
    /// The rendering is an implementation detail of the registry; callers
    /// must treat the result as opaque.
    #[must_use]
    pub fn issue(sequence: u64) -> Self {
        Self(format!("svc-{sequence:016x}"))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for ServiceId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}
