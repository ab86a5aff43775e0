// crates/capmesh-core/src/namespace.rs
// ============================================================================
// Module: Namespace Slots
// Description: Reusable logical buckets for grouping mounted catalog entries.
// Purpose: Model the fixed namespace pool shared by native and forward mounts.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Namespaces group tools and resources mounted under one distinct name.
//! The pool is fixed at startup: slots `ns-0..ns-{N-1}` plus the reserved
//! `public` slot, which is pre-bound to the name `public` and never
//! reallocated. A slot binds to at most one name; once bound it is reused
//! for every subsequent lookup of that name.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Path and name of the reserved public namespace slot.
pub const PUBLIC_NAMESPACE: &str = "public";

/// Default number of allocatable pool slots (excludes the public slot).
pub const DEFAULT_POOL_SIZE: usize = 10;

// ============================================================================
// SECTION: Namespace Slot
// ============================================================================

/// One slot in the namespace pool.
///
/// # Invariants
/// - `path` is unique within the pool.
/// - At most one slot in a pool carries a given non-null `assigned_name`.
/// - An unassigned slot has `assigned_name = None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespaceSlot {
    /// Stable slot path, e.g. `ns-0` or `public`.
    pub path: String,
    /// Name bound to the slot, when assigned.
    pub assigned_name: Option<String>,
}

impl NamespaceSlot {
    /// Creates an unassigned pool slot with the given index.
    #[must_use]
    pub fn pool_slot(index: usize) -> Self {
        Self {
            path: format!("ns-{index}"),
            assigned_name: None,
        }
    }

    /// Creates the reserved public slot, pre-bound to `public`.
    #[must_use]
    pub fn public() -> Self {
        Self {
            path: PUBLIC_NAMESPACE.to_string(),
            assigned_name: Some(PUBLIC_NAMESPACE.to_string()),
        }
    }

    /// Returns true when the slot has no bound name.
    #[must_use]
    pub const fn is_free(&self) -> bool {
        self.assigned_name.is_none()
    }
}
