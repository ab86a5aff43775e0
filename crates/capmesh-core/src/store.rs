// crates/capmesh-core/src/store.rs
// ============================================================================
// Module: Store Interfaces
// Description: Pluggable persistence traits for registry state.
// Purpose: Keep the routing core independent of any concrete backing store.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! The registry, namespace allocator, and forward registry persist through
//! these traits. Backends only need point lookups and full loads; query
//! planning stays out of the routing core. Store failures are fatal at
//! startup (a router cannot serve without its registry) and non-fatal,
//! reported conditions afterwards.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::catalog::ForwardReference;
use crate::identifiers::ServiceId;
use crate::namespace::NamespaceSlot;
use crate::target::ServiceTarget;

// ============================================================================
// SECTION: Store Error
// ============================================================================

/// Failures raised by persistence backends.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Backend could not be opened or initialized.
    #[error("store unavailable: {0}")]
    Unavailable(String),
    /// A read or write against the backend failed.
    #[error("store io failure: {0}")]
    Io(String),
    /// Stored payload could not be decoded.
    #[error("store corruption: {0}")]
    Corrupt(String),
}

// ============================================================================
// SECTION: Registry Store
// ============================================================================

/// Durable storage for registered service targets.
///
/// # Invariants
/// - `save` overwrites any previous record with the same id.
/// - `load_all` returns targets with ids populated.
pub trait RegistryStore: Send + Sync {
    /// Persists a registered target.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the write fails.
    fn save(&self, target: &ServiceTarget) -> Result<(), StoreError>;

    /// Removes a target by id. Unknown ids are a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the delete fails.
    fn remove(&self, id: &ServiceId) -> Result<(), StoreError>;

    /// Loads every persisted target.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the read fails.
    fn load_all(&self) -> Result<Vec<ServiceTarget>, StoreError>;
}

// ============================================================================
// SECTION: Namespace Store
// ============================================================================

/// Durable storage for namespace pool slots.
///
/// # Invariants
/// - `save` overwrites any previous slot with the same path.
pub trait NamespaceStore: Send + Sync {
    /// Persists one slot.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the write fails.
    fn save(&self, slot: &NamespaceSlot) -> Result<(), StoreError>;

    /// Loads every persisted slot.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the read fails.
    fn load_all(&self) -> Result<Vec<NamespaceSlot>, StoreError>;
}

// ============================================================================
// SECTION: Forward Store
// ============================================================================

/// Durable storage for forward link references.
///
/// # Invariants
/// - `save` overwrites any previous reference with the same name.
pub trait ForwardStore: Send + Sync {
    /// Persists one forward reference.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the write fails.
    fn save(&self, reference: &ForwardReference) -> Result<(), StoreError>;

    /// Removes a reference by name. Unknown names are a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the delete fails.
    fn remove(&self, name: &str) -> Result<(), StoreError>;

    /// Loads every persisted reference.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the read fails.
    fn load_all(&self) -> Result<Vec<ForwardReference>, StoreError>;
}
