// crates/capmesh-registry/src/memory.rs
// ============================================================================
// Module: In-Memory Stores
// Description: Volatile store backends for the registry and namespace pool.
// Purpose: Serve standalone deployments and tests without a database.
// Dependencies: capmesh-core
// ============================================================================

//! ## Overview
//! These backends keep registry and namespace state in process memory. They
//! satisfy the same store contracts as durable backends, so the registry
//! code path is identical in standalone and persistent deployments.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Mutex;

use capmesh_core::NamespaceSlot;
use capmesh_core::NamespaceStore;
use capmesh_core::RegistryStore;
use capmesh_core::ServiceId;
use capmesh_core::ServiceTarget;
use capmesh_core::StoreError;

// ============================================================================
// SECTION: Registry Store
// ============================================================================

/// Volatile registry store keyed by service id.
///
/// # Invariants
/// - Saved targets always carry an id.
#[derive(Default)]
pub struct MemoryRegistryStore {
    /// Stored targets keyed by id.
    targets: Mutex<BTreeMap<ServiceId, ServiceTarget>>,
}

impl MemoryRegistryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl RegistryStore for MemoryRegistryStore {
    fn save(&self, target: &ServiceTarget) -> Result<(), StoreError> {
        let Some(id) = target.id.clone() else {
            return Err(StoreError::Io("target has no issued id".to_string()));
        };
        let mut targets = match self.targets.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        targets.insert(id, target.clone());
        Ok(())
    }

    fn remove(&self, id: &ServiceId) -> Result<(), StoreError> {
        let mut targets = match self.targets.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        targets.remove(id);
        Ok(())
    }

    fn load_all(&self) -> Result<Vec<ServiceTarget>, StoreError> {
        let targets = match self.targets.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        Ok(targets.values().cloned().collect())
    }
}

// ============================================================================
// SECTION: Namespace Store
// ============================================================================

/// Volatile namespace store keyed by slot path.
#[derive(Default)]
pub struct MemoryNamespaceStore {
    /// Stored slots keyed by path.
    slots: Mutex<BTreeMap<String, NamespaceSlot>>,
}

impl MemoryNamespaceStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl NamespaceStore for MemoryNamespaceStore {
    fn save(&self, slot: &NamespaceSlot) -> Result<(), StoreError> {
        let mut slots = match self.slots.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        slots.insert(slot.path.clone(), slot.clone());
        Ok(())
    }

    fn load_all(&self) -> Result<Vec<NamespaceSlot>, StoreError> {
        let slots = match self.slots.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        Ok(slots.values().cloned().collect())
    }
}
