// crates/capmesh-forwards/src/memory.rs
// ============================================================================
// Module: memory
// Description: In-process forward store.
// Purpose: Back the forward registry without durable storage, for embedded
//          use and tests.
// Dependencies: capmesh-core
// ============================================================================

//! ## Overview
//! The in-memory store mirrors the durable backends' contract: saves
//! overwrite by name and loads return every live reference.

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::MutexGuard;

use capmesh_core::ForwardReference;
use capmesh_core::ForwardStore;
use capmesh_core::StoreError;

/// Forward store holding references in process memory.
#[derive(Default)]
pub struct MemoryForwardStore {
    /// References keyed by forward name.
    references: Mutex<BTreeMap<String, ForwardReference>>,
}

impl MemoryForwardStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Locks the table, recovering from a poisoned lock.
    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, ForwardReference>> {
        match self.references.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl ForwardStore for MemoryForwardStore {
    fn save(&self, reference: &ForwardReference) -> Result<(), StoreError> {
        self.lock().insert(reference.name.clone(), reference.clone());
        Ok(())
    }

    fn remove(&self, name: &str) -> Result<(), StoreError> {
        self.lock().remove(name);
        Ok(())
    }

    fn load_all(&self) -> Result<Vec<ForwardReference>, StoreError> {
        Ok(self.lock().values().cloned().collect())
    }
}
