// crates/capmesh-registry/src/namespace.rs
// ============================================================================
// Module: Namespace Allocator
// Description: Fixed pool of reusable namespace slots.
// Purpose: Bind distinct consumer names to stable namespace paths.
// Dependencies: capmesh-core, thiserror
// ============================================================================

//! ## Overview
//! The allocator owns a fixed pool of namespace slots created at startup:
//! `ns-0..ns-{N-1}` plus the reserved `public` slot pre-bound to `public`.
//! Allocation is idempotent per name; a slot binds exactly once per distinct
//! name and is reused for every later lookup. An exhausted pool is a fatal
//! configuration condition, never a silent reuse of another tenant's slot.
//! The pool is small and low-contention, so a single guard suffices.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::sync::Mutex;

use capmesh_core::NamespaceSlot;
use capmesh_core::NamespaceStore;
use capmesh_core::StoreError;
use capmesh_core::namespace::DEFAULT_POOL_SIZE;
use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Failures raised by the namespace allocator.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum NamespaceError {
    /// Every pool slot is bound to a different name.
    #[error("namespace pool exhausted: no free slot for {0}")]
    PoolExhausted(String),
    /// Backing store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

// ============================================================================
// SECTION: Namespace Allocator
// ============================================================================

/// Fixed-capacity allocator of reusable namespace slots.
///
/// # Invariants
/// - Pool size is fixed after `preload`.
/// - At most one slot carries a given bound name.
/// - The `public` slot is never reallocated.
pub struct NamespaceAllocator {
    /// Pool slots, including the reserved public slot.
    slots: Mutex<Vec<NamespaceSlot>>,
    /// Number of allocatable pool slots (excludes public).
    pool_size: usize,
    /// Durable backing store.
    store: Arc<dyn NamespaceStore>,
}

impl NamespaceAllocator {
    /// Creates an allocator with the default pool size.
    #[must_use]
    pub fn new(store: Arc<dyn NamespaceStore>) -> Self {
        Self::with_pool_size(store, DEFAULT_POOL_SIZE)
    }

    /// Creates an allocator with an explicit pool size.
    #[must_use]
    pub fn with_pool_size(store: Arc<dyn NamespaceStore>, pool_size: usize) -> Self {
        Self {
            slots: Mutex::new(Vec::new()),
            pool_size,
            store,
        }
    }

    /// Idempotent startup routine: loads persisted slots, creates the fixed
    /// pool when absent, and guarantees the `public` slot exists. Safe to
    /// call on every boot.
    ///
    /// # Errors
    ///
    /// Returns [`NamespaceError::Store`] when the store cannot be read or
    /// seeded; namespace state is required to serve, so this is fatal at
    /// startup.
    pub fn preload(&self) -> Result<(), NamespaceError> {
        let mut slots = self.lock_slots();
        let persisted = self.store.load_all()?;
        *slots = persisted;
        if !slots.iter().any(|slot| slot.path == capmesh_core::PUBLIC_NAMESPACE) {
            let public = NamespaceSlot::public();
            self.store.save(&public)?;
            slots.push(public);
        }
        let pool_count = slots
            .iter()
            .filter(|slot| slot.path != capmesh_core::PUBLIC_NAMESPACE)
            .count();
        if pool_count < self.pool_size {
            for index in pool_count..self.pool_size {
                let slot = NamespaceSlot::pool_slot(index);
                self.store.save(&slot)?;
                slots.push(slot);
            }
        }
        Ok(())
    }

    /// Returns the slot bound to `name`, binding the first free pool slot on
    /// first sight. Idempotent: repeated calls for one name return the
    /// identical slot.
    ///
    /// # Errors
    ///
    /// Returns [`NamespaceError::PoolExhausted`] when no free slot remains,
    /// and [`NamespaceError::Store`] when persisting the binding fails.
    pub fn allocate(&self, name: &str) -> Result<NamespaceSlot, NamespaceError> {
        let mut slots = self.lock_slots();
        if let Some(bound) = slots
            .iter()
            .find(|slot| slot.assigned_name.as_deref() == Some(name))
        {
            return Ok(bound.clone());
        }
        let Some(free) = slots
            .iter_mut()
            .find(|slot| slot.is_free() && slot.path != capmesh_core::PUBLIC_NAMESPACE)
        else {
            return Err(NamespaceError::PoolExhausted(name.to_string()));
        };
        free.assigned_name = Some(name.to_string());
        let bound = free.clone();
        if let Err(error) = self.store.save(&bound) {
            // Leave the slot free so a later attempt can bind it again.
            free.assigned_name = None;
            return Err(error.into());
        }
        Ok(bound)
    }

    /// Returns a snapshot of every slot.
    #[must_use]
    pub fn list(&self) -> Vec<NamespaceSlot> {
        self.lock_slots().clone()
    }

    /// Acquires the pool guard, recovering from poisoning.
    fn lock_slots(&self) -> std::sync::MutexGuard<'_, Vec<NamespaceSlot>> {
        match self.slots.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
