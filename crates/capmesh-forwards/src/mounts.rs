// crates/capmesh-forwards/src/mounts.rs
// ============================================================================
// Module: mounts
// Description: Local catalog mounting for imported entries.
// Purpose: Hold the tool and resource entries a forward imported, keyed so
//          unlink removes exactly the owning forward's entries.
// Dependencies: capmesh-core
// ============================================================================

//! ## Overview
//!
//! [`CatalogMounts`] is the seam between federation and whatever catalog
//! the router actually serves from. Entries arrive already tagged with
//! their owning forward. [`MemoryCatalogMounts`] is the in-process
//! implementation the router uses.

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::MutexGuard;

use capmesh_core::GatewayError;
use capmesh_core::ResourceReference;
use capmesh_core::ToolReference;

/// Catalog surface forwards mount imported entries into.
pub trait CatalogMounts: Send + Sync {
    /// Mounts one imported tool; a same-name entry is replaced.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Store`] when the backing catalog rejects
    /// the entry.
    fn mount_tool(&self, reference: ToolReference) -> Result<(), GatewayError>;

    /// Mounts one imported resource; a same-name entry is replaced.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Store`] when the backing catalog rejects
    /// the entry.
    fn mount_resource(&self, reference: ResourceReference) -> Result<(), GatewayError>;

    /// Removes every entry tagged with `forward_name` and returns the
    /// number removed.
    fn unmount_forward(&self, forward_name: &str) -> usize;

    /// Lists the currently mounted tools.
    fn tools(&self) -> Vec<ToolReference>;

    /// Lists the currently mounted resources.
    fn resources(&self) -> Vec<ResourceReference>;
}

/// In-process catalog mounts keyed by entry name.
#[derive(Default)]
pub struct MemoryCatalogMounts {
    /// Mounted tools keyed by name.
    tools: Mutex<BTreeMap<String, ToolReference>>,
    /// Mounted resources keyed by name.
    resources: Mutex<BTreeMap<String, ResourceReference>>,
}

impl MemoryCatalogMounts {
    /// Creates an empty mount table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Locks the tool table, recovering from a poisoned lock.
    fn lock_tools(&self) -> MutexGuard<'_, BTreeMap<String, ToolReference>> {
        match self.tools.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Locks the resource table, recovering from a poisoned lock.
    fn lock_resources(&self) -> MutexGuard<'_, BTreeMap<String, ResourceReference>> {
        match self.resources.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl CatalogMounts for MemoryCatalogMounts {
    fn mount_tool(&self, reference: ToolReference) -> Result<(), GatewayError> {
        self.lock_tools().insert(reference.name.clone(), reference);
        Ok(())
    }

    fn mount_resource(&self, reference: ResourceReference) -> Result<(), GatewayError> {
        self.lock_resources()
            .insert(reference.name.clone(), reference);
        Ok(())
    }

    fn unmount_forward(&self, forward_name: &str) -> usize {
        let mut removed = 0;
        {
            let mut tools = self.lock_tools();
            let before = tools.len();
            tools.retain(|_, entry| entry.forward.as_deref() != Some(forward_name));
            removed += before - tools.len();
        }
        {
            let mut resources = self.lock_resources();
            let before = resources.len();
            resources.retain(|_, entry| entry.forward.as_deref() != Some(forward_name));
            removed += before - resources.len();
        }
        removed
    }

    fn tools(&self) -> Vec<ToolReference> {
        self.lock_tools().values().cloned().collect()
    }

    fn resources(&self) -> Vec<ResourceReference> {
        self.lock_resources().values().cloned().collect()
    }
}
