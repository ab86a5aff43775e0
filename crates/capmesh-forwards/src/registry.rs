// crates/capmesh-forwards/src/registry.rs
// ============================================================================
// Module: registry
// Description: Lifecycle owner for forward links.
// Purpose: Link, unlink, persist, and restore forwards, keeping mounted
//          catalog entries consistent with the set of live links.
// Dependencies: capmesh-core, capmesh-registry
// ============================================================================

//! ## Overview
//!
//! [`ForwardRegistry`] holds the live links and coordinates the three
//! side effects of linking: namespace allocation for named links, catalog
//! mounting through [`CatalogMounts`], and persistence through the
//! forward store. Unlink unmounts before dropping the link, so a
//! concurrent catalog read never sees entries belonging to a forward
//! that is already gone from the link table. Startup relinking restores
//! each persisted forward independently; an unreachable remote is
//! reported and skipped, never fatal.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use capmesh_core::ForwardReference;
use capmesh_core::ForwardStore;
use capmesh_core::GatewayError;
use capmesh_core::RemoteToolReference;
use capmesh_core::ResourceReference;
use capmesh_registry::NamespaceAllocator;
use capmesh_registry::NamespaceError;

use crate::events::ForwardEvents;
use crate::mounts::CatalogMounts;
use crate::resolver::ForwardResolver;

/// Maps namespace allocation failures into the gateway taxonomy.
fn namespace_failure(err: NamespaceError) -> GatewayError {
    match err {
        NamespaceError::PoolExhausted(name) => {
            GatewayError::Conflict(format!("namespace pool exhausted for {name}"))
        }
        NamespaceError::Store(err) => GatewayError::Store(err.to_string()),
    }
}

/// Lifecycle owner for forward links.
pub struct ForwardRegistry {
    /// Live links keyed by forward name.
    links: Mutex<BTreeMap<String, ForwardReference>>,
    /// Durable storage for link references.
    store: Arc<dyn ForwardStore>,
    /// Remote catalog fetcher.
    resolver: Arc<dyn ForwardResolver>,
    /// Local catalog surface for imported entries.
    mounts: Arc<dyn CatalogMounts>,
    /// Namespace pool for named links.
    namespaces: Arc<NamespaceAllocator>,
    /// Lifecycle observer.
    events: Arc<dyn ForwardEvents>,
}

impl ForwardRegistry {
    /// Builds a registry over the given collaborators.
    #[must_use]
    pub fn new(
        store: Arc<dyn ForwardStore>,
        resolver: Arc<dyn ForwardResolver>,
        mounts: Arc<dyn CatalogMounts>,
        namespaces: Arc<NamespaceAllocator>,
        events: Arc<dyn ForwardEvents>,
    ) -> Self {
        Self {
            links: Mutex::new(BTreeMap::new()),
            store,
            resolver,
            mounts,
            namespaces,
            events,
        }
    }

    /// Links `forward`, importing and mounting its remote catalogs.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Conflict`] when the name is already
    /// linked or the namespace pool is exhausted,
    /// [`GatewayError::Store`] when persistence fails, and propagates
    /// resolver failures for an unreachable remote. Nothing is mounted
    /// when an error is returned.
    pub async fn link(&self, forward: ForwardReference) -> Result<(), GatewayError> {
        if self.lock_links().contains_key(&forward.name) {
            return Err(GatewayError::Conflict(format!(
                "forward {} is already linked",
                forward.name
            )));
        }
        if let Some(namespace) = &forward.namespace {
            self.namespaces
                .allocate(namespace)
                .map_err(namespace_failure)?;
        }
        let tools = self.resolver.list_tools(&forward).await?;
        let resources = self.resolver.list_resources(&forward).await?;

        self.store
            .save(&forward)
            .map_err(|err| GatewayError::Store(err.to_string()))?;
        if let Err(err) = self.mount_entries(&forward, tools, resources) {
            // Roll the partial mount back before surfacing the failure.
            self.mounts.unmount_forward(&forward.name);
            if let Err(store_err) = self.store.remove(&forward.name) {
                self.events.on_store_failure(&store_err.to_string());
            }
            return Err(err);
        }

        let raced = {
            let mut links = self.lock_links();
            if links.contains_key(&forward.name) {
                true
            } else {
                links.insert(forward.name.clone(), forward.clone());
                false
            }
        };
        if raced {
            self.mounts.unmount_forward(&forward.name);
            return Err(GatewayError::Conflict(format!(
                "forward {} is already linked",
                forward.name
            )));
        }
        self.events.on_linked(&forward.name);
        Ok(())
    }

    /// Unlinks the forward called `name`, unmounting its catalog entries
    /// first. Returns the number of entries unmounted.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::NotFound`] when no such link exists and
    /// [`GatewayError::Store`] when the persisted reference cannot be
    /// removed.
    pub fn unlink(&self, name: &str) -> Result<usize, GatewayError> {
        if !self.lock_links().contains_key(name) {
            return Err(GatewayError::NotFound(format!("forward {name} is not linked")));
        }
        // Unmount while the link is still visible, so catalog readers
        // never see orphaned imported entries.
        let removed = self.mounts.unmount_forward(name);
        self.lock_links().remove(name);
        self.store
            .remove(name)
            .map_err(|err| GatewayError::Store(err.to_string()))?;
        self.events.on_unlinked(name);
        Ok(removed)
    }

    /// Restores every persisted forward, skipping unreachable remotes.
    ///
    /// Returns the number of forwards restored. Failures are reported
    /// through the event hook; startup proceeds regardless.
    pub async fn relink_all(&self) -> usize {
        let persisted = match self.store.load_all() {
            Ok(references) => references,
            Err(err) => {
                self.events.on_store_failure(&err.to_string());
                return 0;
            }
        };
        let mut restored = 0;
        for forward in persisted {
            match self.restore(&forward).await {
                Ok(()) => {
                    self.lock_links()
                        .insert(forward.name.clone(), forward.clone());
                    self.events.on_linked(&forward.name);
                    restored += 1;
                }
                Err(err) => {
                    self.events.on_relink_failed(&forward.name, &err.to_string());
                }
            }
        }
        restored
    }

    /// Snapshot of the live links.
    #[must_use]
    pub fn services(&self) -> Vec<ForwardReference> {
        self.lock_links().values().cloned().collect()
    }

    /// True when a link with `name` is live.
    #[must_use]
    pub fn is_linked(&self, name: &str) -> bool {
        self.lock_links().contains_key(name)
    }

    /// Re-resolves and remounts one persisted forward.
    async fn restore(&self, forward: &ForwardReference) -> Result<(), GatewayError> {
        if let Some(namespace) = &forward.namespace {
            // Allocation is idempotent, so a restart reclaims the same slot.
            self.namespaces
                .allocate(namespace)
                .map_err(namespace_failure)?;
        }
        let tools = self.resolver.list_tools(forward).await?;
        let resources = self.resolver.list_resources(forward).await?;
        self.mount_entries(forward, tools, resources)
    }

    /// Mounts the fetched catalogs, tagging each entry with the owner.
    fn mount_entries(
        &self,
        forward: &ForwardReference,
        tools: Vec<RemoteToolReference>,
        resources: Vec<ResourceReference>,
    ) -> Result<(), GatewayError> {
        for tool in tools {
            self.mounts
                .mount_tool(tool.into_local(&forward.name, &forward.address))?;
        }
        for mut resource in resources {
            resource.forward = Some(forward.name.clone());
            self.mounts.mount_resource(resource)?;
        }
        Ok(())
    }

    /// Locks the link table, recovering from a poisoned lock.
    fn lock_links(&self) -> MutexGuard<'_, BTreeMap<String, ForwardReference>> {
        match self.links.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
