// crates/capmesh-registry/src/registry.rs
// ============================================================================
// Module: Service Registry
// Description: Sharded registry of registered capability instances.
// Purpose: Issue ids, track targets and health, and answer dispatch lookups.
// Dependencies: capmesh-core
// ============================================================================

//! ## Overview
//! The [`ServiceRegistry`] is the shared, highly contended heart of the
//! router: many capability processes register and ping while the dispatcher
//! resolves targets. State is split across a fixed set of shards keyed by the
//! hash of the service id, and each entry carries its own activity lock, so
//! health appends on one service never serialize pings or registrations of
//! another. Identifier issue is atomic; two concurrent registrations of
//! distinct instances can never corrupt the instance index.
//!
//! Lock ordering: the instance index is always taken before a shard, and a
//! shard before an entry's activity lock. No lock is held across store I/O
//! except the index write lock during registration, which protects id
//! issue atomicity.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::hash::DefaultHasher;
use std::hash::Hash;
use std::hash::Hasher;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::RwLock;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use capmesh_core::ActivityRecord;
use capmesh_core::HealthRecord;
use capmesh_core::InstanceKey;
use capmesh_core::RegistryStore;
use capmesh_core::ServiceId;
use capmesh_core::ServiceRole;
use capmesh_core::ServiceTarget;
use capmesh_core::StoreError;
use capmesh_core::health::DEFAULT_HISTORY_CAPACITY;

use crate::events::RegistryEvents;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Number of lock shards for the per-id entry table.
const SHARD_COUNT: usize = 16;

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Tunables for a service registry instance.
///
/// # Invariants
/// - `history_capacity` bounds every per-id health ring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Per-id health ring capacity.
    pub history_capacity: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            history_capacity: DEFAULT_HISTORY_CAPACITY,
        }
    }
}

// ============================================================================
// SECTION: Entry Types
// ============================================================================

/// Registry entry for one registered instance.
///
/// # Invariants
/// - `target` always carries a populated id.
/// - `registered_seq` increases with every registration refresh.
struct ServiceEntry {
    /// Stored target record, id populated.
    target: RwLock<ServiceTarget>,
    /// Liveness and health state, guarded independently of the target.
    activity: Mutex<ActivityRecord>,
    /// Global registration sequence, used for most-recent-wins queries.
    registered_seq: AtomicU64,
}

/// Shard of the per-id entry table.
type Shard = RwLock<BTreeMap<ServiceId, Arc<ServiceEntry>>>;

// ============================================================================
// SECTION: Service Registry
// ============================================================================

/// Authoritative, concurrently mutated map of registered capability targets.
///
/// # Invariants
/// - Issued ids are unique for the lifetime of the registry.
/// - Health appends and evictions are atomic per id.
/// - Mutations on distinct ids in distinct shards never contend.
pub struct ServiceRegistry {
    /// Per-id entries, sharded by id hash.
    shards: Vec<Shard>,
    /// Instance endpoint index used for registration refresh detection.
    index: RwLock<BTreeMap<InstanceKey, ServiceId>>,
    /// Monotonic source for issued ids.
    id_sequence: AtomicU64,
    /// Monotonic source for registration recency.
    registration_sequence: AtomicU64,
    /// Per-id health ring capacity.
    history_capacity: usize,
    /// Durable backing store.
    store: Arc<dyn RegistryStore>,
    /// Warn-level event sink.
    events: Arc<dyn RegistryEvents>,
}

impl ServiceRegistry {
    /// Creates a registry, loading previously persisted targets.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the initial load fails; a router cannot
    /// serve without its registry, so this is fatal at startup.
    pub fn open(
        config: RegistryConfig,
        store: Arc<dyn RegistryStore>,
        events: Arc<dyn RegistryEvents>,
    ) -> Result<Self, StoreError> {
        let registry = Self {
            shards: (0..SHARD_COUNT).map(|_| RwLock::new(BTreeMap::new())).collect(),
            index: RwLock::new(BTreeMap::new()),
            id_sequence: AtomicU64::new(0),
            registration_sequence: AtomicU64::new(0),
            history_capacity: config.history_capacity.max(1),
            store,
            events,
        };
        let persisted = registry.store.load_all()?;
        for target in persisted {
            registry.adopt(target);
        }
        Ok(registry)
    }

    /// Registers a target, issuing an id on first sight of the endpoint.
    ///
    /// A known `(service_name, host, port, role)` tuple keeps its issued id;
    /// its advertised configurations are refreshed instead. The returned
    /// target always carries the id. Store failures are reported through the
    /// event sink and do not fail the registration.
    pub fn register(&self, target: ServiceTarget) -> ServiceTarget {
        let key = target.instance_key();
        let mut index = match self.index.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let stored = if let Some(existing_id) = index.get(&key).cloned() {
            self.refresh(&existing_id, target)
        } else {
            let id = self.issue_id();
            index.insert(key, id.clone());
            self.insert_new(id, target)
        };
        drop(index);
        self.persist(&stored);
        if let Some(id) = &stored.id {
            self.events.on_registered(id, &stored.service_name);
        }
        stored
    }

    /// Deregisters a target by id, falling back to its endpoint tuple.
    ///
    /// Unknown targets are a no-op; deregistration is idempotent.
    pub fn deregister(&self, target: &ServiceTarget) {
        let id = match &target.id {
            Some(id) => Some(id.clone()),
            None => {
                let key = target.instance_key();
                match self.index.read() {
                    Ok(index) => index.get(&key).cloned(),
                    Err(poisoned) => poisoned.into_inner().get(&key).cloned(),
                }
            }
        };
        let Some(id) = id else {
            return;
        };
        let removed = self.remove_entry(&id);
        if let Some(entry) = removed {
            if let Ok(mut activity) = entry.activity.lock() {
                activity.retire();
            }
            if let Err(error) = self.store.remove(&id) {
                self.events.on_store_failure(&error);
            }
            self.events.on_deregistered(&id);
        }
    }

    /// Refreshes the liveness timestamp for an id.
    ///
    /// Unknown ids are reported through the event sink and ignored; the
    /// health ring is not touched.
    pub fn ping(&self, id: &ServiceId) {
        match self.entry(id) {
            Some(entry) => {
                if let Ok(mut activity) = entry.activity.lock() {
                    activity.touch();
                }
                self.events.on_ping(id);
            }
            None => self.events.on_unknown_id(id, "ping"),
        }
    }

    /// Appends a health record to the id's ring, evicting the oldest at
    /// capacity. Unknown ids are reported and ignored.
    pub fn update_last_state(&self, id: &ServiceId, record: HealthRecord) {
        match self.entry(id) {
            Some(entry) => {
                if let Ok(mut activity) = entry.activity.lock() {
                    activity.states.push(record);
                }
                self.events.on_state_recorded(id);
            }
            None => self.events.on_unknown_id(id, "update_last_state"),
        }
    }

    /// Returns one queryable target per logical service name for a role.
    ///
    /// When multiple instances share a name, the most recently registered
    /// instance wins.
    #[must_use]
    pub fn entries(&self, role: ServiceRole) -> BTreeMap<String, ServiceTarget> {
        let mut best: BTreeMap<String, (u64, ServiceTarget)> = BTreeMap::new();
        self.for_each_entry(|entry| {
            let target = match entry.target.read() {
                Ok(target) => target.clone(),
                Err(poisoned) => poisoned.into_inner().clone(),
            };
            if target.role != role {
                return;
            }
            let seq = entry.registered_seq.load(Ordering::Acquire);
            match best.get(&target.service_name) {
                Some((existing_seq, _)) if *existing_seq >= seq => {}
                _ => {
                    best.insert(target.service_name.clone(), (seq, target));
                }
            }
        });
        best.into_iter().map(|(name, (_, target))| (name, target)).collect()
    }

    /// Resolves the instance to route to for a logical service name.
    ///
    /// Returns `None` on a routing miss; callers must treat this as a
    /// domain-level "not found", never a crash.
    #[must_use]
    pub fn service_by_name(&self, service_name: &str, role: ServiceRole) -> Option<ServiceTarget> {
        self.entries(role).remove(service_name)
    }

    /// Returns up to `limit` health records for an id, most recent first.
    ///
    /// An id that registered but never reported state gets a synthesized
    /// missing-in-action record so operators can tell "silent" from
    /// "unknown". Unknown ids return `None`.
    #[must_use]
    pub fn states(&self, id: &ServiceId, limit: usize) -> Option<Vec<HealthRecord>> {
        let entry = self.entry(id)?;
        let mut activity = match entry.activity.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if activity.states.is_empty() {
            activity.states.push(HealthRecord::missing_in_action());
        }
        Some(activity.states.recent(limit))
    }

    /// Returns the activity summary for an id.
    #[must_use]
    pub fn activity(&self, id: &ServiceId) -> Option<ActivityRecord> {
        let entry = self.entry(id)?;
        let activity = match entry.activity.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        Some(activity.clone())
    }

    /// Mutates one advertised configuration entry for every instance of a
    /// logical service, without affecting identity.
    ///
    /// Returns the number of instances updated; zero means the name is
    /// unknown.
    pub fn update_configuration(&self, service_name: &str, option: &str, value: &str) -> usize {
        let mut updated = 0;
        self.for_each_entry(|entry| {
            let mut target = match entry.target.write() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            if target.service_name != service_name {
                return;
            }
            target.configurations.insert(option.to_string(), value.to_string());
            updated += 1;
            let snapshot = target.clone();
            drop(target);
            self.persist(&snapshot);
        });
        updated
    }

    /// Returns the number of registered instances.
    #[must_use]
    pub fn len(&self) -> usize {
        let mut count = 0;
        for shard in &self.shards {
            count += match shard.read() {
                Ok(guard) => guard.len(),
                Err(poisoned) => poisoned.into_inner().len(),
            };
        }
        count
    }

    /// Returns true when no instances are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ============================================================================
// SECTION: Internals
// ============================================================================

impl ServiceRegistry {
    /// Issues a fresh unique id, skipping any value already in use.
    fn issue_id(&self) -> ServiceId {
        loop {
            let seq = self.id_sequence.fetch_add(1, Ordering::Relaxed);
            let id = ServiceId::issue(seq);
            if self.entry(&id).is_none() {
                return id;
            }
        }
    }

    /// Inserts a brand-new entry for an issued id.
    fn insert_new(&self, id: ServiceId, mut target: ServiceTarget) -> ServiceTarget {
        target.id = Some(id.clone());
        let seq = self.registration_sequence.fetch_add(1, Ordering::AcqRel);
        let entry = Arc::new(ServiceEntry {
            target: RwLock::new(target.clone()),
            activity: Mutex::new(ActivityRecord::new(id.clone(), self.history_capacity)),
            registered_seq: AtomicU64::new(seq),
        });
        let shard = &self.shards[Self::shard_for(&id)];
        match shard.write() {
            Ok(mut guard) => {
                guard.insert(id, entry);
            }
            Err(poisoned) => {
                poisoned.into_inner().insert(id, entry);
            }
        }
        target
    }

    /// Refreshes an existing registration: address and configurations are
    /// updated, the issued id and health history are kept.
    fn refresh(&self, id: &ServiceId, mut incoming: ServiceTarget) -> ServiceTarget {
        incoming.id = Some(id.clone());
        let Some(entry) = self.entry(id) else {
            // Index said the id exists but the entry is gone; treat as new.
            return self.insert_new(id.clone(), incoming);
        };
        {
            let mut target = match entry.target.write() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            *target = incoming.clone();
        }
        let seq = self.registration_sequence.fetch_add(1, Ordering::AcqRel);
        entry.registered_seq.store(seq, Ordering::Release);
        if let Ok(mut activity) = entry.activity.lock() {
            activity.touch();
        }
        incoming
    }

    /// Adopts a persisted target during startup load.
    fn adopt(&self, target: ServiceTarget) {
        let Some(id) = target.id.clone() else {
            return;
        };
        let key = target.instance_key();
        match self.index.write() {
            Ok(mut index) => {
                index.insert(key, id.clone());
            }
            Err(poisoned) => {
                poisoned.into_inner().insert(key, id.clone());
            }
        }
        let seq = self.registration_sequence.fetch_add(1, Ordering::AcqRel);
        let entry = Arc::new(ServiceEntry {
            target: RwLock::new(target),
            activity: Mutex::new(ActivityRecord::new(id.clone(), self.history_capacity)),
            registered_seq: AtomicU64::new(seq),
        });
        let shard = &self.shards[Self::shard_for(&id)];
        match shard.write() {
            Ok(mut guard) => {
                guard.insert(id, entry);
            }
            Err(poisoned) => {
                poisoned.into_inner().insert(id, entry);
            }
        }
    }

    /// Persists a target, reporting failures without propagating them.
    fn persist(&self, target: &ServiceTarget) {
        if let Err(error) = self.store.save(target) {
            self.events.on_store_failure(&error);
        }
    }

    /// Looks up the entry for an id.
    fn entry(&self, id: &ServiceId) -> Option<Arc<ServiceEntry>> {
        let shard = &self.shards[Self::shard_for(id)];
        match shard.read() {
            Ok(guard) => guard.get(id).cloned(),
            Err(poisoned) => poisoned.into_inner().get(id).cloned(),
        }
    }

    /// Removes and returns the entry for an id, along with its index slot.
    fn remove_entry(&self, id: &ServiceId) -> Option<Arc<ServiceEntry>> {
        let mut index = match self.index.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        index.retain(|_, indexed| indexed != id);
        let shard = &self.shards[Self::shard_for(id)];
        let removed = match shard.write() {
            Ok(mut guard) => guard.remove(id),
            Err(poisoned) => poisoned.into_inner().remove(id),
        };
        drop(index);
        removed
    }

    /// Visits every entry across all shards.
    fn for_each_entry(&self, mut visit: impl FnMut(&Arc<ServiceEntry>)) {
        for shard in &self.shards {
            let entries: Vec<Arc<ServiceEntry>> = match shard.read() {
                Ok(guard) => guard.values().cloned().collect(),
                Err(poisoned) => poisoned.into_inner().values().cloned().collect(),
            };
            for entry in entries {
                visit(&entry);
            }
        }
    }

    /// Selects the shard index for an id.
    fn shard_for(id: &ServiceId) -> usize {
        let mut hasher = DefaultHasher::new();
        id.hash(&mut hasher);
        usize::try_from(hasher.finish() % (SHARD_COUNT as u64)).unwrap_or(0)
    }
}
