// crates/capmesh-discovery/src/manager.rs
// ============================================================================
// Module: manager
// Description: Registration state machine for a capability service.
// Purpose: Drive register, ping, deregister, and health reporting against
//          the router with a bounded guard and a per-tick retry budget.
// Dependencies: capmesh-core, tokio
// ============================================================================

//! ## Overview
//!
//! [`RegistrationManager`] owns the announced target and moves it through
//! the registration lifecycle. A tick either registers an unregistered
//! service or pings a registered one. Registration attempts consume a
//! retry budget; once the budget is spent, each later tick still makes a
//! single attempt so a recovered router is picked up without operator
//! action. A tokio mutex with a hard acquisition deadline keeps
//! overlapping ticks from racing; a tick that cannot take the guard in
//! time is skipped rather than queued.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicU32;
use std::sync::atomic::Ordering;
use std::time::Duration;

use capmesh_core::HealthRecord;
use capmesh_core::ServiceTarget;

use crate::client::DiscoveryClient;
use crate::config::CapabilityConfig;
use crate::events::DiscoveryEvents;
use crate::instance::InstanceDataFile;

/// Deadline for taking the registration guard before a tick is skipped.
const GUARD_WAIT: Duration = Duration::from_secs(1);

/// Registration state machine for one capability service.
pub struct RegistrationManager {
    /// Discovery client aimed at the router.
    client: DiscoveryClient,
    /// Announced target; replaced with the stored target on success.
    target: Mutex<ServiceTarget>,
    /// Remaining registration attempts before per-tick degradation.
    retries: AtomicU32,
    /// Retry budget restored after a successful registration.
    retry_budget: u32,
    /// Wait between failed attempts within one tick.
    retry_wait: Duration,
    /// Whether a registered service sends liveness pings.
    ping_enabled: bool,
    /// True once the router has acknowledged the registration.
    registered: AtomicBool,
    /// Serializes ticks; taken with a hard deadline.
    guard: tokio::sync::Mutex<()>,
    /// Cache of the issued id for restarts.
    instance: InstanceDataFile,
    /// Lifecycle observer.
    events: Arc<dyn DiscoveryEvents>,
}

impl RegistrationManager {
    /// Builds a manager from a validated configuration.
    ///
    /// If the instance-data cache holds an id for this service name, the
    /// announced target carries it so the router refreshes the existing
    /// entry instead of issuing a new id.
    #[must_use]
    pub fn new(
        config: &CapabilityConfig,
        client: DiscoveryClient,
        events: Arc<dyn DiscoveryEvents>,
    ) -> Self {
        let instance = InstanceDataFile::new(&config.data_dir, &config.name);
        let mut target = config.announce_target();
        target.id = instance.cached_id();
        Self {
            client,
            target: Mutex::new(target),
            retries: AtomicU32::new(config.registration.retries),
            retry_budget: config.registration.retries,
            retry_wait: config.registration.retry_wait(),
            ping_enabled: config.registration.ping_enabled,
            registered: AtomicBool::new(false),
            guard: tokio::sync::Mutex::new(()),
            instance,
            events,
        }
    }

    /// True once the router has acknowledged the registration.
    #[must_use]
    pub fn is_registered(&self) -> bool {
        self.registered.load(Ordering::Acquire)
    }

    /// Snapshot of the announced target.
    #[must_use]
    pub fn target(&self) -> ServiceTarget {
        self.lock_target().clone()
    }

    /// Runs one registration tick.
    ///
    /// A registered service degrades to a liveness ping when pings are
    /// enabled; an unregistered one attempts to register within the retry
    /// budget. Ticks that cannot take the guard within [`GUARD_WAIT`] are
    /// skipped.
    pub async fn register(&self) {
        let Ok(_guard) = tokio::time::timeout(GUARD_WAIT, self.guard.lock()).await else {
            self.events.on_guard_timeout();
            return;
        };
        if self.is_registered() {
            if self.ping_enabled {
                self.ping().await;
            }
            return;
        }
        self.try_registering().await;
    }

    /// Deregisters from the router and resets the state machine.
    ///
    /// Deregistration is best effort: a refusing or unreachable router
    /// still leaves this manager unregistered locally, and the router's
    /// health tracking will mark the silence.
    pub async fn deregister(&self) {
        let _guard = self.guard.lock().await;
        let target = self.lock_target().clone();
        if self.client.deregister(&target).await.is_ok() {
            self.events.on_deregistered();
        }
        self.registered.store(false, Ordering::Release);
    }

    /// Reports the last invocation as successful.
    ///
    /// State reporting never fails the caller; a dropped report is
    /// surfaced through the event hook only.
    pub async fn last_as_successful(&self) {
        self.report_state(HealthRecord::healthy()).await;
    }

    /// Reports the last invocation as failed with `reason`.
    ///
    /// State reporting never fails the caller; a dropped report is
    /// surfaced through the event hook only.
    pub async fn last_as_fail(&self, reason: &str) {
        self.report_state(HealthRecord::unhealthy(reason)).await;
    }

    /// Attempts registration until success or the retry budget is spent.
    ///
    /// Always makes at least one attempt, so a spent budget degrades to
    /// one attempt per tick rather than silence.
    async fn try_registering(&self) {
        loop {
            let announced = self.lock_target().clone();
            match self.client.register(&announced).await {
                Ok(stored) => {
                    self.adopt(stored);
                    return;
                }
                Err(err) => {
                    let remaining = self.consume_retry();
                    self.events.on_registration_failed(&err.to_string(), remaining);
                    if remaining == 0 {
                        return;
                    }
                    tokio::time::sleep(self.retry_wait).await;
                }
            }
        }
    }

    /// Adopts the target the router stored and caches the issued id.
    fn adopt(&self, stored: ServiceTarget) {
        if let Some(id) = &stored.id {
            // Cache failures are tolerable; the service re-registers fresh
            // after a restart and the router retires the stale entry.
            if let Err(err) = self.instance.store(id) {
                self.events.on_instance_cache_failed(&err.to_string());
            }
        }
        self.events.on_registered(&stored);
        *self.lock_target() = stored;
        self.registered.store(true, Ordering::Release);
        self.retries.store(self.retry_budget, Ordering::Release);
    }

    /// Sends a liveness ping; a refused or lost ping drops the
    /// registered flag so the next tick re-registers.
    async fn ping(&self) {
        let id = self.lock_target().id.clone();
        let Some(id) = id else {
            self.registered.store(false, Ordering::Release);
            return;
        };
        match self.client.ping(&id).await {
            Ok(()) => self.events.on_ping(true),
            Err(_) => {
                self.events.on_ping(false);
                self.registered.store(false, Ordering::Release);
            }
        }
    }

    /// Sends one health record, swallowing failures into the event hook.
    async fn report_state(&self, record: HealthRecord) {
        let id = self.lock_target().id.clone();
        let Some(id) = id else {
            self.events
                .on_state_report_dropped("service holds no issued id");
            return;
        };
        if let Err(err) = self.client.update_state(&id, &record).await {
            self.events.on_state_report_dropped(&err.to_string());
        }
    }

    /// Consumes one retry, saturating at zero, and returns the remainder.
    fn consume_retry(&self) -> u32 {
        let mut current = self.retries.load(Ordering::Acquire);
        loop {
            let next = current.saturating_sub(1);
            match self.retries.compare_exchange(
                current,
                next,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return next,
                Err(observed) => current = observed,
            }
        }
    }

    /// Locks the target, recovering from a poisoned lock.
    fn lock_target(&self) -> std::sync::MutexGuard<'_, ServiceTarget> {
        match self.target.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
