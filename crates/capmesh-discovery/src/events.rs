// crates/capmesh-discovery/src/events.rs
// ============================================================================
// Module: events
// Description: Observer hooks for the registration lifecycle.
// Purpose: Let embedders observe registration progress without coupling the
//          manager to any concrete logging or metrics backend.
// Dependencies: capmesh-core
// ============================================================================

//! ## Overview
//!
//! The registration manager reports every lifecycle transition through
//! [`DiscoveryEvents`]. Implementations must be cheap and must not block;
//! the manager calls them inline from its own task. [`NoopDiscoveryEvents`]
//! is the default sink.

use capmesh_core::ServiceTarget;

/// Observer for registration lifecycle transitions.
pub trait DiscoveryEvents: Send + Sync {
    /// The service registered (or re-registered) and received `target`.
    fn on_registered(&self, target: &ServiceTarget) {
        let _ = target;
    }

    /// A registration attempt failed; `retries_left` is the remaining
    /// budget after this attempt.
    fn on_registration_failed(&self, reason: &str, retries_left: u32) {
        let _ = (reason, retries_left);
    }

    /// The service deregistered from the router.
    fn on_deregistered(&self) {}

    /// A liveness ping completed; `accepted` is false when the router
    /// refused or was unreachable.
    fn on_ping(&self, accepted: bool) {
        let _ = accepted;
    }

    /// A health-state report was dropped; state reporting is best effort
    /// and never fails the caller.
    fn on_state_report_dropped(&self, reason: &str) {
        let _ = reason;
    }

    /// The issued id could not be cached on disk; the service will
    /// register fresh after a restart.
    fn on_instance_cache_failed(&self, reason: &str) {
        let _ = reason;
    }

    /// The registration guard could not be acquired within its deadline
    /// and the tick was skipped.
    fn on_guard_timeout(&self) {}
}

/// Event sink that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopDiscoveryEvents;

impl DiscoveryEvents for NoopDiscoveryEvents {}
