// crates/capmesh-registry/src/events.rs
// ============================================================================
// Module: Registry Events
// Description: Observability hooks for registry mutations.
// Purpose: Report warn-level conditions without a hard logging dependency.
// Dependencies: capmesh-core
// ============================================================================

//! ## Overview
//! The registry reports noteworthy conditions through this thin event
//! interface instead of binding to a logging framework. Deployments can plug
//! in structured logging or metrics without redesign; the default sink
//! discards events. Event delivery must never fail the triggering operation.

// ============================================================================
// SECTION: Imports
// ============================================================================

use capmesh_core::ServiceId;
use capmesh_core::StoreError;

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Sink for registry lifecycle and warning events.
pub trait RegistryEvents: Send + Sync {
    /// A target registered or refreshed its registration.
    fn on_registered(&self, id: &ServiceId, service_name: &str);
    /// A target deregistered.
    fn on_deregistered(&self, id: &ServiceId);
    /// A known id refreshed its liveness timestamp.
    fn on_ping(&self, id: &ServiceId);
    /// A known id appended a record to its health ring.
    fn on_state_recorded(&self, id: &ServiceId);
    /// A ping or state update addressed an id the registry does not know.
    fn on_unknown_id(&self, id: &ServiceId, operation: &'static str);
    /// A persistence write failed after startup.
    fn on_store_failure(&self, error: &StoreError);
}

/// Event sink that discards everything.
///
/// # Invariants
/// - Events are intentionally dropped.
pub struct NoopRegistryEvents;

impl RegistryEvents for NoopRegistryEvents {
    fn on_registered(&self, _id: &ServiceId, _service_name: &str) {}

    fn on_deregistered(&self, _id: &ServiceId) {}

    fn on_ping(&self, _id: &ServiceId) {}

    fn on_state_recorded(&self, _id: &ServiceId) {}

    fn on_unknown_id(&self, _id: &ServiceId, _operation: &'static str) {}

    fn on_store_failure(&self, _error: &StoreError) {}
}
