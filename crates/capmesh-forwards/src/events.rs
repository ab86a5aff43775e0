// crates/capmesh-forwards/src/events.rs
// ============================================================================
// Module: events
// Description: Observer hooks for the forward lifecycle.
// Purpose: Surface link, unlink, and relink outcomes without coupling the
//          registry to a logging backend.
// Dependencies: none
// ============================================================================

//! ## Overview
//!
//! Relinking at startup must not fail the router when a remote is down,
//! so those failures are reported here instead of propagated.
//! [`NoopForwardEvents`] is the default sink.

/// Observer for forward lifecycle transitions.
pub trait ForwardEvents: Send + Sync {
    /// A forward was linked and its catalog mounted.
    fn on_linked(&self, name: &str) {
        let _ = name;
    }

    /// A forward was unlinked and its catalog unmounted.
    fn on_unlinked(&self, name: &str) {
        let _ = name;
    }

    /// A persisted forward could not be restored at startup.
    fn on_relink_failed(&self, name: &str, reason: &str) {
        let _ = (name, reason);
    }

    /// The backing store rejected a write; in-memory state is already
    /// updated when this fires.
    fn on_store_failure(&self, reason: &str) {
        let _ = reason;
    }
}

/// Event sink that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopForwardEvents;

impl ForwardEvents for NoopForwardEvents {}
