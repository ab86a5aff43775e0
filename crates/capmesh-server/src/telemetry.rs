// crates/capmesh-server/src/telemetry.rs
// ============================================================================
// Module: telemetry
// Description: Metrics seam for the router HTTP surface.
// Purpose: Count discovery and dispatch outcomes without binding the
//          server to a metrics backend.
// Dependencies: capmesh-core, capmesh-registry
// ============================================================================

//! ## Overview
//!
//! The server counts what happened, not how; label enums carry stable
//! wire names so any backend can export them unchanged. The default sink
//! discards everything. [`RegistryEventBridge`] adapts registry lifecycle
//! events onto the same seam so one implementation observes the whole
//! router.

use std::sync::Arc;

use capmesh_core::ServiceId;
use capmesh_core::StoreError;
use capmesh_registry::RegistryEvents;

// ==== SECTION: Labels ====

/// Discovery operation label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoveryOp {
    /// A registration or refresh.
    Register,
    /// A deregistration.
    Deregister,
    /// A liveness ping.
    Ping,
    /// A health-state update.
    Update,
}

impl DiscoveryOp {
    /// Stable label for export.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Register => "register",
            Self::Deregister => "deregister",
            Self::Ping => "ping",
            Self::Update => "update",
        }
    }
}

/// Dispatch operation label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOp {
    /// A tool invocation.
    InvokeTool,
    /// A resource acquisition.
    AcquireResource,
}

impl DispatchOp {
    /// Stable label for export.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvokeTool => "invoke-tool",
            Self::AcquireResource => "acquire-resource",
        }
    }
}

/// Outcome label shared by discovery and dispatch counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallOutcome {
    /// The operation completed.
    Accepted,
    /// The operation failed with a typed domain error.
    Rejected,
    /// The operation addressed an id the registry does not know.
    UnknownId,
}

impl CallOutcome {
    /// Stable label for export.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
            Self::UnknownId => "unknown-id",
        }
    }
}

// ==== SECTION: Sink ====

/// Counter sink for router operations.
pub trait RouterMetrics: Send + Sync {
    /// Counts one discovery operation.
    fn incr_discovery(&self, op: DiscoveryOp, outcome: CallOutcome) {
        let _ = (op, outcome);
    }

    /// Counts one dispatched invocation.
    fn incr_dispatch(&self, op: DispatchOp, outcome: CallOutcome) {
        let _ = (op, outcome);
    }
}

/// Metrics sink that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopRouterMetrics;

impl RouterMetrics for NoopRouterMetrics {}

// ==== SECTION: Registry bridge ====

/// Adapts registry lifecycle events onto the metrics seam.
///
/// # Invariants
/// - Every discovery counter flows through this bridge; HTTP handlers do
///   not count discovery operations themselves.
pub struct RegistryEventBridge {
    /// Shared counter sink.
    metrics: Arc<dyn RouterMetrics>,
}

impl RegistryEventBridge {
    /// Builds a bridge feeding `metrics`.
    #[must_use]
    pub fn new(metrics: Arc<dyn RouterMetrics>) -> Self {
        Self { metrics }
    }
}

impl RegistryEvents for RegistryEventBridge {
    fn on_registered(&self, _id: &ServiceId, _service_name: &str) {
        self.metrics
            .incr_discovery(DiscoveryOp::Register, CallOutcome::Accepted);
    }

    fn on_deregistered(&self, _id: &ServiceId) {
        self.metrics
            .incr_discovery(DiscoveryOp::Deregister, CallOutcome::Accepted);
    }

    fn on_ping(&self, _id: &ServiceId) {
        self.metrics
            .incr_discovery(DiscoveryOp::Ping, CallOutcome::Accepted);
    }

    fn on_state_recorded(&self, _id: &ServiceId) {
        self.metrics
            .incr_discovery(DiscoveryOp::Update, CallOutcome::Accepted);
    }

    fn on_unknown_id(&self, _id: &ServiceId, operation: &'static str) {
        let op = if operation == "ping" {
            DiscoveryOp::Ping
        } else {
            DiscoveryOp::Update
        };
        self.metrics.incr_discovery(op, CallOutcome::UnknownId);
    }

    fn on_store_failure(&self, _error: &StoreError) {}
}
