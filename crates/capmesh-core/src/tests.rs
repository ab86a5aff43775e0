// crates/capmesh-core/src/tests.rs
// ============================================================================
// Module: Core Unit Tests
// Description: Validate data model invariants for the Capmesh core types.
// Purpose: Pin wire forms, ring-buffer bounds, and record constructors.
// Dependencies: serde_json, proptest
// ============================================================================

//! ## Overview
//! Exercises the health ring eviction rules, stable wire labels, and the
//! envelope/record constructors the rest of the workspace relies on.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only fixtures use unwraps for clarity."
)]

use proptest::prelude::proptest;

use crate::ApiResponse;
use crate::HEALTHY_REASON;
use crate::HealthHistory;
use crate::HealthRecord;
use crate::NamespaceSlot;
use crate::ServiceId;
use crate::ServiceRole;
use crate::ServiceTarget;

// ============================================================================
// SECTION: Health History
// ============================================================================

#[test]
fn history_retains_most_recent_at_capacity() {
    let mut history = HealthHistory::with_capacity(10);
    for n in 1..=12 {
        history.push(HealthRecord::unhealthy(format!("failure {n}")));
    }
    assert_eq!(history.len(), 10);
    let recent = history.recent(10);
    assert_eq!(recent[0].reason, "failure 12");
    assert_eq!(recent[9].reason, "failure 3");
    assert!(!recent.iter().any(|r| r.reason == "failure 1"));
    assert!(!recent.iter().any(|r| r.reason == "failure 2"));
}

#[test]
fn recent_is_bounded_by_limit() {
    let mut history = HealthHistory::with_capacity(10);
    for _ in 0..5 {
        history.push(HealthRecord::healthy());
    }
    assert_eq!(history.recent(3).len(), 3);
    assert_eq!(history.recent(50).len(), 5);
}

#[test]
fn zero_capacity_is_clamped() {
    let mut history = HealthHistory::with_capacity(0);
    history.push(HealthRecord::healthy());
    history.push(HealthRecord::unhealthy("boom"));
    assert_eq!(history.len(), 1);
    assert_eq!(history.recent(1)[0].reason, "boom");
}

proptest! {
    #[test]
    fn history_never_exceeds_capacity(capacity in 1_usize..64, pushes in 0_usize..256) {
        let mut history = HealthHistory::with_capacity(capacity);
        for _ in 0..pushes {
            history.push(HealthRecord::healthy());
        }
        assert_eq!(history.len(), pushes.min(capacity));
    }
}

// ============================================================================
// SECTION: Records and Labels
// ============================================================================

#[test]
fn healthy_record_uses_sentinel_reason() {
    let record = HealthRecord::healthy();
    assert!(record.healthy);
    assert_eq!(record.reason, HEALTHY_REASON);
}

#[test]
fn role_wire_labels_are_stable() {
    assert_eq!(
        serde_json::to_string(&ServiceRole::ToolInvoker).unwrap(),
        "\"tool-invoker\""
    );
    assert_eq!(
        serde_json::to_string(&ServiceRole::ResourceProvider).unwrap(),
        "\"resource-provider\""
    );
}

#[test]
fn target_address_renders_host_port() {
    let target = ServiceTarget::new("http", "localhost", 9001, ServiceRole::ToolInvoker);
    assert_eq!(target.address(), "localhost:9001");
    assert!(target.id.is_none());
}

#[test]
fn same_instance_ignores_configurations() {
    let a = ServiceTarget::new("http", "localhost", 9001, ServiceRole::ToolInvoker)
        .with_configuration("apiKey", "default");
    let b = ServiceTarget::new("http", "localhost", 9001, ServiceRole::ToolInvoker);
    assert!(a.same_instance(&b));
    assert_eq!(a.instance_key(), b.instance_key());
    let c = ServiceTarget::new("http", "localhost", 9002, ServiceRole::ToolInvoker);
    assert!(!a.same_instance(&c));
    assert_ne!(a.instance_key(), c.instance_key());
}

// ============================================================================
// SECTION: Envelopes and Slots
// ============================================================================

#[test]
fn api_response_round_trips() {
    let ok = ApiResponse::ok(ServiceId::new("svc-1"));
    let json = serde_json::to_string(&ok).unwrap();
    let back: ApiResponse<ServiceId> = serde_json::from_str(&json).unwrap();
    assert_eq!(back.data, Some(ServiceId::new("svc-1")));
    assert!(back.error.is_none());

    let err: ApiResponse<ServiceId> = ApiResponse::failure("nope");
    assert!(err.data.is_none());
    assert_eq!(err.error.as_deref(), Some("nope"));
}

#[test]
fn public_slot_is_pre_bound() {
    let public = NamespaceSlot::public();
    assert_eq!(public.path, "public");
    assert_eq!(public.assigned_name.as_deref(), Some("public"));
    assert!(!public.is_free());
    assert!(NamespaceSlot::pool_slot(3).is_free());
    assert_eq!(NamespaceSlot::pool_slot(3).path, "ns-3");
}
