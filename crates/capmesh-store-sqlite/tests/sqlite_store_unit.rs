// crates/capmesh-store-sqlite/tests/sqlite_store_unit.rs
// ============================================================================
// Module: SQLite Store Tests
// Description: Validate durable persistence of registry and namespace state.
// Purpose: Ensure records survive reopen and bad payloads fail closed.
// Dependencies: capmesh-core, capmesh-store-sqlite, tempfile
// ============================================================================

//! ## Overview
//! Exercises the SQLite store's save/remove/load cycle for targets, slots,
//! and forward references, including reopen-from-disk behavior.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only fixtures use unwraps for clarity."
)]

use capmesh_core::ForwardReference;
use capmesh_core::ForwardStore;
use capmesh_core::NamespaceSlot;
use capmesh_core::NamespaceStore;
use capmesh_core::RegistryStore;
use capmesh_core::ServiceId;
use capmesh_core::ServiceRole;
use capmesh_core::ServiceTarget;
use capmesh_store_sqlite::SqliteStore;
use tempfile::TempDir;

fn registered_target(name: &str, port: u16) -> ServiceTarget {
    let mut target = ServiceTarget::new(name, "localhost", port, ServiceRole::ToolInvoker)
        .with_configuration("apiKey", "default");
    target.id = Some(ServiceId::new(format!("svc-{name}-{port}")));
    target
}

#[test]
fn targets_survive_reopen() {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("capmesh.db");

    let store = SqliteStore::open(&path).expect("open");
    RegistryStore::save(&store, &registered_target("http", 9001)).expect("save");
    RegistryStore::save(&store, &registered_target("search", 9002)).expect("save");
    drop(store);

    let reopened = SqliteStore::open(&path).expect("reopen");
    let targets = RegistryStore::load_all(&reopened).expect("load");
    assert_eq!(targets.len(), 2);
    assert!(targets.iter().any(|t| t.service_name == "http"));
}

#[test]
fn save_overwrites_existing_target() {
    let store = SqliteStore::open_in_memory().expect("open");
    let mut target = registered_target("http", 9001);
    RegistryStore::save(&store, &target).expect("save");
    target.configurations.insert("apiKey".to_string(), "rotated".to_string());
    RegistryStore::save(&store, &target).expect("overwrite");
    let targets = RegistryStore::load_all(&store).expect("load");
    assert_eq!(targets.len(), 1);
    assert_eq!(
        targets[0].configurations.get("apiKey").map(String::as_str),
        Some("rotated")
    );
}

#[test]
fn remove_unknown_target_is_a_noop() {
    let store = SqliteStore::open_in_memory().expect("open");
    RegistryStore::remove(&store, &ServiceId::new("svc-missing")).expect("noop remove");
    assert!(RegistryStore::load_all(&store).expect("load").is_empty());
}

#[test]
fn target_without_id_is_rejected() {
    let store = SqliteStore::open_in_memory().expect("open");
    let target = ServiceTarget::new("http", "localhost", 9001, ServiceRole::ToolInvoker);
    assert!(RegistryStore::save(&store, &target).is_err());
}

#[test]
fn namespace_slots_round_trip() {
    let store = SqliteStore::open_in_memory().expect("open");
    NamespaceStore::save(&store, &NamespaceSlot::public()).expect("save public");
    let mut slot = NamespaceSlot::pool_slot(0);
    NamespaceStore::save(&store, &slot).expect("save free");
    slot.assigned_name = Some("svcA".to_string());
    NamespaceStore::save(&store, &slot).expect("save bound");

    let slots = NamespaceStore::load_all(&store).expect("load");
    assert_eq!(slots.len(), 2);
    let ns0 = slots.iter().find(|s| s.path == "ns-0").expect("ns-0 present");
    assert_eq!(ns0.assigned_name.as_deref(), Some("svcA"));
}

#[test]
fn forward_references_round_trip() {
    let store = SqliteStore::open_in_memory().expect("open");
    ForwardStore::save(&store, &ForwardReference::new("remote", "http://remote:8080"))
        .expect("save");
    let forwards = ForwardStore::load_all(&store).expect("load");
    assert_eq!(forwards.len(), 1);
    assert_eq!(forwards[0].address, "http://remote:8080");

    ForwardStore::remove(&store, "remote").expect("remove");
    assert!(ForwardStore::load_all(&store).expect("load").is_empty());
}
