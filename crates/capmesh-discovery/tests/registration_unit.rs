// crates/capmesh-discovery/tests/registration_unit.rs
// ============================================================================
// Module: registration_unit
// Description: Unit tests for the capability registration lifecycle.
// Purpose: Verify config validation, instance-id caching, retry budgeting,
//          and scheduler shutdown without a live router.
// Dependencies: capmesh-core, capmesh-discovery, tempfile, tokio
// ============================================================================

//! ## Overview
//! Verifies config validation, instance-id caching, retry budgeting, and
//! scheduler shutdown without a live router.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only fixtures use unwraps for clarity."
)]

use std::sync::Arc;
use std::sync::atomic::AtomicU32;
use std::sync::atomic::Ordering;
use std::time::Duration;

use capmesh_core::ServiceId;
use capmesh_core::ServiceRole;
use capmesh_core::ServiceTarget;
use capmesh_discovery::CapabilityConfig;
use capmesh_discovery::ConfigError;
use capmesh_discovery::DiscoveryClient;
use capmesh_discovery::DiscoveryEvents;
use capmesh_discovery::InstanceDataFile;
use capmesh_discovery::RegistrationManager;
use capmesh_discovery::RegistrationScheduler;
use tempfile::TempDir;

/// Event sink counting lifecycle transitions.
#[derive(Default)]
struct Recorder {
    failed_attempts: AtomicU32,
    dropped_reports: AtomicU32,
    registrations: AtomicU32,
}

impl DiscoveryEvents for Recorder {
    fn on_registered(&self, _target: &ServiceTarget) {
        self.registrations.fetch_add(1, Ordering::SeqCst);
    }

    fn on_registration_failed(&self, _reason: &str, _retries_left: u32) {
        self.failed_attempts.fetch_add(1, Ordering::SeqCst);
    }

    fn on_state_report_dropped(&self, _reason: &str) {
        self.dropped_reports.fetch_add(1, Ordering::SeqCst);
    }
}

fn sample_toml(data_dir: &str) -> String {
    format!(
        r#"
name = "camel-route"
role = "tool-invoker"
host = "10.0.0.7"
port = 9190
data_dir = "{data_dir}"

[registration]
router_url = "http://127.0.0.1:1"
retries = 3
retry_wait_secs = 0
"#
    )
}

fn unreachable_config(data_dir: &TempDir) -> CapabilityConfig {
    CapabilityConfig::from_toml_str(&sample_toml(&data_dir.path().display().to_string())).unwrap()
}

fn manager_with_recorder(
    config: &CapabilityConfig,
) -> (Arc<RegistrationManager>, Arc<Recorder>) {
    let client = DiscoveryClient::new(
        &config.registration.router_url,
        Duration::from_millis(500),
    )
    .unwrap();
    let recorder = Arc::new(Recorder::default());
    let manager = Arc::new(RegistrationManager::new(config, client, recorder.clone()));
    (manager, recorder)
}

#[test]
fn config_parses_with_cadence_defaults() {
    let config = CapabilityConfig::from_toml_str(&sample_toml("/tmp/capmesh")).unwrap();
    assert_eq!(config.name, "camel-route");
    assert_eq!(config.role, ServiceRole::ToolInvoker);
    assert!(config.registration.ping_enabled);
    assert_eq!(config.registration.interval_secs, 5);
    assert_eq!(config.registration.retry_wait_secs, 0);
}

#[test]
fn config_rejects_zero_port() {
    let raw = sample_toml("/tmp/capmesh").replace("port = 9190", "port = 0");
    let err = CapabilityConfig::from_toml_str(&raw).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
}

#[test]
fn config_rejects_unparsable_router_url() {
    let raw = sample_toml("/tmp/capmesh")
        .replace("router_url = \"http://127.0.0.1:1\"", "router_url = \"not a url\"");
    let err = CapabilityConfig::from_toml_str(&raw).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
}

#[test]
fn announce_target_carries_configurations() {
    let mut config = CapabilityConfig::from_toml_str(&sample_toml("/tmp/capmesh")).unwrap();
    config
        .configurations
        .insert("timeout".to_string(), "request timeout in seconds".to_string());
    let target = config.announce_target();
    assert_eq!(target.address(), "10.0.0.7:9190");
    assert_eq!(
        target.configurations.get("timeout").map(String::as_str),
        Some("request timeout in seconds")
    );
}

#[test]
fn instance_file_restores_issued_id() {
    let dir = TempDir::new().unwrap();
    let file = InstanceDataFile::new(dir.path(), "camel-route");
    assert!(file.cached_id().is_none());

    let id = ServiceId::new("svc-00000000000000aa");
    file.store(&id).unwrap();
    assert_eq!(file.cached_id(), Some(id));
}

#[test]
fn instance_file_ignores_cache_of_other_service() {
    let dir = TempDir::new().unwrap();
    let writer = InstanceDataFile::new(dir.path(), "camel-route");
    writer.store(&ServiceId::new("svc-00000000000000aa")).unwrap();

    // Same directory, different service name: the reader resolves to its
    // own cache path and finds nothing.
    let reader = InstanceDataFile::new(dir.path(), "file-provider");
    assert!(reader.cached_id().is_none());
}

#[test]
fn instance_file_treats_corrupt_cache_as_absent() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("camel-route.instance.json");
    std::fs::write(&path, "not json at all").unwrap();

    let file = InstanceDataFile::new(dir.path(), "camel-route");
    assert!(file.cached_id().is_none());
}

#[tokio::test]
async fn exhausted_retry_budget_leaves_service_unregistered() {
    let dir = TempDir::new().unwrap();
    let config = unreachable_config(&dir);
    let (manager, recorder) = manager_with_recorder(&config);

    manager.register().await;

    assert!(!manager.is_registered());
    assert_eq!(recorder.failed_attempts.load(Ordering::SeqCst), 3);
    assert_eq!(recorder.registrations.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn spent_budget_still_attempts_once_per_tick() {
    let dir = TempDir::new().unwrap();
    let config = unreachable_config(&dir);
    let (manager, recorder) = manager_with_recorder(&config);

    manager.register().await;
    assert_eq!(recorder.failed_attempts.load(Ordering::SeqCst), 3);

    manager.register().await;
    assert_eq!(recorder.failed_attempts.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn state_report_without_issued_id_is_dropped() {
    let dir = TempDir::new().unwrap();
    let config = unreachable_config(&dir);
    let (manager, recorder) = manager_with_recorder(&config);

    manager.last_as_fail("exchange failed").await;

    assert_eq!(recorder.dropped_reports.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn scheduler_stop_completes_against_unreachable_router() {
    let dir = TempDir::new().unwrap();
    let config = unreachable_config(&dir);
    let (manager, _recorder) = manager_with_recorder(&config);

    let scheduler = RegistrationScheduler::spawn(manager.clone(), Duration::from_secs(60));
    scheduler.stop().await;

    assert!(!manager.is_registered());
}
