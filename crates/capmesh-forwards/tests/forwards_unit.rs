// crates/capmesh-forwards/tests/forwards_unit.rs
// ============================================================================
// Module: forwards_unit
// Description: Unit tests for forward linking, unmounting, and relinking.
// Purpose: Verify the link lifecycle with canned resolvers and in-memory
//          mounts and stores.
// Dependencies: capmesh-core, capmesh-forwards, capmesh-registry, tokio
// ============================================================================

//! ## Overview
//! Verifies the forward link lifecycle with canned resolvers and in-memory
//! mounts and stores.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only fixtures use unwraps for clarity."
)]

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use capmesh_core::ForwardReference;
use capmesh_core::ForwardStore;
use capmesh_core::GatewayError;
use capmesh_core::InputSchema;
use capmesh_core::RemoteToolReference;
use capmesh_core::ResourceReference;
use capmesh_forwards::CatalogMounts;
use capmesh_forwards::ForwardRegistry;
use capmesh_forwards::ForwardResolver;
use capmesh_forwards::MemoryCatalogMounts;
use capmesh_forwards::MemoryForwardStore;
use capmesh_forwards::NoopForwardEvents;
use capmesh_registry::MemoryNamespaceStore;
use capmesh_registry::NamespaceAllocator;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

/// Resolver double serving canned catalogs per forward name.
#[derive(Default)]
struct CannedResolver {
    tools: BTreeMap<String, Vec<RemoteToolReference>>,
    resources: BTreeMap<String, Vec<ResourceReference>>,
    unreachable: BTreeSet<String>,
}

impl CannedResolver {
    fn with_tools(mut self, forward_name: &str, names: &[&str]) -> Self {
        let tools = names
            .iter()
            .map(|name| RemoteToolReference {
                name: (*name).to_string(),
                description: String::new(),
                input_schema: InputSchema::default(),
            })
            .collect();
        self.tools.insert(forward_name.to_string(), tools);
        self
    }

    fn with_resource(mut self, forward_name: &str, resource_name: &str) -> Self {
        let reference = ResourceReference {
            name: resource_name.to_string(),
            location: format!("remote:{resource_name}"),
            reference_type: "mcp-remote-resource".to_string(),
            mime_type: String::new(),
            description: String::new(),
            configurations: BTreeMap::new(),
            forward: None,
        };
        self.resources
            .entry(forward_name.to_string())
            .or_default()
            .push(reference);
        self
    }

    fn unreachable(mut self, forward_name: &str) -> Self {
        self.unreachable.insert(forward_name.to_string());
        self
    }

    fn check(&self, forward: &ForwardReference) -> Result<(), GatewayError> {
        if self.unreachable.contains(&forward.name) {
            return Err(GatewayError::Transport("connection refused".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ForwardResolver for CannedResolver {
    async fn list_tools(
        &self,
        forward: &ForwardReference,
    ) -> Result<Vec<RemoteToolReference>, GatewayError> {
        self.check(forward)?;
        Ok(self.tools.get(&forward.name).cloned().unwrap_or_default())
    }

    async fn list_resources(
        &self,
        forward: &ForwardReference,
    ) -> Result<Vec<ResourceReference>, GatewayError> {
        self.check(forward)?;
        Ok(self
            .resources
            .get(&forward.name)
            .cloned()
            .unwrap_or_default())
    }
}

struct Fixture {
    registry: ForwardRegistry,
    mounts: Arc<MemoryCatalogMounts>,
    store: Arc<MemoryForwardStore>,
    namespaces: Arc<NamespaceAllocator>,
}

fn fixture(resolver: CannedResolver) -> Fixture {
    let store = Arc::new(MemoryForwardStore::new());
    let mounts = Arc::new(MemoryCatalogMounts::new());
    let namespaces = Arc::new(NamespaceAllocator::new(Arc::new(
        MemoryNamespaceStore::new(),
    )));
    namespaces.preload().unwrap();
    let registry = ForwardRegistry::new(
        store.clone(),
        Arc::new(resolver),
        mounts.clone(),
        namespaces.clone(),
        Arc::new(NoopForwardEvents),
    );
    Fixture {
        registry,
        mounts,
        store,
        namespaces,
    }
}

// ============================================================================
// SECTION: Linking
// ============================================================================

#[tokio::test]
async fn link_mounts_remote_entries_tagged_with_the_forward() {
    let resolver = CannedResolver::default()
        .with_tools("edge-router", &["fetch-weather", "send-mail"])
        .with_resource("edge-router", "release-notes");
    let fx = fixture(resolver);

    fx.registry
        .link(ForwardReference::new("edge-router", "http://edge:8080"))
        .await
        .unwrap();

    let tools = fx.mounts.tools();
    assert_eq!(tools.len(), 2);
    assert!(
        tools
            .iter()
            .all(|tool| tool.forward.as_deref() == Some("edge-router"))
    );
    assert!(
        tools
            .iter()
            .all(|tool| tool.reference_type == "mcp-remote-tool")
    );
    let resources = fx.mounts.resources();
    assert_eq!(resources.len(), 1);
    assert_eq!(resources[0].forward.as_deref(), Some("edge-router"));
    assert!(fx.registry.is_linked("edge-router"));
}

#[tokio::test]
async fn duplicate_link_is_a_conflict() {
    let resolver = CannedResolver::default().with_tools("edge-router", &["fetch-weather"]);
    let fx = fixture(resolver);
    let forward = ForwardReference::new("edge-router", "http://edge:8080");

    fx.registry.link(forward.clone()).await.unwrap();
    let err = fx.registry.link(forward).await.unwrap_err();

    assert!(matches!(err, GatewayError::Conflict(_)));
    assert_eq!(fx.mounts.tools().len(), 1);
}

#[tokio::test]
async fn unreachable_remote_fails_the_link_without_mounting() {
    let resolver = CannedResolver::default().unreachable("edge-router");
    let fx = fixture(resolver);

    let err = fx
        .registry
        .link(ForwardReference::new("edge-router", "http://edge:8080"))
        .await
        .unwrap_err();

    assert!(matches!(err, GatewayError::Transport(_)));
    assert!(fx.mounts.tools().is_empty());
    assert!(!fx.registry.is_linked("edge-router"));
}

#[tokio::test]
async fn named_link_binds_a_namespace_slot() {
    let resolver = CannedResolver::default().with_tools("edge-router", &["fetch-weather"]);
    let fx = fixture(resolver);
    let mut forward = ForwardReference::new("edge-router", "http://edge:8080");
    forward.namespace = Some("edge".to_string());

    fx.registry.link(forward).await.unwrap();

    assert!(
        fx.namespaces
            .list()
            .iter()
            .any(|slot| slot.assigned_name.as_deref() == Some("edge"))
    );
}

#[tokio::test]
async fn link_persists_the_reference() {
    let resolver = CannedResolver::default().with_tools("edge-router", &["fetch-weather"]);
    let fx = fixture(resolver);

    fx.registry
        .link(ForwardReference::new("edge-router", "http://edge:8080"))
        .await
        .unwrap();

    let persisted = fx.store.load_all().unwrap();
    assert_eq!(persisted.len(), 1);
    assert_eq!(persisted[0].name, "edge-router");
}

// ============================================================================
// SECTION: Unlinking
// ============================================================================

#[tokio::test]
async fn unlink_removes_only_the_owning_forwards_entries() {
    let resolver = CannedResolver::default()
        .with_tools("edge-router", &["fetch-weather"])
        .with_tools("lab-router", &["run-benchmark"]);
    let fx = fixture(resolver);
    fx.registry
        .link(ForwardReference::new("edge-router", "http://edge:8080"))
        .await
        .unwrap();
    fx.registry
        .link(ForwardReference::new("lab-router", "http://lab:8080"))
        .await
        .unwrap();

    let removed = fx.registry.unlink("edge-router").unwrap();

    assert_eq!(removed, 1);
    let tools = fx.mounts.tools();
    assert_eq!(tools.len(), 1);
    assert_eq!(tools[0].forward.as_deref(), Some("lab-router"));
    assert!(!fx.registry.is_linked("edge-router"));
    assert!(fx.registry.is_linked("lab-router"));
    assert_eq!(fx.store.load_all().unwrap().len(), 1);
}

#[tokio::test]
async fn unlink_of_unknown_forward_is_not_found() {
    let fx = fixture(CannedResolver::default());

    let err = fx.registry.unlink("edge-router").unwrap_err();

    assert!(matches!(err, GatewayError::NotFound(_)));
}

// ============================================================================
// SECTION: Startup Relinking
// ============================================================================

#[tokio::test]
async fn relink_restores_persisted_forwards_and_skips_unreachable_ones() {
    let resolver = CannedResolver::default()
        .with_tools("edge-router", &["fetch-weather"])
        .unreachable("lab-router");
    let fx = fixture(resolver);
    fx.store
        .save(&ForwardReference::new("edge-router", "http://edge:8080"))
        .unwrap();
    fx.store
        .save(&ForwardReference::new("lab-router", "http://lab:8080"))
        .unwrap();

    let restored = fx.registry.relink_all().await;

    assert_eq!(restored, 1);
    assert!(fx.registry.is_linked("edge-router"));
    assert!(!fx.registry.is_linked("lab-router"));
    assert_eq!(fx.mounts.tools().len(), 1);
}
