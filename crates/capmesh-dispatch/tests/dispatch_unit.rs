// crates/capmesh-dispatch/tests/dispatch_unit.rs
// ============================================================================
// Module: dispatch_unit
// Description: Unit tests for invocation routing and configuration merging.
// Purpose: Verify reference resolution, merge precedence, and the routing
//          miss path using a recording transport double.
// Dependencies: capmesh-core, capmesh-dispatch, capmesh-registry, tokio
// ============================================================================

//! ## Overview
//! Verifies reference resolution, merge precedence, and the routing miss
//! path using a recording transport double.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only assertions are permitted."
)]

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use capmesh_core::GatewayError;
use capmesh_core::InputSchema;
use capmesh_core::ResourceReference;
use capmesh_core::ServiceRole;
use capmesh_core::ServiceTarget;
use capmesh_core::ToolReference;
use capmesh_dispatch::CallReply;
use capmesh_dispatch::InvocationTransport;
use capmesh_dispatch::ResourceAcquirerProxy;
use capmesh_dispatch::ResourceRequest;
use capmesh_dispatch::ToolInvokeRequest;
use capmesh_dispatch::ToolInvokerProxy;
use capmesh_registry::MemoryRegistryStore;
use capmesh_registry::NoopRegistryEvents;
use capmesh_registry::RegistryConfig;
use capmesh_registry::ServiceRegistry;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

/// Captured wire activity from one proxy call.
#[derive(Debug, Clone)]
enum Seen {
    Tool {
        address: String,
        request: ToolInvokeRequest,
    },
    Resource {
        address: String,
        request: ResourceRequest,
    },
}

/// Transport double that records calls and returns a canned reply.
struct RecordingTransport {
    seen: Mutex<Vec<Seen>>,
    reply: CallReply,
}

impl RecordingTransport {
    fn replying(reply: CallReply) -> Arc<Self> {
        Arc::new(Self {
            seen: Mutex::new(Vec::new()),
            reply,
        })
    }

    fn ok() -> Arc<Self> {
        Self::replying(CallReply {
            is_error: false,
            content: vec!["done".to_string()],
        })
    }

    fn calls(&self) -> Vec<Seen> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl InvocationTransport for RecordingTransport {
    async fn invoke_tool(
        &self,
        address: &str,
        request: &ToolInvokeRequest,
    ) -> Result<CallReply, GatewayError> {
        self.seen.lock().unwrap().push(Seen::Tool {
            address: address.to_string(),
            request: request.clone(),
        });
        Ok(self.reply.clone())
    }

    async fn acquire_resource(
        &self,
        address: &str,
        request: &ResourceRequest,
    ) -> Result<CallReply, GatewayError> {
        self.seen.lock().unwrap().push(Seen::Resource {
            address: address.to_string(),
            request: request.clone(),
        });
        Ok(self.reply.clone())
    }
}

fn registry() -> Arc<ServiceRegistry> {
    Arc::new(
        ServiceRegistry::open(
            RegistryConfig::default(),
            Arc::new(MemoryRegistryStore::new()),
            Arc::new(NoopRegistryEvents),
        )
        .expect("memory store opens"),
    )
}

fn tool_reference(reference_type: &str) -> ToolReference {
    ToolReference {
        name: "fetch-weather".to_string(),
        description: String::new(),
        uri: "https://api.example.test/weather".to_string(),
        reference_type: reference_type.to_string(),
        input_schema: InputSchema::default(),
        configurations: BTreeMap::new(),
        forward: None,
    }
}

fn resource_reference(reference_type: &str) -> ResourceReference {
    ResourceReference {
        name: "release-notes".to_string(),
        location: "/srv/docs/notes.md".to_string(),
        reference_type: reference_type.to_string(),
        mime_type: "text/markdown".to_string(),
        description: String::new(),
        configurations: BTreeMap::new(),
        forward: None,
    }
}

// ============================================================================
// SECTION: Resolution
// ============================================================================

#[tokio::test]
async fn tool_invocation_reaches_the_registered_invoker() {
    let registry = registry();
    registry.register(ServiceTarget::new(
        "http",
        "10.0.0.5",
        9190,
        ServiceRole::ToolInvoker,
    ));
    let transport = RecordingTransport::ok();
    let proxy = ToolInvokerProxy::new(registry, transport.clone());

    let reply = proxy
        .invoke(&tool_reference("http"), None, BTreeMap::new())
        .await
        .unwrap();

    assert!(!reply.is_error);
    let calls = transport.calls();
    assert_eq!(calls.len(), 1);
    match &calls[0] {
        Seen::Tool { address, request } => {
            assert_eq!(address, "10.0.0.5:9190");
            assert_eq!(request.uri, "https://api.example.test/weather");
        }
        Seen::Resource { .. } => panic!("tool call recorded as resource"),
    }
}

#[tokio::test]
async fn resource_acquisition_reaches_the_registered_provider() {
    let registry = registry();
    registry.register(ServiceTarget::new(
        "file",
        "10.0.0.6",
        9290,
        ServiceRole::ResourceProvider,
    ));
    let transport = RecordingTransport::ok();
    let proxy = ResourceAcquirerProxy::new(registry, transport.clone());

    proxy
        .acquire(&resource_reference("file"))
        .await
        .unwrap();

    let calls = transport.calls();
    assert_eq!(calls.len(), 1);
    match &calls[0] {
        Seen::Resource { address, request } => {
            assert_eq!(address, "10.0.0.6:9290");
            assert_eq!(request.location, "/srv/docs/notes.md");
        }
        Seen::Tool { .. } => panic!("resource call recorded as tool"),
    }
}

#[tokio::test]
async fn routing_miss_is_not_found_and_never_touches_the_wire() {
    let registry = registry();
    let transport = RecordingTransport::ok();
    let proxy = ToolInvokerProxy::new(registry, transport.clone());

    let err = proxy
        .invoke(&tool_reference("http"), None, BTreeMap::new())
        .await
        .unwrap_err();

    assert!(matches!(err, GatewayError::NotFound(_)));
    assert!(transport.calls().is_empty());
}

#[tokio::test]
async fn roles_do_not_cross_resolve() {
    let registry = registry();
    // A provider named "http" must not satisfy a tool invocation.
    registry.register(ServiceTarget::new(
        "http",
        "10.0.0.5",
        9190,
        ServiceRole::ResourceProvider,
    ));
    let transport = RecordingTransport::ok();
    let proxy = ToolInvokerProxy::new(registry, transport.clone());

    let err = proxy
        .invoke(&tool_reference("http"), None, BTreeMap::new())
        .await
        .unwrap_err();

    assert!(matches!(err, GatewayError::NotFound(_)));
}

// ============================================================================
// SECTION: Configuration Merging
// ============================================================================

#[tokio::test]
async fn reference_overrides_win_over_advertised_options() {
    let registry = registry();
    registry.register(
        ServiceTarget::new("http", "10.0.0.5", 9190, ServiceRole::ToolInvoker)
            .with_configuration("apiKey", "default-key")
            .with_configuration("timeout", "30"),
    );
    let transport = RecordingTransport::ok();
    let proxy = ToolInvokerProxy::new(registry, transport.clone());

    let mut reference = tool_reference("http");
    reference
        .configurations
        .insert("apiKey".to_string(), "override-key".to_string());

    proxy.invoke(&reference, None, BTreeMap::new()).await.unwrap();

    let calls = transport.calls();
    match &calls[0] {
        Seen::Tool { request, .. } => {
            assert_eq!(
                request.configurations.get("apiKey").map(String::as_str),
                Some("override-key")
            );
            assert_eq!(
                request.configurations.get("timeout").map(String::as_str),
                Some("30")
            );
        }
        Seen::Resource { .. } => panic!("tool call recorded as resource"),
    }
}

// ============================================================================
// SECTION: Reply Handling
// ============================================================================

#[tokio::test]
async fn service_reported_failure_is_a_reply_not_an_error() {
    let registry = registry();
    registry.register(ServiceTarget::new(
        "http",
        "10.0.0.5",
        9190,
        ServiceRole::ToolInvoker,
    ));
    let transport = RecordingTransport::replying(CallReply {
        is_error: true,
        content: vec!["exchange failed".to_string()],
    });
    let proxy = ToolInvokerProxy::new(registry, transport);

    let reply = proxy
        .invoke(&tool_reference("http"), None, BTreeMap::new())
        .await
        .unwrap();

    assert!(reply.is_error);
    assert_eq!(reply.content, vec!["exchange failed".to_string()]);
}
