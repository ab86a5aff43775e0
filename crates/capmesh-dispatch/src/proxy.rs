// crates/capmesh-dispatch/src/proxy.rs
// ============================================================================
// Module: proxy
// Description: Reference-to-service resolution and invocation proxies.
// Purpose: Resolve a catalog reference's type to a registered service,
//          merge configuration, and hand the call to the transport.
// Dependencies: capmesh-core, capmesh-registry
// ============================================================================

//! ## Overview
//!
//! The proxies are the router side of an invocation. Each resolves the
//! reference type to a registered service of the matching role, builds the
//! wire request with merged configuration, and delegates to the
//! [`InvocationTransport`]. A routing miss is a typed [`GatewayError::NotFound`]
//! and never reaches the transport; transport failures propagate unchanged
//! and are never retried here, so callers can apply their own policy.
//!
//! Configuration merging starts from the options the service advertised at
//! registration and lets per-reference overrides win. The merge result is
//! what travels; neither the registry entry nor the catalog reference is
//! mutated.

use std::collections::BTreeMap;
use std::sync::Arc;

use capmesh_core::GatewayError;
use capmesh_core::ResourceReference;
use capmesh_core::ServiceRole;
use capmesh_core::ServiceTarget;
use capmesh_core::ToolReference;
use capmesh_registry::ServiceRegistry;
use serde_json::Value;

use crate::transport::CallReply;
use crate::transport::InvocationTransport;
use crate::transport::ResourceRequest;
use crate::transport::ToolInvokeRequest;

/// Merges advertised options with reference overrides, overrides winning.
fn merged_configuration(
    target: &ServiceTarget,
    overrides: &BTreeMap<String, String>,
) -> BTreeMap<String, String> {
    let mut merged = target.configurations.clone();
    for (option, value) in overrides {
        merged.insert(option.clone(), value.clone());
    }
    merged
}

// ==== SECTION: Tool invoker proxy ====

/// Routes tool invocations to registered tool-invoker services.
pub struct ToolInvokerProxy {
    /// Registry resolving reference types to services.
    registry: Arc<ServiceRegistry>,
    /// Wire transport for resolved calls.
    transport: Arc<dyn InvocationTransport>,
}

impl ToolInvokerProxy {
    /// Builds a proxy over the given registry and transport.
    #[must_use]
    pub fn new(registry: Arc<ServiceRegistry>, transport: Arc<dyn InvocationTransport>) -> Self {
        Self {
            registry,
            transport,
        }
    }

    /// Invokes `reference` with the caller's `arguments`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::NotFound`] when no tool invoker is
    /// registered for the reference type, and propagates transport and
    /// decode failures from the wire. A reply with `is_error` set is
    /// still `Ok`; the service ran and reported its own failure.
    pub async fn invoke(
        &self,
        reference: &ToolReference,
        body: Option<String>,
        arguments: BTreeMap<String, Value>,
    ) -> Result<CallReply, GatewayError> {
        let target = self
            .registry
            .service_by_name(&reference.reference_type, ServiceRole::ToolInvoker)
            .ok_or_else(|| GatewayError::no_service_for(&reference.reference_type))?;
        let request = ToolInvokeRequest {
            uri: reference.uri.clone(),
            body,
            configurations: merged_configuration(&target, &reference.configurations),
            arguments,
        };
        self.transport.invoke_tool(&target.address(), &request).await
    }
}

// ==== SECTION: Resource acquirer proxy ====

/// Routes resource acquisitions to registered resource-provider services.
pub struct ResourceAcquirerProxy {
    /// Registry resolving reference types to services.
    registry: Arc<ServiceRegistry>,
    /// Wire transport for resolved calls.
    transport: Arc<dyn InvocationTransport>,
}

impl ResourceAcquirerProxy {
    /// Builds a proxy over the given registry and transport.
    #[must_use]
    pub fn new(registry: Arc<ServiceRegistry>, transport: Arc<dyn InvocationTransport>) -> Self {
        Self {
            registry,
            transport,
        }
    }

    /// Acquires the resource described by `reference`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::NotFound`] when no resource provider is
    /// registered for the reference type, and propagates transport and
    /// decode failures from the wire.
    pub async fn acquire(&self, reference: &ResourceReference) -> Result<CallReply, GatewayError> {
        let target = self
            .registry
            .service_by_name(&reference.reference_type, ServiceRole::ResourceProvider)
            .ok_or_else(|| GatewayError::no_service_for(&reference.reference_type))?;
        let request = ResourceRequest {
            location: reference.location.clone(),
            reference_type: reference.reference_type.clone(),
            name: reference.name.clone(),
            configurations: merged_configuration(&target, &reference.configurations),
        };
        self.transport
            .acquire_resource(&target.address(), &request)
            .await
    }
}
