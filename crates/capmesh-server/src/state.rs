// crates/capmesh-server/src/state.rs
// ============================================================================
// Module: state
// Description: Shared application state for the HTTP surface.
// Purpose: Hand every handler the routing core behind cheap clones.
// Dependencies: capmesh crates
// ============================================================================

//! ## Overview
//! One [`AppState`] is built at startup and cloned into every handler.
//! All members are shared handles; cloning the state is pointer work.

use std::sync::Arc;

use capmesh_dispatch::ResourceAcquirerProxy;
use capmesh_dispatch::ToolInvokerProxy;
use capmesh_forwards::ForwardRegistry;
use capmesh_forwards::MemoryCatalogMounts;
use capmesh_registry::NamespaceAllocator;
use capmesh_registry::ServiceRegistry;

use crate::telemetry::RouterMetrics;

/// Shared handles behind the HTTP surface.
#[derive(Clone)]
pub struct AppState {
    /// Service registry and health tracker.
    pub registry: Arc<ServiceRegistry>,
    /// Namespace pool.
    pub namespaces: Arc<NamespaceAllocator>,
    /// Forward link registry.
    pub forwards: Arc<ForwardRegistry>,
    /// Mounted catalog entries.
    pub mounts: Arc<MemoryCatalogMounts>,
    /// Tool invocation proxy.
    pub tool_proxy: Arc<ToolInvokerProxy>,
    /// Resource acquisition proxy.
    pub resource_proxy: Arc<ResourceAcquirerProxy>,
    /// Counter sink.
    pub metrics: Arc<dyn RouterMetrics>,
}
