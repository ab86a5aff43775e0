// crates/capmesh-server/src/bootstrap.rs
// ============================================================================
// Module: bootstrap
// Description: Startup wiring for the router process.
// Purpose: Open the backing store, restore persisted state, and serve the
//          HTTP surface.
// Dependencies: capmesh crates, axum, tokio
// ============================================================================

//! ## Overview
//!
//! Startup is fail-fast: a store that cannot be opened or preloaded stops
//! the boot, because a router without its registry or namespace pool
//! cannot serve. Forward relinking is the one lenient step: an
//! unreachable remote is skipped so a fleet-wide restart does not
//! deadlock on ordering.

use std::future::Future;
use std::sync::Arc;

use capmesh_core::ForwardStore;
use capmesh_core::GatewayError;
use capmesh_core::NamespaceStore;
use capmesh_core::RegistryStore;
use capmesh_core::StoreError;
use capmesh_dispatch::HttpTransport;
use capmesh_dispatch::ResourceAcquirerProxy;
use capmesh_dispatch::ToolInvokerProxy;
use capmesh_forwards::ForwardRegistry;
use capmesh_forwards::HttpForwardResolver;
use capmesh_forwards::MemoryCatalogMounts;
use capmesh_forwards::MemoryForwardStore;
use capmesh_forwards::NoopForwardEvents;
use capmesh_registry::MemoryNamespaceStore;
use capmesh_registry::MemoryRegistryStore;
use capmesh_registry::NamespaceAllocator;
use capmesh_registry::NamespaceError;
use capmesh_registry::RegistryConfig;
use capmesh_registry::ServiceRegistry;
use capmesh_store_sqlite::SqliteStore;

use crate::config::RouterConfig;
use crate::config::RouterConfigError;
use crate::config::StoreConfig;
use crate::http::router;
use crate::state::AppState;
use crate::telemetry::RegistryEventBridge;
use crate::telemetry::RouterMetrics;

/// Startup and serve failures for the router process.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// The configuration did not parse or validate.
    #[error(transparent)]
    Config(#[from] RouterConfigError),
    /// The backing store could not be opened or read.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// The namespace pool could not be preloaded.
    #[error(transparent)]
    Namespace(#[from] NamespaceError),
    /// An outbound HTTP client could not be constructed.
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    /// The listener could not be bound or the server loop failed.
    #[error("io failure: {0}")]
    Io(#[from] std::io::Error),
}

/// The three store handles the core components persist through.
type Stores = (
    Arc<dyn RegistryStore>,
    Arc<dyn NamespaceStore>,
    Arc<dyn ForwardStore>,
);

/// Opens the configured backing store.
fn open_stores(config: &RouterConfig) -> Result<Stores, ServerError> {
    match &config.store {
        StoreConfig::Memory => Ok((
            Arc::new(MemoryRegistryStore::new()),
            Arc::new(MemoryNamespaceStore::new()),
            Arc::new(MemoryForwardStore::new()),
        )),
        StoreConfig::Sqlite { path } => {
            let store = Arc::new(SqliteStore::open(path)?);
            Ok((store.clone(), store.clone(), store))
        }
    }
}

/// Builds the application state, restoring persisted registrations,
/// namespace bindings, and forward links.
///
/// # Errors
///
/// Returns [`ServerError`] when the store cannot be opened or read, the
/// namespace pool cannot be preloaded, or an outbound HTTP client cannot
/// be constructed. Unreachable forward remotes are not errors.
pub async fn build_state(
    config: &RouterConfig,
    metrics: Arc<dyn RouterMetrics>,
) -> Result<AppState, ServerError> {
    let (registry_store, namespace_store, forward_store) = open_stores(config)?;

    let registry = Arc::new(ServiceRegistry::open(
        RegistryConfig {
            history_capacity: config.history_capacity,
        },
        registry_store,
        Arc::new(RegistryEventBridge::new(metrics.clone())),
    )?);

    let namespaces = Arc::new(NamespaceAllocator::with_pool_size(
        namespace_store,
        config.namespace_pool_size,
    ));
    namespaces.preload()?;

    let mounts = Arc::new(MemoryCatalogMounts::new());
    let forwards = Arc::new(ForwardRegistry::new(
        forward_store,
        Arc::new(HttpForwardResolver::new(config.resolve_timeout())?),
        mounts.clone(),
        namespaces.clone(),
        Arc::new(NoopForwardEvents),
    ));
    forwards.relink_all().await;

    let transport = Arc::new(HttpTransport::new(config.invoke_timeout())?);
    let tool_proxy = Arc::new(ToolInvokerProxy::new(registry.clone(), transport.clone()));
    let resource_proxy = Arc::new(ResourceAcquirerProxy::new(registry.clone(), transport));

    Ok(AppState {
        registry,
        namespaces,
        forwards,
        mounts,
        tool_proxy,
        resource_proxy,
        metrics,
    })
}

/// Binds the listener and serves the HTTP surface until `shutdown`
/// resolves, then drains in-flight connections before returning.
///
/// # Errors
///
/// Returns [`ServerError::Io`] when the listener cannot be bound or the
/// accept loop fails.
pub async fn serve_until<F>(
    config: &RouterConfig,
    state: AppState,
    shutdown: F,
) -> Result<(), ServerError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener =
        tokio::net::TcpListener::bind((config.host.as_str(), config.port)).await?;
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

/// Serves the HTTP surface until the process receives an interrupt.
///
/// # Errors
///
/// Returns [`ServerError::Io`] when the listener cannot be bound or the
/// accept loop fails.
pub async fn serve(config: &RouterConfig, state: AppState) -> Result<(), ServerError> {
    serve_until(config, state, interrupt()).await
}

/// Resolves when the process receives an interrupt request.
///
/// When the signal handler cannot be installed the future stays pending
/// and shutdown is left to the supervisor.
async fn interrupt() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}
