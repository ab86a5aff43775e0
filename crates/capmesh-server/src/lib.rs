// crates/capmesh-server/src/lib.rs
// ============================================================================
// Module: capmesh-server
// Description: HTTP control plane for the Capmesh router.
// Purpose: Expose the discovery, management, catalog, and invocation
//          surfaces over one axum router, wired from a TOML config.
// Dependencies: capmesh crates, axum, tokio, toml
// ============================================================================

//! ## Overview
//!
//! The server crate assembles the routing core into a running process:
//! [`RouterConfig`] selects the backing store and cadences,
//! [`bootstrap`](crate::bootstrap) opens the store and restores persisted
//! state, and [`http`](crate::http) mounts the REST surface capability
//! services and operators talk to. Observability goes through the
//! [`RouterMetrics`] seam; the default sink discards everything.

pub mod bootstrap;
pub mod config;
pub mod http;
pub mod state;
pub mod telemetry;

pub use bootstrap::ServerError;
pub use bootstrap::build_state;
pub use bootstrap::serve;
pub use bootstrap::serve_until;
pub use config::RouterConfig;
pub use config::StoreConfig;
pub use http::router;
pub use state::AppState;
pub use telemetry::CallOutcome;
pub use telemetry::DiscoveryOp;
pub use telemetry::DispatchOp;
pub use telemetry::NoopRouterMetrics;
pub use telemetry::RegistryEventBridge;
pub use telemetry::RouterMetrics;
