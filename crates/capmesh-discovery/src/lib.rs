// crates/capmesh-discovery/src/lib.rs
// ============================================================================
// Module: capmesh-discovery
// Description: Capability-side registration client for the Capmesh gateway.
// Purpose: Keep downstream capability services registered, pinged, and
//          reporting health to the router discovery surface.
// Dependencies: capmesh-core, reqwest, serde, tokio, toml
// ============================================================================

//! ## Overview
//!
//! Everything a capability service needs to participate in the mesh lives
//! here: the REST [`DiscoveryClient`], the [`RegistrationManager`] state
//! machine that drives it, the on-disk [`InstanceDataFile`] that lets a
//! restarted process reclaim its issued id, and the
//! [`RegistrationScheduler`] that ticks the manager on an interval until
//! shutdown.

pub mod client;
pub mod config;
pub mod events;
pub mod instance;
pub mod manager;
pub mod scheduler;

pub use client::DiscoveryClient;
pub use client::DiscoveryError;
pub use config::CapabilityConfig;
pub use config::ConfigError;
pub use config::RegistrationConfig;
pub use events::DiscoveryEvents;
pub use events::NoopDiscoveryEvents;
pub use instance::InstanceDataFile;
pub use manager::RegistrationManager;
pub use scheduler::RegistrationScheduler;
