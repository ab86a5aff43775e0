// crates/capmesh-registry/src/lib.rs
// ============================================================================
// Module: Capmesh Registry
// Description: Authoritative view of registered capability instances.
// Purpose: Track targets, health history, and namespace allocation.
// Dependencies: capmesh-core, thiserror
// ============================================================================

//! ## Overview
//! This crate owns the control-plane state of a Capmesh router: the
//! [`ServiceRegistry`] of registered capability instances with per-id health
//! rings, the fixed-pool [`NamespaceAllocator`], and in-memory store backends
//! for both. The registry is built for concurrent mutation: registrations,
//! pings, and state updates on unrelated services never contend on one lock.
//!
//! Registries are explicitly constructed and passed by reference; there is no
//! ambient global instance.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod events;
pub mod memory;
pub mod namespace;
pub mod registry;

// ============================================================================
// SECTION: Re-exports
// ============================================================================

pub use events::NoopRegistryEvents;
pub use events::RegistryEvents;
pub use memory::MemoryNamespaceStore;
pub use memory::MemoryRegistryStore;
pub use namespace::NamespaceAllocator;
pub use namespace::NamespaceError;
pub use registry::RegistryConfig;
pub use registry::ServiceRegistry;
