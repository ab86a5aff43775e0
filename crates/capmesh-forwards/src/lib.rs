// crates/capmesh-forwards/src/lib.rs
// ============================================================================
// Module: capmesh-forwards
// Description: Federation of remote router catalogs.
// Purpose: Link remote routers, import their tool and resource catalogs
//          under tagged mounts, and unlink them cleanly.
// Dependencies: capmesh-core, capmesh-registry, async-trait, reqwest
// ============================================================================

//! ## Overview
//!
//! A forward is a named link to a remote router. Linking fetches the
//! remote catalog through a [`ForwardResolver`] and mounts each entry
//! locally through [`CatalogMounts`], tagged with the owning forward so
//! unlink can find exactly its entries. [`ForwardRegistry`] owns the
//! links, persists them, and restores them at startup without letting one
//! unreachable remote block the rest.

pub mod events;
pub mod memory;
pub mod mounts;
pub mod registry;
pub mod resolver;

pub use events::ForwardEvents;
pub use events::NoopForwardEvents;
pub use memory::MemoryForwardStore;
pub use mounts::CatalogMounts;
pub use mounts::MemoryCatalogMounts;
pub use registry::ForwardRegistry;
pub use resolver::ForwardResolver;
pub use resolver::HttpForwardResolver;
