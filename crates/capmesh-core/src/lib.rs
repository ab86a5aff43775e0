// crates/capmesh-core/src/lib.rs
// ============================================================================
// Module: Capmesh Core
// Description: Data model and error taxonomy for the Capmesh gateway.
// Purpose: Share identifiers, records, and wire envelopes across crates.
// Dependencies: serde, serde_json, thiserror, time
// ============================================================================

//! ## Overview
//! Capmesh routes AI-agent tool and resource invocations to downstream
//! capability processes. This crate defines the vocabulary every other crate
//! speaks: registry identifiers, service targets, health records, namespace
//! slots, catalog references, forward references, the `ApiResponse` wire
//! envelope, and the gateway error taxonomy.
//!
//! No I/O happens here. Registry, discovery, dispatch, and federation logic
//! live in their own crates and depend on this one.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod catalog;
pub mod errors;
pub mod health;
pub mod identifiers;
pub mod namespace;
pub mod response;
pub mod store;
pub mod target;

// ============================================================================
// SECTION: Re-exports
// ============================================================================

pub use catalog::ForwardReference;
pub use catalog::InputSchema;
pub use catalog::PropertySchema;
pub use catalog::RemoteToolReference;
pub use catalog::ResourceReference;
pub use catalog::ToolReference;
pub use errors::GatewayError;
pub use health::ActivityRecord;
pub use health::HEALTHY_REASON;
pub use health::HealthHistory;
pub use health::HealthRecord;
pub use identifiers::ServiceId;
pub use namespace::NamespaceSlot;
pub use namespace::PUBLIC_NAMESPACE;
pub use response::ApiResponse;
pub use store::ForwardStore;
pub use store::NamespaceStore;
pub use store::RegistryStore;
pub use store::StoreError;
pub use target::InstanceKey;
pub use target::ServiceRole;
pub use target::ServiceTarget;

#[cfg(test)]
mod tests;
