// crates/capmesh-core/src/errors.rs
// ============================================================================
// Module: Gateway Errors
// Description: Error taxonomy shared across Capmesh crates.
// Purpose: Keep domain failures typed and stable for programmatic handling.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! Every failure the routing core can surface falls into one of a small set
//! of classes: a routing miss, a transport failure against the registry or a
//! capability process, an unusable downstream payload, a configuration
//! conflict, or a persistence failure. `NotFound` and `InvalidResponse` are
//! always converted to typed errors returned to the caller; a raw panic
//! never crosses the dispatch boundary.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

// ============================================================================
// SECTION: Gateway Error
// ============================================================================

/// Domain failures surfaced by the routing core.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
/// - Transport failures are never reported as routing misses or vice versa.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Unknown service, type, or namespace.
    #[error("not found: {0}")]
    NotFound(String),
    /// Network failure, timeout, or unreachable peer.
    #[error("transport failure: {0}")]
    Transport(String),
    /// Downstream returned an unusable payload.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    /// Conflicting configuration, such as an exhausted namespace pool or a
    /// duplicate forward link.
    #[error("configuration conflict: {0}")]
    Conflict(String),
    /// Backing store failure.
    #[error("store failure: {0}")]
    Store(String),
}

impl GatewayError {
    /// Builds the routing-miss error for an unregistered reference type.
    #[must_use]
    pub fn no_service_for(reference_type: &str) -> Self {
        Self::NotFound(format!("no service registered for type {reference_type}"))
    }
}
