// crates/capmesh-core/src/response.rs
// ============================================================================
// Module: Wire Envelopes
// Description: JSON envelope returned by discovery and management endpoints.
// Purpose: Keep success data and error text in one stable response shape.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Discovery and management endpoints wrap their payloads in [`ApiResponse`]:
//! exactly one of `data` or `error` is populated. Callers classify non-2xx
//! statuses as domain failures and read `error` for the cause.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Api Response
// ============================================================================

/// Response envelope for gateway HTTP endpoints.
///
/// # Invariants
/// - Exactly one of `data` and `error` is `Some`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct ApiResponse<T> {
    /// Payload on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Error text on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Wraps a successful payload.
    #[must_use]
    pub const fn ok(data: T) -> Self {
        Self {
            data: Some(data),
            error: None,
        }
    }

    /// Wraps an error message.
    #[must_use]
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            data: None,
            error: Some(error.into()),
        }
    }
}
