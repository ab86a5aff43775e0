// crates/capmesh-discovery/src/client.rs
// ============================================================================
// Module: client
// Description: REST client for the router discovery surface.
// Purpose: Issue register, deregister, ping, and state-update calls with
//          bounded deadlines and explicit failure classification.
// Dependencies: capmesh-core, reqwest, serde_json
// ============================================================================

//! ## Overview
//!
//! [`DiscoveryClient`] wraps a [`reqwest::Client`] pointed at one router
//! base URL. Every call carries the client-wide timeout, and non-2xx
//! replies surface as [`DiscoveryError::Rejected`] rather than transport
//! faults so callers can tell a refusing router from an unreachable one.

use std::time::Duration;

use capmesh_core::ApiResponse;
use capmesh_core::HealthRecord;
use capmesh_core::ServiceId;
use capmesh_core::ServiceTarget;

// ==== SECTION: Errors ====

/// Failure modes for discovery calls against the router.
#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    /// The router could not be reached or the call timed out.
    #[error("discovery transport failure: {0}")]
    Transport(String),
    /// The router answered with a non-success status.
    #[error("discovery request rejected ({status}): {message}")]
    Rejected {
        /// HTTP status code returned by the router.
        status: u16,
        /// Error message extracted from the response envelope, if any.
        message: String,
    },
    /// The router answered 2xx but the body did not decode.
    #[error("invalid discovery response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for DiscoveryError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

// ==== SECTION: Client ====

/// Default per-call deadline applied when the caller does not override it.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(5);

/// REST client for the router discovery endpoints.
#[derive(Debug, Clone)]
pub struct DiscoveryClient {
    /// Router base URL without a trailing slash.
    base_url: String,
    /// Shared HTTP client carrying the call deadline.
    http: reqwest::Client,
}

impl DiscoveryClient {
    /// Builds a client for the given router base URL.
    ///
    /// # Errors
    ///
    /// Returns [`DiscoveryError::Transport`] when the underlying HTTP
    /// client cannot be constructed.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, DiscoveryError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| DiscoveryError::Transport(err.to_string()))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    /// Registers `target` with the router and returns the stored target,
    /// which carries the issued id.
    ///
    /// # Errors
    ///
    /// Returns [`DiscoveryError::Transport`] when the router is
    /// unreachable, [`DiscoveryError::Rejected`] when it refuses the
    /// registration, and [`DiscoveryError::InvalidResponse`] when the
    /// reply envelope does not decode or carries no target.
    pub async fn register(&self, target: &ServiceTarget) -> Result<ServiceTarget, DiscoveryError> {
        let response = self
            .http
            .post(self.endpoint("register"))
            .json(target)
            .send()
            .await?;
        let envelope: ApiResponse<ServiceTarget> = Self::decode(response).await?;
        envelope.data.ok_or_else(|| {
            DiscoveryError::InvalidResponse("registration reply carried no target".to_string())
        })
    }

    /// Removes `target` from the router registry.
    ///
    /// # Errors
    ///
    /// Returns [`DiscoveryError::Transport`] when the router is
    /// unreachable and [`DiscoveryError::Rejected`] when it refuses the
    /// call.
    pub async fn deregister(&self, target: &ServiceTarget) -> Result<(), DiscoveryError> {
        let response = self
            .http
            .post(self.endpoint("deregister"))
            .json(target)
            .send()
            .await?;
        Self::check_status(response).await
    }

    /// Reports liveness for the service holding `id`.
    ///
    /// # Errors
    ///
    /// Returns [`DiscoveryError::Transport`] when the router is
    /// unreachable and [`DiscoveryError::Rejected`] when it refuses the
    /// call.
    pub async fn ping(&self, id: &ServiceId) -> Result<(), DiscoveryError> {
        let response = self
            .http
            .post(self.endpoint(&format!("ping/{}", id.as_str())))
            .send()
            .await?;
        Self::check_status(response).await
    }

    /// Appends a health record for the service holding `id`.
    ///
    /// # Errors
    ///
    /// Returns [`DiscoveryError::Transport`] when the router is
    /// unreachable and [`DiscoveryError::Rejected`] when it refuses the
    /// call.
    pub async fn update_state(
        &self,
        id: &ServiceId,
        record: &HealthRecord,
    ) -> Result<(), DiscoveryError> {
        let response = self
            .http
            .post(self.endpoint(&format!("update/{}", id.as_str())))
            .json(record)
            .send()
            .await?;
        Self::check_status(response).await
    }

    /// Renders the full URL for a discovery operation.
    fn endpoint(&self, operation: &str) -> String {
        format!("{}/api/v1/discovery/{operation}", self.base_url)
    }

    /// Decodes a success envelope or classifies the failure.
    async fn decode<T>(response: reqwest::Response) -> Result<ApiResponse<T>, DiscoveryError>
    where
        T: serde::de::DeserializeOwned,
    {
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(DiscoveryError::Rejected {
                status: status.as_u16(),
                message: Self::extract_error(&body),
            });
        }
        serde_json::from_str(&body)
            .map_err(|err| DiscoveryError::InvalidResponse(err.to_string()))
    }

    /// Maps a bodiless call to success or a rejection.
    async fn check_status(response: reqwest::Response) -> Result<(), DiscoveryError> {
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(DiscoveryError::Rejected {
            status: status.as_u16(),
            message: Self::extract_error(&body),
        })
    }

    /// Pulls the error field out of a response envelope, falling back to
    /// the raw body when it is not an envelope at all.
    fn extract_error(body: &str) -> String {
        serde_json::from_str::<ApiResponse<serde_json::Value>>(body)
            .ok()
            .and_then(|envelope| envelope.error)
            .unwrap_or_else(|| body.to_string())
    }
}
