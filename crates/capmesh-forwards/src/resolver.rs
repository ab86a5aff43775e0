// crates/capmesh-forwards/src/resolver.rs
// ============================================================================
// Module: resolver
// Description: Remote catalog retrieval for forward links.
// Purpose: Fetch the tool and resource catalogs a remote router exposes.
// Dependencies: capmesh-core, async-trait, reqwest
// ============================================================================

//! ## Overview
//!
//! [`ForwardResolver`] is the wire seam for federation: given a forward
//! reference it returns the remote router's catalogs. The production
//! implementation speaks the router's own REST catalog surface; tests
//! substitute canned resolvers.

use std::time::Duration;

use async_trait::async_trait;
use capmesh_core::ApiResponse;
use capmesh_core::ForwardReference;
use capmesh_core::GatewayError;
use capmesh_core::RemoteToolReference;
use capmesh_core::ResourceReference;

/// Fetches the catalogs a remote router exposes.
#[async_trait]
pub trait ForwardResolver: Send + Sync {
    /// Lists the tools the remote router advertises.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Transport`] when the remote is
    /// unreachable and [`GatewayError::InvalidResponse`] when its reply
    /// does not decode.
    async fn list_tools(
        &self,
        forward: &ForwardReference,
    ) -> Result<Vec<RemoteToolReference>, GatewayError>;

    /// Lists the resources the remote router advertises.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Transport`] when the remote is
    /// unreachable and [`GatewayError::InvalidResponse`] when its reply
    /// does not decode.
    async fn list_resources(
        &self,
        forward: &ForwardReference,
    ) -> Result<Vec<ResourceReference>, GatewayError>;
}

/// Default deadline for remote catalog fetches.
pub const DEFAULT_RESOLVE_TIMEOUT: Duration = Duration::from_secs(10);

/// REST resolver against a remote router's catalog endpoints.
#[derive(Debug, Clone)]
pub struct HttpForwardResolver {
    /// Shared HTTP client carrying the fetch deadline.
    http: reqwest::Client,
}

impl HttpForwardResolver {
    /// Builds a resolver with the given fetch deadline.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Transport`] when the underlying HTTP
    /// client cannot be constructed.
    pub fn new(timeout: Duration) -> Result<Self, GatewayError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| GatewayError::Transport(err.to_string()))?;
        Ok(Self { http })
    }

    /// Fetches one catalog listing and unwraps the response envelope.
    async fn fetch<T>(&self, url: String) -> Result<Vec<T>, GatewayError>
    where
        T: serde::de::DeserializeOwned,
    {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|err| GatewayError::Transport(err.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::InvalidResponse(format!(
                "remote router answered {status}"
            )));
        }
        let envelope: ApiResponse<Vec<T>> = response
            .json()
            .await
            .map_err(|err| GatewayError::InvalidResponse(err.to_string()))?;
        Ok(envelope.data.unwrap_or_default())
    }

    /// Renders a catalog URL under the forward's base address.
    fn catalog_url(forward: &ForwardReference, listing: &str) -> String {
        format!(
            "{}/api/v1/{listing}/list",
            forward.address.trim_end_matches('/')
        )
    }
}

#[async_trait]
impl ForwardResolver for HttpForwardResolver {
    async fn list_tools(
        &self,
        forward: &ForwardReference,
    ) -> Result<Vec<RemoteToolReference>, GatewayError> {
        self.fetch(Self::catalog_url(forward, "tools")).await
    }

    async fn list_resources(
        &self,
        forward: &ForwardReference,
    ) -> Result<Vec<ResourceReference>, GatewayError> {
        self.fetch(Self::catalog_url(forward, "resources")).await
    }
}
