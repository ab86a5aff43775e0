// crates/capmesh-dispatch/src/transport.rs
// ============================================================================
// Module: transport
// Description: Wire seam between the router and capability services.
// Purpose: Define the invocation request and reply shapes and carry them
//          over HTTP with bounded deadlines.
// Dependencies: capmesh-core, async-trait, reqwest, serde
// ============================================================================

//! ## Overview
//!
//! [`InvocationTransport`] is the only place dispatch touches the network.
//! A transport receives the resolved service address and a fully prepared
//! request; resolution and configuration merging happen above it. The
//! production implementation is [`HttpTransport`]; tests substitute
//! recording doubles.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use capmesh_core::GatewayError;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

// ==== SECTION: Request and reply shapes ====

/// Prepared tool invocation, ready for the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInvokeRequest {
    /// Tool URI from the catalog reference.
    pub uri: String,
    /// Optional request body.
    pub body: Option<String>,
    /// Merged configuration (advertised defaults with reference overrides).
    pub configurations: BTreeMap<String, String>,
    /// Caller-supplied arguments matching the tool input schema.
    pub arguments: BTreeMap<String, Value>,
}

/// Prepared resource acquisition, ready for the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceRequest {
    /// Resource location from the catalog reference.
    pub location: String,
    /// Reference type the providing service was resolved from.
    #[serde(rename = "type")]
    pub reference_type: String,
    /// Resource name, for provider-side bookkeeping.
    pub name: String,
    /// Merged configuration (advertised defaults with reference overrides).
    pub configurations: BTreeMap<String, String>,
}

/// Reply from a capability service.
///
/// `is_error` distinguishes a service that ran and failed from transport
/// faults, which never produce a reply at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallReply {
    /// True when the service executed and reports a failure.
    pub is_error: bool,
    /// Reply payload fragments, or failure detail when `is_error` is set.
    pub content: Vec<String>,
}

// ==== SECTION: Transport seam ====

/// Carries prepared invocations to a capability service address.
#[async_trait]
pub trait InvocationTransport: Send + Sync {
    /// Invokes a tool on the service at `address`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Transport`] when the service is
    /// unreachable and [`GatewayError::InvalidResponse`] when the reply
    /// does not decode.
    async fn invoke_tool(
        &self,
        address: &str,
        request: &ToolInvokeRequest,
    ) -> Result<CallReply, GatewayError>;

    /// Acquires a resource from the service at `address`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Transport`] when the service is
    /// unreachable and [`GatewayError::InvalidResponse`] when the reply
    /// does not decode.
    async fn acquire_resource(
        &self,
        address: &str,
        request: &ResourceRequest,
    ) -> Result<CallReply, GatewayError>;
}

// ==== SECTION: HTTP transport ====

/// Default per-call deadline for service invocations.
pub const DEFAULT_INVOKE_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP transport posting JSON invocations to capability services.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    /// Shared HTTP client carrying the call deadline.
    http: reqwest::Client,
}

impl HttpTransport {
    /// Builds a transport with the given per-call deadline.
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

    /// Posts `payload` to the service endpoint and decodes the reply.
    async fn post<P>(&self, url: String, payload: &P) -> Result<CallReply, GatewayError>
    where
        P: Serialize + Sync,
    {
        let response = self
            .http
            .post(url)
            .json(payload)
            .send()
            .await
            .map_err(|err| GatewayError::Transport(err.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::InvalidResponse(format!(
                "service answered {status}"
            )));
        }
        response
            .json::<CallReply>()
            .await
            .map_err(|err| GatewayError::InvalidResponse(err.to_string()))
    }
}

#[async_trait]
impl InvocationTransport for HttpTransport {
    async fn invoke_tool(
        &self,
        address: &str,
        request: &ToolInvokeRequest,
    ) -> Result<CallReply, GatewayError> {
        self.post(format!("http://{address}/api/v1/invoke/tool"), request)
            .await
    }

    async fn acquire_resource(
        &self,
        address: &str,
        request: &ResourceRequest,
    ) -> Result<CallReply, GatewayError> {
        self.post(format!("http://{address}/api/v1/invoke/resource"), request)
            .await
    }
}
