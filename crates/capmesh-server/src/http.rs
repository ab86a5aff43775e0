// crates/capmesh-server/src/http.rs
// ============================================================================
// Module: http
// Description: REST surface of the router.
// Purpose: Mount the discovery, management, catalog, and invocation
//          endpoints over the shared application state.
// Dependencies: capmesh crates, axum
// ============================================================================

//! ## Overview
//!
//! Every endpoint answers with the [`ApiResponse`] envelope. Domain
//! failures map onto statuses by class: routing misses are 404, conflicts
//! 409, downstream transport and decode failures 502, and store failures
//! 500. Discovery endpoints are called by capability services on a tight
//! cadence and stay allocation-light; management endpoints are for
//! operators and federation peers.

use std::collections::BTreeMap;

use axum::Json;
use axum::Router;
use axum::extract::Path;
use axum::extract::Query;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::routing::delete;
use axum::routing::get;
use axum::routing::post;
use axum::routing::put;
use capmesh_core::ApiResponse;
use capmesh_forwards::CatalogMounts;
use capmesh_core::ForwardReference;
use capmesh_core::GatewayError;
use capmesh_core::HealthRecord;
use capmesh_core::ServiceId;
use capmesh_core::ServiceRole;
use capmesh_core::ServiceTarget;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::state::AppState;
use crate::telemetry::CallOutcome;
use crate::telemetry::DispatchOp;

// ==== SECTION: Router assembly ====

/// Builds the full REST surface over `state`.
#[must_use]
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/discovery/register", post(register))
        .route("/api/v1/discovery/deregister", post(deregister))
        .route("/api/v1/discovery/ping/{id}", post(ping))
        .route("/api/v1/discovery/update/{id}", post(update_state))
        .route("/api/v1/management/targets/{role}", get(targets))
        .route(
            "/api/v1/management/targets/{name}/configure",
            put(configure_target),
        )
        .route("/api/v1/management/states/{id}", get(states))
        .route("/api/v1/management/namespaces", get(namespaces))
        .route("/api/v1/management/forwards", get(forwards).post(link_forward))
        .route("/api/v1/management/forwards/{name}", delete(unlink_forward))
        .route("/api/v1/tools/list", get(list_tools))
        .route("/api/v1/tools/invoke/{name}", post(invoke_tool))
        .route("/api/v1/resources/list", get(list_resources))
        .route("/api/v1/resources/acquire/{name}", post(acquire_resource))
        .with_state(state)
}

// ==== SECTION: Envelope helpers ====

/// Wraps a payload in the success envelope.
fn success<T: Serialize>(data: T) -> Response {
    (StatusCode::OK, Json(ApiResponse::ok(data))).into_response()
}

/// Wraps an error message in the failure envelope.
fn failure(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(ApiResponse::<()>::failure(message))).into_response()
}

/// Maps a domain failure onto its HTTP status.
const fn status_for(err: &GatewayError) -> StatusCode {
    match err {
        GatewayError::NotFound(_) => StatusCode::NOT_FOUND,
        GatewayError::Conflict(_) => StatusCode::CONFLICT,
        GatewayError::Transport(_) | GatewayError::InvalidResponse(_) => StatusCode::BAD_GATEWAY,
        GatewayError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Renders a domain failure as an enveloped response.
fn gateway_failure(err: &GatewayError) -> Response {
    failure(status_for(err), err.to_string())
}

/// Parses a role path segment.
fn parse_role(raw: &str) -> Option<ServiceRole> {
    match raw {
        "tool-invoker" => Some(ServiceRole::ToolInvoker),
        "resource-provider" => Some(ServiceRole::ResourceProvider),
        _ => None,
    }
}

// ==== SECTION: Discovery surface ====

/// Registers or refreshes a capability target.
async fn register(State(state): State<AppState>, Json(target): Json<ServiceTarget>) -> Response {
    let stored = state.registry.register(target);
    success(stored)
}

/// Removes a capability target; idempotent.
async fn deregister(State(state): State<AppState>, Json(target): Json<ServiceTarget>) -> Response {
    state.registry.deregister(&target);
    success(())
}

/// Records liveness for an issued id.
async fn ping(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    state.registry.ping(&ServiceId::new(id));
    success(())
}

/// Appends a health record for an issued id.
async fn update_state(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(record): Json<HealthRecord>,
) -> Response {
    state.registry.update_last_state(&ServiceId::new(id), record);
    success(())
}

// ==== SECTION: Management surface ====

/// Lists registered targets for one role, one per service name.
async fn targets(State(state): State<AppState>, Path(role): Path<String>) -> Response {
    let Some(role) = parse_role(&role) else {
        return failure(StatusCode::NOT_FOUND, format!("unknown role {role}"));
    };
    success(state.registry.entries(role))
}

/// Body for a target configuration update.
#[derive(Debug, Deserialize)]
struct ConfigurePayload {
    /// Option name to set.
    option: String,
    /// New value.
    value: String,
}

/// Updates one advertised option on every instance of a service.
async fn configure_target(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(payload): Json<ConfigurePayload>,
) -> Response {
    let updated = state
        .registry
        .update_configuration(&name, &payload.option, &payload.value);
    if updated == 0 {
        return failure(
            StatusCode::NOT_FOUND,
            format!("no registered instance of {name}"),
        );
    }
    success(updated)
}

/// Query parameters for the state listing.
#[derive(Debug, Deserialize)]
struct StatesQuery {
    /// Most-recent records to return; defaults to the ring capacity.
    limit: Option<usize>,
}

/// Lists recent health records for an issued id.
async fn states(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<StatesQuery>,
) -> Response {
    let limit = query
        .limit
        .unwrap_or(capmesh_core::health::DEFAULT_HISTORY_CAPACITY);
    match state.registry.states(&ServiceId::new(id.clone()), limit) {
        Some(records) => success(records),
        None => failure(StatusCode::NOT_FOUND, format!("unknown service id {id}")),
    }
}

/// Lists the namespace pool, bound and free slots alike.
async fn namespaces(State(state): State<AppState>) -> Response {
    success(state.namespaces.list())
}

/// Lists the live forward links.
async fn forwards(State(state): State<AppState>) -> Response {
    success(state.forwards.services())
}

/// Links a remote router and mounts its catalog.
async fn link_forward(
    State(state): State<AppState>,
    Json(forward): Json<ForwardReference>,
) -> Response {
    match state.forwards.link(forward).await {
        Ok(()) => success(()),
        Err(err) => gateway_failure(&err),
    }
}

/// Unlinks a forward, unmounting its entries first.
async fn unlink_forward(State(state): State<AppState>, Path(name): Path<String>) -> Response {
    match state.forwards.unlink(&name) {
        Ok(removed) => success(removed),
        Err(err) => gateway_failure(&err),
    }
}

// ==== SECTION: Catalog surface ====

/// Lists the mounted tool catalog.
async fn list_tools(State(state): State<AppState>) -> Response {
    success(state.mounts.tools())
}

/// Lists the mounted resource catalog.
async fn list_resources(State(state): State<AppState>) -> Response {
    success(state.mounts.resources())
}

// ==== SECTION: Invocation surface ====

/// Body for a tool invocation.
#[derive(Debug, Deserialize)]
struct InvokePayload {
    /// Optional request body handed to the invoker.
    #[serde(default)]
    body: Option<String>,
    /// Arguments matching the tool input schema.
    #[serde(default)]
    arguments: BTreeMap<String, Value>,
}

/// Dispatches a tool invocation to its registered invoker.
async fn invoke_tool(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(payload): Json<InvokePayload>,
) -> Response {
    let Some(reference) = state
        .mounts
        .tools()
        .into_iter()
        .find(|tool| tool.name == name)
    else {
        state
            .metrics
            .incr_dispatch(DispatchOp::InvokeTool, CallOutcome::Rejected);
        return failure(StatusCode::NOT_FOUND, format!("unknown tool {name}"));
    };
    match state
        .tool_proxy
        .invoke(&reference, payload.body, payload.arguments)
        .await
    {
        Ok(reply) => {
            state
                .metrics
                .incr_dispatch(DispatchOp::InvokeTool, CallOutcome::Accepted);
            success(reply)
        }
        Err(err) => {
            state
                .metrics
                .incr_dispatch(DispatchOp::InvokeTool, CallOutcome::Rejected);
            gateway_failure(&err)
        }
    }
}

/// Dispatches a resource acquisition to its registered provider.
async fn acquire_resource(State(state): State<AppState>, Path(name): Path<String>) -> Response {
    let Some(reference) = state
        .mounts
        .resources()
        .into_iter()
        .find(|resource| resource.name == name)
    else {
        state
            .metrics
            .incr_dispatch(DispatchOp::AcquireResource, CallOutcome::Rejected);
        return failure(StatusCode::NOT_FOUND, format!("unknown resource {name}"));
    };
    match state.resource_proxy.acquire(&reference).await {
        Ok(reply) => {
            state
                .metrics
                .incr_dispatch(DispatchOp::AcquireResource, CallOutcome::Accepted);
            success(reply)
        }
        Err(err) => {
            state
                .metrics
                .incr_dispatch(DispatchOp::AcquireResource, CallOutcome::Rejected);
            gateway_failure(&err)
        }
    }
}
