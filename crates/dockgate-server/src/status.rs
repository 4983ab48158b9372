// crates/dockgate-server/src/status.rs
// ============================================================================
// Module: Status Surface
// Description: Read-only HTTP endpoints for container and permission state.
// Purpose: Serve aggregated status behind optional token authentication.
// Dependencies: axum, dockgate-core, serde_json
// ============================================================================

//! ## Overview
//! `GET /status` returns the [`dockgate_core::StatusSnapshot`] as JSON after
//! [`StatusAuth`] accepts the request. `GET /healthz` is unauthenticated and
//! reveals nothing beyond liveness. Neither endpoint mutates state.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::Query;
use axum::extract::State;
use axum::extract::rejection::QueryRejection;
use axum::http::HeaderMap;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::routing::get;
use dockgate_core::StatusAggregator;
use serde_json::json;

use crate::auth::STATUS_TOKEN_QUERY;
use crate::auth::StatusAuth;

// ============================================================================
// SECTION: State
// ============================================================================

/// Shared state for the status endpoints.
#[derive(Clone)]
pub struct StatusState {
    /// Snapshot producer.
    pub aggregator: StatusAggregator,
    /// Token check for `/status`.
    pub auth: StatusAuth,
}

// ============================================================================
// SECTION: Router
// ============================================================================

/// Builds the status router.
pub fn status_router(state: Arc<StatusState>) -> Router {
    Router::new()
        .route("/status", get(handle_status))
        .route("/healthz", get(handle_healthz))
        .with_state(state)
}

/// Serves the aggregated snapshot.
async fn handle_status(
    State(state): State<Arc<StatusState>>,
    query: Result<Query<BTreeMap<String, String>>, QueryRejection>,
    headers: HeaderMap,
) -> Response {
    let params = query.map(|Query(params)| params).unwrap_or_default();
    let token = params.get(STATUS_TOKEN_QUERY).map(String::as_str);
    if state.auth.authorize(&headers, token).is_err() {
        return (StatusCode::UNAUTHORIZED, Json(json!({"ok": false, "error": "unauthorized"})))
            .into_response();
    }
    let snapshot = state.aggregator.snapshot().await;
    (StatusCode::OK, Json(snapshot)).into_response()
}

/// Reports liveness.
async fn handle_healthz() -> impl IntoResponse {
    Json(json!({"ok": true}))
}
