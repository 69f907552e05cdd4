//! Axum router and all HTTP handlers for the control API.
//!
//! `build_router` is the single entry point; `main.rs` calls it and
//! attaches middleware layers. Handlers are `pub(crate)` so the scenario
//! tests in `tests/` can compose the router directly.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use fleet_model::EntityKind;
use tracing::info;

use crate::{
    api_types::{HealthResponse, OpResponse, StatusResponse},
    commands::DispatchError,
    state::{uptime_secs, AppState},
};

/// Build the complete application router wired to the given shared state.
///
/// Middleware layers (tracing) are **not** applied here; `main.rs` attaches
/// them after this call so tests can use the bare router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/bootstrap", post(bootstrap))
        .route("/destroy", post(destroy))
        .route("/fail/:entity", post(fail))
        .route("/v1/health", get(health))
        .route("/v1/status", get(status_handler))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// POST /bootstrap
// ---------------------------------------------------------------------------

/// Enqueue a Bootstrap command and block on its completion.
pub(crate) async fn bootstrap(State(st): State<Arc<AppState>>) -> Response {
    complete(st.control.bootstrap().await)
}

// ---------------------------------------------------------------------------
// POST /destroy
// ---------------------------------------------------------------------------

/// Enqueue a Destroy command and block on its completion.
pub(crate) async fn destroy(State(st): State<Arc<AppState>>) -> Response {
    complete(st.control.destroy().await)
}

// ---------------------------------------------------------------------------
// POST /fail/:entity
// ---------------------------------------------------------------------------

/// Mark the given entity as doomed to fail. Direct registry write; does
/// not go through the command queue.
///
/// Keys are `<kind>-<id>`; a key whose kind prefix is not one the worker
/// drives is rejected rather than left to rot unmatched in the registry.
pub(crate) async fn fail(
    State(st): State<Arc<AppState>>,
    Path(entity): Path<String>,
) -> Response {
    let kind = match entity.split_once('-') {
        Some((prefix, rest)) if !rest.is_empty() => EntityKind::parse(prefix),
        _ => None,
    };
    if kind.is_none() {
        return (
            StatusCode::BAD_REQUEST,
            Json(OpResponse::failed(format!("unknown entity key: {entity}"))),
        )
            .into_response();
    }
    info!(%entity, "scheduling failure");
    st.control.fail(&entity);
    (StatusCode::OK, Json(OpResponse::done())).into_response()
}

// ---------------------------------------------------------------------------
// GET /v1/health
// ---------------------------------------------------------------------------

pub(crate) async fn health(State(st): State<Arc<AppState>>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            ok: true,
            service: st.build.service,
            version: st.build.version,
        }),
    )
}

// ---------------------------------------------------------------------------
// GET /v1/status
// ---------------------------------------------------------------------------

pub(crate) async fn status_handler(State(st): State<Arc<AppState>>) -> impl IntoResponse {
    let snapshot = st.status.read().await.clone();
    (
        StatusCode::OK,
        Json(StatusResponse {
            state: snapshot.state,
            session_id: snapshot.session_id,
            uptime_secs: uptime_secs(),
        }),
    )
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Map a command completion onto the wire: 200 on success, 400 with the
/// error message in the body otherwise.
fn complete(result: Result<(), DispatchError>) -> Response {
    match result {
        Ok(()) => (StatusCode::OK, Json(OpResponse::done())).into_response(),
        Err(err) => (
            StatusCode::BAD_REQUEST,
            Json(OpResponse::failed(err.to_string())),
        )
            .into_response(),
    }
}
