//! In-process scenario tests for the control API.
//!
//! These tests spin up the Axum router **without** binding a TCP socket.
//! Each test calls `routes::build_router` over a real dispatcher and drives
//! it via `tower::ServiceExt::oneshot` — no network I/O required.

use std::sync::Arc;
use std::time::Duration;

use axum::http::{Request, StatusCode};
use fleet_daemon::{dispatcher::Dispatcher, routes, state};
use fleet_engine::EngineOptions;
use fleet_model::EntityKind;
use http_body_util::BodyExt;
use tower::ServiceExt; // oneshot

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn fast_options() -> EngineOptions {
    EngineOptions {
        startup_delay: Duration::from_millis(1),
        presence_timeout: Duration::from_millis(500),
        ..EngineOptions::default()
    }
}

/// Build a fresh in-process router backed by its own dispatcher. The
/// control handle is returned for direct registry assertions.
fn make_app() -> (axum::Router, fleet_daemon::dispatcher::ControlHandle) {
    let (control, status, _task) = Dispatcher::spawn(fast_options());
    let st = Arc::new(state::AppState::new(control.clone(), status));
    (routes::build_router(st), control)
}

/// Drive the router with one request and return (status, body json).
async fn call(
    router: axum::Router,
    method: &str,
    uri: &str,
) -> (StatusCode, serde_json::Value) {
    let req = Request::builder()
        .method(method)
        .uri(uri)
        .body(axum::body::Body::empty())
        .unwrap();
    let resp = router.oneshot(req).await.expect("oneshot failed");
    let status = resp.status();
    let body = resp
        .into_body()
        .collect()
        .await
        .expect("body collect failed")
        .to_bytes();
    let json = serde_json::from_slice(&body).expect("body is not valid JSON");
    (status, json)
}

// ---------------------------------------------------------------------------
// GET /v1/health
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_returns_200_ok_true() {
    let (router, _control) = make_app();
    let (status, json) = call(router, "GET", "/v1/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["ok"], true);
    assert_eq!(json["service"], "fakefleetd");
}

// ---------------------------------------------------------------------------
// GET /v1/status
// ---------------------------------------------------------------------------

#[tokio::test]
async fn status_tracks_session_lifecycle() {
    let (router, _control) = make_app();

    let (status, json) = call(router.clone(), "GET", "/v1/status").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["state"], "idle");
    assert!(json["session_id"].is_null());

    let (status, _) = call(router.clone(), "POST", "/bootstrap").await;
    assert_eq!(status, StatusCode::OK);

    let (_, json) = call(router.clone(), "GET", "/v1/status").await;
    assert_eq!(json["state"], "active");
    assert!(json["session_id"].is_string());

    let (status, _) = call(router.clone(), "POST", "/destroy").await;
    assert_eq!(status, StatusCode::OK);

    let (_, json) = call(router, "GET", "/v1/status").await;
    assert_eq!(json["state"], "idle");
    assert!(json["session_id"].is_null());
}

// ---------------------------------------------------------------------------
// POST /bootstrap and /destroy
// ---------------------------------------------------------------------------

#[tokio::test]
async fn bootstrap_twice_is_refused_not_stacked() {
    let (router, _control) = make_app();

    let (status, json) = call(router.clone(), "POST", "/bootstrap").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["ok"], true);

    let (status, json) = call(router, "POST", "/bootstrap").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["ok"], false);
    assert!(json["error"]
        .as_str()
        .unwrap()
        .contains("already bootstrapped"));
}

#[tokio::test]
async fn destroy_without_bootstrap_is_an_error() {
    let (router, _control) = make_app();
    let (status, json) = call(router, "POST", "/destroy").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("no session"));
}

#[tokio::test]
async fn bootstrap_destroy_bootstrap_cycles_cleanly() {
    let (router, _control) = make_app();
    for _ in 0..2 {
        let (status, _) = call(router.clone(), "POST", "/bootstrap").await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = call(router.clone(), "POST", "/destroy").await;
        assert_eq!(status, StatusCode::OK);
    }
}

// ---------------------------------------------------------------------------
// POST /fail/:entity
// ---------------------------------------------------------------------------

#[tokio::test]
async fn fail_marks_the_exact_entity() {
    let (router, control) = make_app();

    let (status, json) = call(router, "POST", "/fail/unit-wordpress-0").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["ok"], true);

    assert!(control
        .failures()
        .should_fail(EntityKind::Unit, "wordpress-0"));
    assert!(!control
        .failures()
        .should_fail(EntityKind::Unit, "wordpress-1"));
}

#[tokio::test]
async fn fail_rejects_unknown_entity_kinds() {
    let (router, control) = make_app();

    for uri in ["/fail/application-wordpress", "/fail/unit", "/fail/bogus"] {
        let (status, json) = call(router.clone(), "POST", uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(json["ok"], false);
        assert!(json["error"].as_str().unwrap().contains("unknown entity"));
    }
    assert!(control.failures().is_empty());
}

#[tokio::test]
async fn destroy_clears_scheduled_failures() {
    let (router, control) = make_app();

    let (status, _) = call(router.clone(), "POST", "/bootstrap").await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = call(router.clone(), "POST", "/fail/unit-wordpress-0").await;
    assert_eq!(status, StatusCode::OK);
    assert!(!control.failures().is_empty());

    let (status, _) = call(router, "POST", "/destroy").await;
    assert_eq!(status, StatusCode::OK);
    assert!(control.failures().is_empty());
}
