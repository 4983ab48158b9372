// crates/dockgate-server/tests/status.rs
// ============================================================================
// Module: Status Surface Tests
// Description: HTTP tests for the status and health endpoints.
// Purpose: Ensure token checks gate container data and nothing else leaks.
// Dependencies: axum, dockgate-server, http-body-util, tower
// ============================================================================

//! ## Overview
//! Sends requests through the axum router with `tower::ServiceExt::oneshot`.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

mod common;

use axum::body::Body;
use axum::http::Request;
use axum::http::StatusCode;
use common::STATUS_TOKEN;
use common::ServerFixture;
use dockgate_core::InMemoryRuntimeClient;
use http_body_util::BodyExt;
use serde_json::Value;
use serde_json::json;
use tower::ServiceExt;

/// Sends a GET request and returns the status code and JSON body.
async fn get(fixture: &ServerFixture, uri: &str, headers: &[(&str, &str)]) -> (StatusCode, Value) {
    let mut builder = Request::builder().method("GET").uri(uri);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    let response =
        fixture.server.status_app().oneshot(builder.body(Body::empty()).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn fixture(token: Option<&str>) -> ServerFixture {
    let runtime = InMemoryRuntimeClient::new()
        .with_container("game1", "running")
        .with_container("game2", "exited");
    ServerFixture::new(&["game1", "game2"], runtime, token)
}

/// Verifies an open surface serves the snapshot without credentials.
#[tokio::test]
async fn open_surface_serves_snapshot() {
    let fixture = fixture(None);
    let (status, body) = get(&fixture, "/status", &[]).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], json!(true));
    assert_eq!(body["containers"], json!({"game1": "running", "game2": "exited"}));
    assert_eq!(body["permissions"]["stop"], json!(["ServerAdmin"]));
    assert!(body["recentActivity"].as_array().unwrap().is_empty());
    assert_eq!(fixture.audit.events_of("status_auth")[0]["method"], json!("open"));
}

/// Verifies every accepted token location.
#[tokio::test]
async fn token_is_accepted_from_each_location() {
    let fixture = fixture(Some(STATUS_TOKEN));
    let bearer = format!("Bearer {STATUS_TOKEN}");
    let query = format!("/status?token={STATUS_TOKEN}");

    let (status, _) = get(&fixture, "/status", &[("x-status-token", STATUS_TOKEN)]).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = get(&fixture, "/status", &[("authorization", &bearer)]).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = get(&fixture, &query, &[]).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["containers"]["game1"], json!("running"));

    let methods: Vec<Value> =
        fixture.audit.events_of("status_auth").into_iter().map(|event| event["method"].clone()).collect();
    assert_eq!(methods, vec![json!("header"), json!("bearer"), json!("query")]);
}

/// Verifies missing and wrong tokens are rejected without container data.
#[tokio::test]
async fn bad_tokens_are_unauthorized() {
    let fixture = fixture(Some(STATUS_TOKEN));
    let expected = json!({"ok": false, "error": "unauthorized"});

    let (status, body) = get(&fixture, "/status", &[]).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, expected);
    let (status, body) = get(&fixture, "/status?token=wrong", &[("x-status-token", "also-wrong")]).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, expected);
    assert!(fixture.runtime.calls().is_empty());

    let denials = fixture.audit.events_of("status_auth");
    assert_eq!(denials.len(), 2);
    assert!(denials.iter().all(|event| event["decision"] == "deny"));
    let serialized = serde_json::to_string(&denials).unwrap();
    assert!(!serialized.contains("also-wrong"));
    assert!(!serialized.contains(STATUS_TOKEN));
}

/// Verifies the health endpoint needs no token and reveals no state.
#[tokio::test]
async fn healthz_is_unauthenticated() {
    let fixture = fixture(Some(STATUS_TOKEN));
    let (status, body) = get(&fixture, "/healthz", &[]).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"ok": true}));
    assert!(fixture.runtime.calls().is_empty());
    assert!(fixture.audit.events().is_empty());
}

/// Verifies query tokens are form-decoded before comparison.
#[tokio::test]
async fn query_token_is_percent_decoded() {
    let token = "tok+en/with=reserved&chars%";
    let fixture = fixture(Some(token));

    let (status, _) =
        get(&fixture, "/status?token=tok%2Ben%2Fwith%3Dreserved%26chars%25", &[]).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) =
        get(&fixture, "/status?token=tok+en/with%3Dreserved%26chars%25", &[]).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({"ok": false, "error": "unauthorized"}));
}
