// crates/dockgate-core/tests/status.rs
// ============================================================================
// Module: Status Aggregator Tests
// Description: Tests for snapshot fan-out and per-target failure tolerance.
// Purpose: Ensure one unreachable target never fails the whole snapshot.
// Dependencies: dockgate-core, serde_json, tokio
// ============================================================================

//! ## Overview
//! Exercises [`dockgate_core::StatusAggregator`] and the serialized snapshot
//! shape consumed by the status surface.

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

use common::Fixture;
use dockgate_core::InMemoryRuntimeClient;
use serde_json::json;

/// Verifies failing and missing targets are reported as unknown.
#[tokio::test]
async fn failing_targets_report_unknown() {
    let runtime = InMemoryRuntimeClient::new()
        .with_container("game1", "running")
        .with_container("game2", "exited");
    runtime.fail_inspect("game2");
    let fixture = Fixture::new(&["game1", "game2", "game3"], runtime);
    fixture.activity.record("start game1");

    let snapshot = fixture.aggregator().snapshot().await;
    assert!(snapshot.ok);
    assert_eq!(snapshot.containers["game1"].as_deref(), Some("running"));
    assert_eq!(snapshot.containers["game2"], None);
    assert_eq!(snapshot.containers["game3"], None);
    assert_eq!(snapshot.permissions["stop"], vec!["ServerAdmin".to_string()]);
    assert_eq!(snapshot.recent_activity.len(), 1);
}

/// Verifies the serialized snapshot uses the documented field names.
#[tokio::test]
async fn snapshot_serializes_camel_case() {
    let fixture = Fixture::new(&["game1"], InMemoryRuntimeClient::new().with_container("game1", "running"));
    let value = serde_json::to_value(fixture.aggregator().snapshot().await).unwrap();
    assert_eq!(value["ok"], json!(true));
    assert_eq!(value["containers"], json!({"game1": "running"}));
    assert!(value["recentActivity"].is_array());
    assert_eq!(value["permissions"]["announce"], json!(["ServerAdmin"]));
}

/// Verifies a snapshot has no side effects on the runtime.
#[tokio::test]
async fn snapshot_only_inspects() {
    let fixture = Fixture::new(&["game1"], InMemoryRuntimeClient::new().with_container("game1", "exited"));
    let _ = fixture.aggregator().snapshot().await;
    assert!(
        fixture
            .runtime
            .calls()
            .iter()
            .all(|call| matches!(call, dockgate_core::runtime::RuntimeCall::Inspect(_)))
    );
    assert_eq!(fixture.runtime.status_of("game1").as_deref(), Some("exited"));
}
