// crates/dockgate-broker/tests/sinks/log_tests.rs
// ============================================================================
// Module: LogSink Unit Tests
// Description: Tests for the JSON-lines notification sink.
// Purpose: Validate record shape and write error handling.
// Dependencies: dockgate-broker, serde_json
// ============================================================================

//! ## Overview
//! Exercises [`dockgate_broker::LogSink`] JSON output.

use dockgate_broker::LogSink;
use dockgate_broker::NotificationSink;
use dockgate_broker::SinkError;
use serde_json::Value;
use serde_json::json;

use super::common::FailingWriter;
use super::common::SharedBuffer;
use super::common::sample_notification;

/// Tests each notification becomes one JSON line.
#[test]
fn log_sink_writes_one_json_line_per_notification() {
    let buffer = SharedBuffer::new();
    let sink = LogSink::new(buffer.clone());
    sink.notify(&sample_notification(1, "game1")).unwrap();
    sink.notify(&sample_notification(2, "game2")).unwrap();

    let output = buffer.to_string_lossy();
    let lines: Vec<&str> = output.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(output.ends_with('\n'));

    let record: Value = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(record["id"], json!(1));
    assert_eq!(record["target"], json!("game1"));
    assert_eq!(record["kind"], json!("stop"));
    assert_eq!(record["state"], json!("announced"));
    assert!(record["text"].as_str().unwrap().starts_with("Server will shut down"));
}

/// Tests write failures surface as log write errors.
#[test]
fn log_sink_write_failure_is_reported() {
    let sink = LogSink::new(FailingWriter);
    let err = sink.notify(&sample_notification(1, "game1")).unwrap_err();
    assert!(matches!(err, SinkError::LogWriteFailed(_)));
}
