// crates/dockgate-broker/tests/sinks/fanout_tests.rs
// ============================================================================
// Module: FanoutSink Unit Tests
// Description: Tests for the composite notification sink.
// Purpose: Validate that one failing member never starves the others.
// Dependencies: dockgate-broker
// ============================================================================

//! ## Overview
//! Exercises [`dockgate_broker::FanoutSink`] ordering and error handling.

use std::sync::Arc;
use std::sync::Mutex;

use dockgate_broker::CallbackSink;
use dockgate_broker::FanoutSink;
use dockgate_broker::LogSink;
use dockgate_broker::NotificationSink;
use dockgate_broker::SinkError;

use super::common::FailingWriter;
use super::common::SharedBuffer;
use super::common::sample_notification;

/// Tests every member receives the notification.
#[test]
fn fanout_delivers_to_every_member() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let recorder = Arc::clone(&seen);
    let buffer = SharedBuffer::new();
    let sink = FanoutSink::default()
        .with(Arc::new(CallbackSink::new(move |notification| {
            recorder.lock().unwrap().push(notification.id.get());
            Ok(())
        })))
        .with(Arc::new(LogSink::new(buffer.clone())));
    assert_eq!(sink.len(), 2);

    sink.notify(&sample_notification(3, "game1")).unwrap();
    assert_eq!(*seen.lock().unwrap(), vec![3]);
    assert_eq!(buffer.to_string_lossy().lines().count(), 1);
}

/// Tests a failing member is reported after later members still ran.
#[test]
fn fanout_reports_first_failure_after_trying_all() {
    let buffer = SharedBuffer::new();
    let sink = FanoutSink::new(vec![
        Arc::new(LogSink::new(FailingWriter)),
        Arc::new(CallbackSink::new(|_| Err(SinkError::DeliveryFailed("second".to_string())))),
        Arc::new(LogSink::new(buffer.clone())),
    ]);

    let err = sink.notify(&sample_notification(1, "game1")).unwrap_err();
    assert!(matches!(err, SinkError::LogWriteFailed(_)));
    assert_eq!(buffer.to_string_lossy().lines().count(), 1);
}

/// Tests an empty fan-out accepts notifications.
#[test]
fn empty_fanout_is_a_no_op() {
    let sink = FanoutSink::default();
    assert!(sink.is_empty());
    assert_eq!(sink.notify(&sample_notification(1, "game1")), Ok(()));
}
