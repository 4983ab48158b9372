// crates/dockgate-broker/tests/sinks/callback_tests.rs
// ============================================================================
// Module: CallbackSink Unit Tests
// Description: Tests for the callback-based notification sink.
// Purpose: Validate handler invocation and error propagation.
// Dependencies: dockgate-broker
// ============================================================================

//! ## Overview
//! Exercises [`dockgate_broker::CallbackSink`] behavior.

use std::sync::Arc;
use std::sync::Mutex;

use dockgate_broker::CallbackSink;
use dockgate_broker::NotificationSink;
use dockgate_broker::SinkError;

use super::common::sample_notification;

/// Tests the handler receives each notification.
#[test]
fn callback_sink_invokes_handler() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let recorder = Arc::clone(&seen);
    let sink = CallbackSink::new(move |notification| {
        recorder.lock().unwrap().push(notification.text.clone());
        Ok(())
    });

    sink.notify(&sample_notification(1, "game1")).unwrap();
    sink.notify(&sample_notification(2, "game1")).unwrap();
    assert_eq!(seen.lock().unwrap().len(), 2);
}

/// Tests handler errors are returned unchanged.
#[test]
fn callback_sink_propagates_handler_error() {
    let sink =
        CallbackSink::new(|_| Err(SinkError::DeliveryFailed("transport closed".to_string())));
    let err = sink.notify(&sample_notification(1, "game1")).unwrap_err();
    assert_eq!(err, SinkError::DeliveryFailed("transport closed".to_string()));
}

/// Tests clones share the same handler.
#[test]
fn callback_sink_clones_share_handler() {
    let count = Arc::new(Mutex::new(0_u32));
    let counter = Arc::clone(&count);
    let sink = CallbackSink::new(move |_| {
        *counter.lock().unwrap() += 1;
        Ok(())
    });
    let clone = sink.clone();

    sink.notify(&sample_notification(1, "game1")).unwrap();
    clone.notify(&sample_notification(2, "game1")).unwrap();
    assert_eq!(*count.lock().unwrap(), 2);
}
