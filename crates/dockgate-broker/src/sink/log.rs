// crates/dockgate-broker/src/sink/log.rs
// ============================================================================
// Module: Dockgate Log Sink
// Description: JSON-lines sink for notification records.
// Purpose: Persist scheduled-action progress without relaying it.
// Dependencies: dockgate-core, serde_json, std
// ============================================================================

//! ## Overview
//! `LogSink` writes one JSON object per notification followed by a newline.
//! Records carry the schedule id, target, kind, state and operator text.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::sync::Mutex;

use dockgate_core::Notification;
use dockgate_core::NotificationSink;
use dockgate_core::SinkError;

// ============================================================================
// SECTION: Log Sink
// ============================================================================

/// JSON-lines notification sink.
pub struct LogSink<W: Write + Send> {
    /// Output writer for log records.
    writer: Mutex<W>,
}

impl<W: Write + Send> LogSink<W> {
    /// Creates a log sink over `writer`.
    pub const fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }
}

impl<W: Write + Send> NotificationSink for LogSink<W> {
    fn notify(&self, notification: &Notification) -> Result<(), SinkError> {
        let mut guard = self
            .writer
            .lock()
            .map_err(|_| SinkError::LogWriteFailed("log writer mutex poisoned".to_string()))?;
        serde_json::to_writer(&mut *guard, notification)
            .map_err(|err| SinkError::LogWriteFailed(err.to_string()))?;
        guard.write_all(b"\n").map_err(|err| SinkError::LogWriteFailed(err.to_string()))?;
        guard.flush().map_err(|err| SinkError::LogWriteFailed(err.to_string()))?;
        drop(guard);
        Ok(())
    }
}
