// crates/dockgate-broker/tests/common/mod.rs
// ============================================================================
// Module: Common Test Utilities
// Description: Shared helpers for dockgate-broker tests.
// Purpose: Provide sample notifications and in-memory writers.
// Dependencies: dockgate-core
// ============================================================================

//! ## Overview
//! Provides shared helper functions and test utilities for broker sinks.

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

use std::io::Write;
use std::sync::Arc;
use std::sync::Mutex;

use dockgate_core::ContainerIdentifier;
use dockgate_core::DelayedAction;
use dockgate_core::Notification;
use dockgate_core::ScheduleId;
use dockgate_core::ScheduleState;

// ============================================================================
// SECTION: Notification Helpers
// ============================================================================

/// Creates a countdown notification for `target`.
pub fn sample_notification(id: u64, target: &str) -> Notification {
    Notification {
        id: ScheduleId::new(id),
        target: ContainerIdentifier::parse(target).expect("valid identifier"),
        kind: DelayedAction::Stop,
        state: ScheduleState::Announced,
        text: "Server will shut down in 5 minutes. Please prepare to log off.".to_string(),
    }
}

// ============================================================================
// SECTION: Shared Buffer for Write Testing
// ============================================================================

/// A thread-safe buffer for testing Write implementations.
#[derive(Clone, Default)]
pub struct SharedBuffer {
    inner: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    /// Creates a new empty shared buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the contents as a string.
    pub fn to_string_lossy(&self) -> String {
        let guard = self.inner.lock().expect("buffer lock");
        String::from_utf8_lossy(&guard).to_string()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.inner.lock().expect("buffer lock").extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

// ============================================================================
// SECTION: Failing Writer for Error Testing
// ============================================================================

/// A writer that always fails, for testing error paths.
pub struct FailingWriter;

impl Write for FailingWriter {
    fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
        Err(std::io::Error::other("simulated write failure"))
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
