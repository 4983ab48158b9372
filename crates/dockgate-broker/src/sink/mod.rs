// crates/dockgate-broker/src/sink/mod.rs
// ============================================================================
// Module: Dockgate Broker Sinks
// Description: Reference sinks and a fan-out composite for notifications.
// Purpose: Deliver scheduled-action progress to concrete destinations.
// Dependencies: dockgate-core, tracing
// ============================================================================

//! ## Overview
//! Sinks receive [`Notification`] values emitted by the action scheduler:
//! the countdown notice when an action is announced and the final result (or
//! replacement notice) when it ends.
//! Invariants:
//! - Sinks never block on the receiving side.
//! - [`FanoutSink`] attempts every member even when one fails.

// ============================================================================
// SECTION: Modules
// ============================================================================

mod callback;
mod log;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

pub use callback::CallbackSink;
pub use dockgate_core::Notification;
pub use dockgate_core::NotificationSink;
pub use dockgate_core::SinkError;
pub use log::LogSink;
use tracing::warn;

// ============================================================================
// SECTION: Fan-out Sink
// ============================================================================

/// Delivers each notification to every member sink in order.
///
/// # Invariants
/// - A failing member does not prevent delivery to later members.
/// - The first failure is returned after all members were attempted.
#[derive(Clone, Default)]
pub struct FanoutSink {
    /// Member sinks.
    sinks: Vec<Arc<dyn NotificationSink>>,
}

impl FanoutSink {
    /// Creates a fan-out over `sinks`.
    #[must_use]
    pub fn new(sinks: Vec<Arc<dyn NotificationSink>>) -> Self {
        Self {
            sinks,
        }
    }

    /// Adds a member sink.
    #[must_use]
    pub fn with(mut self, sink: Arc<dyn NotificationSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Returns the number of member sinks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    /// Returns true when no member sinks are configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl NotificationSink for FanoutSink {
    fn notify(&self, notification: &Notification) -> Result<(), SinkError> {
        let mut first_error = None;
        for sink in &self.sinks {
            if let Err(err) = sink.notify(notification) {
                warn!(schedule = %notification.id, error = %err, "notification sink failed");
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}
