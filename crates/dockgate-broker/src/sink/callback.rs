// crates/dockgate-broker/src/sink/callback.rs
// ============================================================================
// Module: Dockgate Callback Sink
// Description: Callback-based sink for synchronous delivery.
// Purpose: Invoke a caller-provided function with each notification.
// Dependencies: dockgate-core, std
// ============================================================================

//! ## Overview
//! [`CallbackSink`] delivers notifications by invoking a user-supplied
//! function. Transports use it to write replies straight back to the
//! originating channel.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use dockgate_core::Notification;
use dockgate_core::NotificationSink;
use dockgate_core::SinkError;

// ============================================================================
// SECTION: Callback Sink
// ============================================================================

/// Callback-based notification sink.
#[derive(Clone)]
pub struct CallbackSink {
    /// Handler invoked with each notification.
    handler: Arc<CallbackHandler>,
}

/// Callback handler signature used by the sink.
type CallbackHandler = dyn Fn(&Notification) -> Result<(), SinkError> + Send + Sync;

impl CallbackSink {
    /// Creates a callback sink from a handler function.
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&Notification) -> Result<(), SinkError> + Send + Sync + 'static,
    {
        Self {
            handler: Arc::new(handler),
        }
    }
}

impl NotificationSink for CallbackSink {
    fn notify(&self, notification: &Notification) -> Result<(), SinkError> {
        (self.handler)(notification)
    }
}
