// crates/dockgate-server/src/audit.rs
// ============================================================================
// Module: Dockgate Audit Logging
// Description: Structured audit events for security-relevant decisions.
// Purpose: Emit JSON-line audit records without hard pipeline dependencies.
// Dependencies: dockgate-core, serde, serde_json
// ============================================================================

//! ## Overview
//! This module defines audit event payloads and sinks. Events cover command
//! authorization, status surface authentication, permission mutations and
//! scheduled action transitions. Records are serialized as one JSON object
//! per line so deployments can route them to their preferred pipeline.
//!
//! Security posture: status tokens never appear in records; only a SHA-256
//! fingerprint of a presented token is logged.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use dockgate_core::AuthzDecision;
use dockgate_core::ContainerIdentifier;
use dockgate_core::DelayedAction;
use dockgate_core::Notification;
use dockgate_core::NotificationSink;
use dockgate_core::ScheduleId;
use dockgate_core::ScheduleState;
use dockgate_core::SinkError;
use serde::Serialize;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Audit event payloads, tagged by `event`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AuditEvent {
    /// Authorization decision for an operator command.
    CommandAuthz {
        /// Transport origin (channel) of the command.
        origin: String,
        /// Caller identifier reported by the transport.
        caller: String,
        /// Action name checked.
        action: String,
        /// Raw target argument when one was given.
        target: Option<String>,
        /// Decision outcome.
        decision: AuthzDecision,
    },
    /// Status surface authentication decision.
    StatusAuth {
        /// `allow` or `deny`.
        decision: &'static str,
        /// Where the token was presented (`header`, `bearer`, `query`, `open`).
        method: Option<&'static str>,
        /// SHA-256 fingerprint of the presented token.
        token_fingerprint: Option<String>,
        /// Failure reason for deny events.
        reason: Option<String>,
    },
    /// Permission document mutation.
    PermissionChange {
        /// Caller identifier reported by the transport.
        caller: String,
        /// `add` or `remove`.
        operation: &'static str,
        /// Action name as supplied.
        action: String,
        /// Role name as supplied.
        role: String,
        /// `changed`, `unchanged` or the error label.
        outcome: String,
    },
    /// Scheduled action state transition.
    ScheduleTransition {
        /// Scheduled action identifier.
        schedule: ScheduleId,
        /// Target container.
        target: ContainerIdentifier,
        /// Delayed action kind.
        kind: DelayedAction,
        /// State entered.
        state: ScheduleState,
    },
}

/// Timestamped audit record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditRecord {
    /// Record timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Event payload.
    #[serde(flatten)]
    pub event: AuditEvent,
}

impl AuditRecord {
    /// Stamps `event` with the current time.
    #[must_use]
    pub fn now(event: AuditEvent) -> Self {
        let timestamp_ms =
            SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
        Self {
            timestamp_ms,
            event,
        }
    }
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Audit sink for security-relevant events.
pub trait AuditSink: Send + Sync {
    /// Records an audit record.
    fn record(&self, record: &AuditRecord);

    /// Stamps and records `event`.
    fn emit(&self, event: AuditEvent) {
        self.record(&AuditRecord::now(event));
    }
}

/// Audit sink that logs JSON lines to stderr.
pub struct StderrAuditSink;

impl AuditSink for StderrAuditSink {
    fn record(&self, record: &AuditRecord) {
        if let Ok(payload) = serde_json::to_string(record) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }
}

/// Audit sink that appends JSON lines to a file.
pub struct FileAuditSink {
    /// File handle used for append-only logging.
    file: Mutex<std::fs::File>,
}

impl FileAuditSink {
    /// Opens the audit log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl AuditSink for FileAuditSink {
    fn record(&self, record: &AuditRecord) {
        if let Ok(payload) = serde_json::to_string(record)
            && let Ok(mut file) = self.file.lock()
        {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

/// No-op audit sink.
pub struct NoopAuditSink;

impl AuditSink for NoopAuditSink {
    fn record(&self, _record: &AuditRecord) {}
}

// ============================================================================
// SECTION: Schedule Adapter
// ============================================================================

/// Notification sink that turns scheduler progress into audit events.
#[derive(Clone)]
pub struct ScheduleAuditSink {
    /// Destination audit sink.
    audit: Arc<dyn AuditSink>,
}

impl ScheduleAuditSink {
    /// Creates an adapter over `audit`.
    #[must_use]
    pub fn new(audit: Arc<dyn AuditSink>) -> Self {
        Self {
            audit,
        }
    }
}

impl NotificationSink for ScheduleAuditSink {
    fn notify(&self, notification: &Notification) -> Result<(), SinkError> {
        self.audit.emit(AuditEvent::ScheduleTransition {
            schedule: notification.id,
            target: notification.target.clone(),
            kind: notification.kind,
            state: notification.state,
        });
        Ok(())
    }
}
