// crates/dockgate-core/src/interfaces/mod.rs
// ============================================================================
// Module: Dockgate Interfaces
// Description: Backend-agnostic seams for persistence, runtime and notification.
// Purpose: Define the collaborator contracts the core orchestrates.
// Dependencies: crate::core, serde, thiserror
// ============================================================================

//! ## Overview
//! The core never talks to a filesystem, a container runtime or a chat
//! transport directly. It drives these traits instead:
//! - [`PermissionBackend`] stores the raw permission document.
//! - [`RuntimeClient`] performs blocking container operations on a validated
//!   [`ContainerIdentifier`].
//! - [`NotificationSink`] receives scheduled-action progress.
//!
//! Implementations are synchronous and must be `Send + Sync`; the core moves
//! blocking calls onto its worker pool.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::ContainerIdentifier;
use crate::core::DelayedAction;
use crate::core::ScheduleId;
use crate::core::ScheduleState;

// ============================================================================
// SECTION: Permission Backend
// ============================================================================

/// Permission persistence errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Backend I/O failure.
    #[error("permission store io error: {0}")]
    Io(String),
    /// Backend reported an error.
    #[error("permission store error: {0}")]
    Store(String),
}

/// Raw storage for the permission document.
pub trait PermissionBackend: Send + Sync {
    /// Reads the current document; `None` when nothing is stored yet.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the backend cannot be read.
    fn read(&self) -> Result<Option<Vec<u8>>, StoreError>;

    /// Replaces the stored document.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the document cannot be written.
    fn write(&self, document: &[u8]) -> Result<(), StoreError>;
}

// ============================================================================
// SECTION: Runtime Client
// ============================================================================

/// Opaque runtime-reported container state (`running`, `exited`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContainerState(String);

impl ContainerState {
    /// Label reported for a running container.
    pub const RUNNING: &'static str = "running";

    /// Wraps a runtime status token.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the status token.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true when the runtime reports the container as running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.0 == Self::RUNNING
    }
}

impl fmt::Display for ContainerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Captured result of a command executed inside a container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecOutput {
    /// Process exit code; `None` when the runtime did not report one.
    pub exit_code: Option<i32>,
    /// Combined stdout and stderr.
    pub output: String,
}

impl ExecOutput {
    /// Returns true when the command exited with status zero.
    #[must_use]
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Runtime client errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    /// The runtime has no container with this identifier.
    #[error("container not found: {0}")]
    NotFound(ContainerIdentifier),
    /// The runtime call failed.
    #[error("runtime call failed: {0}")]
    Failed(String),
}

/// Blocking container runtime operations.
///
/// # Invariants
/// - Callers only pass identifiers that passed validation and the allow-list.
/// - `exec` receives an argument vector; implementations must not join it
///   into a shell string.
pub trait RuntimeClient: Send + Sync {
    /// Reports the container state.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError`] when the container is missing or the call fails.
    fn inspect(&self, target: &ContainerIdentifier) -> Result<ContainerState, RuntimeError>;

    /// Starts the container.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError`] when the call fails.
    fn start(&self, target: &ContainerIdentifier) -> Result<(), RuntimeError>;

    /// Stops the container, killing it after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError`] when the call fails.
    fn stop(&self, target: &ContainerIdentifier, timeout: Duration) -> Result<(), RuntimeError>;

    /// Restarts the container, killing it after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError`] when the call fails.
    fn restart(&self, target: &ContainerIdentifier, timeout: Duration)
    -> Result<(), RuntimeError>;

    /// Executes `argv` inside the container.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError`] when the command cannot be launched.
    fn exec(&self, target: &ContainerIdentifier, argv: &[String])
    -> Result<ExecOutput, RuntimeError>;
}

// ============================================================================
// SECTION: Notification Sink
// ============================================================================

/// Notification sink errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SinkError {
    /// Delivery to the sink target failed.
    #[error("sink delivery failed: {0}")]
    DeliveryFailed(String),
    /// Log sink failed to write.
    #[error("log write failed: {0}")]
    LogWriteFailed(String),
}

/// Scheduled-action progress delivered to the originating transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    /// Scheduled action identifier.
    pub id: ScheduleId,
    /// Target container.
    pub target: ContainerIdentifier,
    /// Delayed action kind.
    pub kind: DelayedAction,
    /// State that was entered.
    pub state: ScheduleState,
    /// Operator-facing text.
    pub text: String,
}

/// Receives scheduled-action notifications.
pub trait NotificationSink: Send + Sync {
    /// Delivers one notification.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError`] when delivery fails.
    fn notify(&self, notification: &Notification) -> Result<(), SinkError>;
}
