// crates/dockgate-core/src/core/schedule.rs
// ============================================================================
// Module: Dockgate Schedule Model
// Description: Delayed action kinds and the scheduled-action state machine.
// Purpose: Encode the legal countdown lifecycle as data.
// Dependencies: crate::core::{action, identifiers, sanitize}, serde
// ============================================================================

//! ## Overview
//! A [`ScheduledAction`] moves through
//! `Pending -> Announced -> Executing -> Completed | Failed`. A countdown that
//! is still `Announced` may be replaced by a newer request for the same target,
//! which ends it in `Cancelled`. Terminal states never transition again.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::action::Action;
use crate::core::identifiers::ContainerIdentifier;
use crate::core::sanitize::SanitizedMessage;

// ============================================================================
// SECTION: Delayed Actions
// ============================================================================

/// Actions that run after a countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DelayedAction {
    /// Stop the target.
    Stop,
    /// Restart the target.
    Restart,
}

impl DelayedAction {
    /// Returns the permission-gated action for this kind.
    #[must_use]
    pub const fn action(self) -> Action {
        match self {
            Self::Stop => Action::Stop,
            Self::Restart => Action::Restart,
        }
    }

    /// Returns the stable label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stop => "stop",
            Self::Restart => "restart",
        }
    }

    /// Returns the capitalized label used in operator replies.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Stop => "Stop",
            Self::Restart => "Restart",
        }
    }
}

impl fmt::Display for DelayedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Schedule State
// ============================================================================

/// Lifecycle state of a scheduled action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleState {
    /// Accepted, countdown not yet announced.
    Pending,
    /// Countdown announced, waiting for the delay to elapse.
    Announced,
    /// Runtime call in flight.
    Executing,
    /// Runtime call succeeded.
    Completed,
    /// Runtime call failed.
    Failed,
    /// Replaced by a newer countdown before executing.
    Cancelled,
}

impl ScheduleState {
    /// Returns true for states that never transition again.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    /// Returns true when `next` is a legal successor of `self`.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Announced | Self::Cancelled)
                | (Self::Announced, Self::Executing | Self::Cancelled)
                | (Self::Executing, Self::Completed | Self::Failed)
        )
    }

    /// Returns the stable label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Announced => "announced",
            Self::Executing => "executing",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for ScheduleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Scheduled Action
// ============================================================================

/// Process-unique scheduled action identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScheduleId(u64);

impl ScheduleId {
    /// Wraps a raw identifier.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw identifier.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ScheduleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Schedule state machine errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    /// Illegal lifecycle transition.
    #[error("invalid schedule transition: {from} -> {to}")]
    InvalidTransition {
        /// Current state.
        from: ScheduleState,
        /// Requested state.
        to: ScheduleState,
    },
    /// Target is not allow-listed.
    #[error("target is not allowed")]
    NotAllowed,
    /// No async runtime is available to own the countdown task.
    #[error("no async runtime available for scheduled action")]
    NoRuntime,
}

/// A stop or restart waiting on its countdown.
///
/// # Invariants
/// - `state` only changes through [`ScheduledAction::transition`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledAction {
    /// Identifier assigned by the scheduler.
    pub id: ScheduleId,
    /// Delayed action kind.
    pub kind: DelayedAction,
    /// Target container.
    pub target: ContainerIdentifier,
    /// Countdown length.
    pub delay: Duration,
    /// Countdown text broadcast when announced.
    pub announcement: SanitizedMessage,
    /// Current lifecycle state.
    state: ScheduleState,
}

impl ScheduledAction {
    /// Creates a scheduled action in [`ScheduleState::Pending`].
    #[must_use]
    pub const fn new(
        id: ScheduleId,
        kind: DelayedAction,
        target: ContainerIdentifier,
        delay: Duration,
        announcement: SanitizedMessage,
    ) -> Self {
        Self {
            id,
            kind,
            target,
            delay,
            announcement,
            state: ScheduleState::Pending,
        }
    }

    /// Returns the current state.
    #[must_use]
    pub const fn state(&self) -> ScheduleState {
        self.state
    }

    /// Moves to `next`.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleError::InvalidTransition`] for illegal moves.
    pub const fn transition(&mut self, next: ScheduleState) -> Result<(), ScheduleError> {
        if !self.state.can_transition_to(next) {
            return Err(ScheduleError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        self.state = next;
        Ok(())
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
