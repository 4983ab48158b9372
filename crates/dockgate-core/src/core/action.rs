// crates/dockgate-core/src/core/action.rs
// ============================================================================
// Module: Dockgate Actions
// Description: Closed set of permission-gated container actions.
// Purpose: Provide the single action enumeration shared by authz and storage.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! [`Action`] is the closed enumeration of role-gated operations. Permission
//! documents, authorization checks, and command dispatch all key on this type,
//! so an action cannot exist in one layer without existing in the others.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Action
// ============================================================================

/// Role-gated container action.
///
/// # Invariants
/// - Variants and labels are stable; they are persisted in permission documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Start a stopped container.
    Start,
    /// Stop a running container after a countdown.
    Stop,
    /// Restart a container after a countdown.
    Restart,
    /// Broadcast a message inside a container.
    Announce,
}

impl Action {
    /// Every action, in display order.
    pub const ALL: [Self; 4] = [Self::Start, Self::Stop, Self::Restart, Self::Announce];

    /// Returns the stable label for the action.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Stop => "stop",
            Self::Restart => "restart",
            Self::Announce => "announce",
        }
    }

    /// Parses a label into an action.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownActionError`] when the label is not a known action.
    pub fn parse(raw: &str) -> Result<Self, UnknownActionError> {
        let label = raw.trim();
        Self::ALL
            .into_iter()
            .find(|action| action.as_str() == label)
            .ok_or_else(|| UnknownActionError(label.to_string()))
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = UnknownActionError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

/// Raised when an action label is outside the closed set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown action: {0}")]
pub struct UnknownActionError(pub String);
