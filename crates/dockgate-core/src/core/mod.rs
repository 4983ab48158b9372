// crates/dockgate-core/src/core/mod.rs
// ============================================================================
// Module: Dockgate Core Types
// Description: Identifiers, actions, permissions, sanitized text and schedules.
// Purpose: Provide the pure, validated types every other layer builds on.
// Dependencies: serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! Core types carry no I/O. Anything that crosses the transport boundary is
//! validated into one of these types before it reaches the gateway.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod action;
pub mod identifiers;
pub mod permissions;
pub mod sanitize;
pub mod schedule;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use action::Action;
pub use action::UnknownActionError;
pub use identifiers::AllowList;
pub use identifiers::ContainerIdentifier;
pub use identifiers::MAX_IDENTIFIER_LENGTH;
pub use identifiers::ValidationError;
pub use identifiers::is_identifier_char;
pub use permissions::DocumentError;
pub use permissions::PermissionSet;
pub use sanitize::MAX_MESSAGE_LENGTH;
pub use sanitize::MESSAGE_PUNCTUATION;
pub use sanitize::SanitizedMessage;
pub use sanitize::is_message_char;
pub use sanitize::sanitize_message;
pub use schedule::DelayedAction;
pub use schedule::ScheduleError;
pub use schedule::ScheduleId;
pub use schedule::ScheduleState;
pub use schedule::ScheduledAction;
