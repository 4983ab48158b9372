// crates/dockgate-core/src/core/sanitize.rs
// ============================================================================
// Module: Dockgate Message Sanitizer
// Description: Whitelist scrubbing for free-text operator messages.
// Purpose: Produce messages that cannot alter command argument boundaries.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Free text that ends up inside a container command is reduced to a fixed
//! character class. The pipeline is truncate, filter, trim:
//! 1. keep at most [`MAX_MESSAGE_LENGTH`] characters of the raw input,
//! 2. keep ASCII letters, ASCII digits, space and [`MESSAGE_PUNCTUATION`]
//!    (other whitespace is folded to a space),
//! 3. trim leading and trailing spaces.
//!
//! Sanitization never fails and is idempotent.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Serialize;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum sanitized message length in characters.
pub const MAX_MESSAGE_LENGTH: usize = 100;

/// Punctuation retained by the sanitizer.
pub const MESSAGE_PUNCTUATION: &[char] = &['.', ',', '!', '?', ':', '_', '-'];

// ============================================================================
// SECTION: Sanitized Message
// ============================================================================

/// Message text that passed the whitelist filter.
///
/// # Invariants
/// - At most [`MAX_MESSAGE_LENGTH`] characters.
/// - Every character satisfies [`is_message_char`].
/// - No leading or trailing spaces.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SanitizedMessage(String);

impl SanitizedMessage {
    /// Sanitizes raw text.
    #[must_use]
    pub fn new(raw: &str) -> Self {
        sanitize_message(Some(raw))
    }

    /// Returns the message as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true when nothing survived sanitization.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Consumes the message and returns the inner string.
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for SanitizedMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl AsRef<str> for SanitizedMessage {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// ============================================================================
// SECTION: Sanitizer
// ============================================================================

/// Returns true when `ch` is retained verbatim by the sanitizer.
#[must_use]
pub fn is_message_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == ' ' || MESSAGE_PUNCTUATION.contains(&ch)
}

/// Sanitizes optional raw text; absent or empty input yields an empty message.
#[must_use]
pub fn sanitize_message(raw: Option<&str>) -> SanitizedMessage {
    let Some(raw) = raw else {
        return SanitizedMessage::default();
    };
    let filtered: String = raw
        .chars()
        .take(MAX_MESSAGE_LENGTH)
        .filter_map(|ch| {
            if is_message_char(ch) {
                Some(ch)
            } else if ch.is_whitespace() {
                Some(' ')
            } else {
                None
            }
        })
        .collect();
    SanitizedMessage(filtered.trim_matches(' ').to_string())
}

// ============================================================================
// SECTION: Tests
// ============================================================================
