// crates/dockgate-core/src/core/identifiers.rs
// ============================================================================
// Module: Dockgate Identifiers
// Description: Validated container identifiers and the process allow-list.
// Purpose: Guarantee untrusted container names can never reach a command context.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! A [`ContainerIdentifier`] is constructed once at the transport boundary from
//! raw operator input and is treated as an opaque trusted value afterwards.
//! Validation is allow-list based: only `[A-Za-z0-9_.-]` is accepted, which
//! rejects every shell metacharacter and all whitespace by construction.
//!
//! The [`AllowList`] is the fixed, ordered set of identifiers the process may
//! act upon. It is loaded once from configuration and never mutated.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum identifier length in characters.
pub const MAX_IDENTIFIER_LENGTH: usize = 255;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Validation failures for identifiers and operator-supplied values.
///
/// # Invariants
/// - Messages never echo the rejected input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// No identifier was supplied.
    #[error("identifier is missing")]
    Missing,
    /// The identifier is the empty string.
    #[error("identifier is empty")]
    Empty,
    /// The identifier exceeds [`MAX_IDENTIFIER_LENGTH`].
    #[error("identifier exceeds {max} characters ({length})")]
    TooLong {
        /// Observed length in characters.
        length: usize,
        /// Maximum allowed length.
        max: usize,
    },
    /// The identifier contains a character outside `[A-Za-z0-9_.-]`.
    #[error("identifier contains a disallowed character at position {position}")]
    InvalidCharacter {
        /// Zero-based character position of the first offending character.
        position: usize,
    },
    /// A message was empty after sanitization.
    #[error("message is empty after sanitization")]
    EmptyMessage,
}

// ============================================================================
// SECTION: Container Identifier
// ============================================================================

/// Validated container identifier.
///
/// # Invariants
/// - 1 to [`MAX_IDENTIFIER_LENGTH`] characters, each matching `[A-Za-z0-9_.-]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContainerIdentifier(String);

impl ContainerIdentifier {
    /// Validates raw input into a container identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] when the input is empty, too long, or
    /// contains a character outside the allowed class.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        if raw.is_empty() {
            return Err(ValidationError::Empty);
        }
        let length = raw.chars().count();
        if length > MAX_IDENTIFIER_LENGTH {
            return Err(ValidationError::TooLong {
                length,
                max: MAX_IDENTIFIER_LENGTH,
            });
        }
        if let Some(position) = raw.chars().position(|ch| !is_identifier_char(ch)) {
            return Err(ValidationError::InvalidCharacter {
                position,
            });
        }
        Ok(Self(raw.to_string()))
    }

    /// Validates optional raw input; absent input is rejected.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::Missing`] when `raw` is `None`, otherwise the
    /// same errors as [`ContainerIdentifier::parse`].
    pub fn parse_optional(raw: Option<&str>) -> Result<Self, ValidationError> {
        raw.map_or(Err(ValidationError::Missing), Self::parse)
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Returns true when `ch` belongs to the identifier character class.
#[must_use]
pub const fn is_identifier_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || matches!(ch, '_' | '.' | '-')
}

impl fmt::Display for ContainerIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl AsRef<str> for ContainerIdentifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for ContainerIdentifier {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

impl TryFrom<String> for ContainerIdentifier {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ContainerIdentifier> for String {
    fn from(value: ContainerIdentifier) -> Self {
        value.0
    }
}

// ============================================================================
// SECTION: Allow-List
// ============================================================================

/// Ordered, de-duplicated set of container identifiers the process may control.
///
/// # Invariants
/// - Immutable after construction.
/// - Preserves the configured order; later duplicates are dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AllowList {
    /// Allowed identifiers in configuration order.
    entries: Vec<ContainerIdentifier>,
}

impl AllowList {
    /// Builds an allow-list from validated identifiers.
    pub fn new(entries: impl IntoIterator<Item = ContainerIdentifier>) -> Self {
        let mut unique: Vec<ContainerIdentifier> = Vec::new();
        for entry in entries {
            if !unique.contains(&entry) {
                unique.push(entry);
            }
        }
        Self {
            entries: unique,
        }
    }

    /// Parses raw names into an allow-list, failing on the first invalid name.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] when any entry is not a valid identifier.
    pub fn parse<I, S>(raw: I) -> Result<Self, ValidationError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let parsed = raw
            .into_iter()
            .map(|name| ContainerIdentifier::parse(name.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(parsed))
    }

    /// Returns true when the identifier is allow-listed.
    #[must_use]
    pub fn contains(&self, target: &ContainerIdentifier) -> bool {
        self.entries.contains(target)
    }

    /// Finds the allow-listed identifier matching a raw name exactly.
    #[must_use]
    pub fn lookup(&self, raw: &str) -> Option<&ContainerIdentifier> {
        self.entries.iter().find(|entry| entry.as_str() == raw)
    }

    /// Returns the sole entry when exactly one identifier is configured.
    #[must_use]
    pub fn single(&self) -> Option<&ContainerIdentifier> {
        match self.entries.as_slice() {
            [only] => Some(only),
            _ => None,
        }
    }

    /// Iterates over entries in configuration order.
    pub fn iter(&self) -> impl Iterator<Item = &ContainerIdentifier> {
        self.entries.iter()
    }

    /// Returns the number of allow-listed identifiers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when no identifiers are configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a AllowList {
    type Item = &'a ContainerIdentifier;
    type IntoIter = std::slice::Iter<'a, ContainerIdentifier>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
