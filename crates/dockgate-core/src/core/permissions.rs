// crates/dockgate-core/src/core/permissions.rs
// ============================================================================
// Module: Dockgate Permission Set
// Description: Action to role-name mapping and its persisted document form.
// Purpose: Provide the canonical permission model shared by storage and authz.
// Dependencies: crate::core::action, serde_json
// ============================================================================

//! ## Overview
//! A [`PermissionSet`] maps every [`Action`] to the role names allowed to run
//! it. The persisted form is a JSON object keyed by action label. Keys that do
//! not name a known action are carried through a rewrite untouched so newer
//! documents survive older binaries.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde_json::Map;
use serde_json::Value;
use thiserror::Error;

use crate::core::action::Action;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Permission document decoding failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocumentError {
    /// The document is not valid JSON.
    #[error("permission document is not valid json: {0}")]
    Syntax(String),
    /// The document is not a JSON object.
    #[error("permission document must be a json object")]
    NotAnObject,
    /// A known action key does not hold an array of strings.
    #[error("permission entry for {0} must be an array of strings")]
    InvalidEntry(Action),
}

// ============================================================================
// SECTION: Permission Set
// ============================================================================

/// Mapping from action to allowed role names.
///
/// # Invariants
/// - Role lists never contain duplicates.
/// - Unknown document keys are preserved verbatim in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionSet {
    /// Allowed roles per action, in insertion order.
    roles: BTreeMap<Action, Vec<String>>,
    /// Document keys that do not name a known action.
    extra: Map<String, Value>,
}

impl PermissionSet {
    /// Builds the default set: every action mapped to `default_roles`.
    #[must_use]
    pub fn with_defaults(default_roles: &[String]) -> Self {
        let mut set = Self::default();
        for action in Action::ALL {
            for role in default_roles {
                set.add_role(action, role);
            }
            set.roles.entry(action).or_default();
        }
        set
    }

    /// Returns the roles allowed to run `action`.
    #[must_use]
    pub fn roles(&self, action: Action) -> &[String] {
        self.roles.get(&action).map_or(&[], Vec::as_slice)
    }

    /// Returns true when any of `caller_roles` may run `action`.
    pub fn allows_any<'a>(
        &self,
        action: Action,
        caller_roles: impl IntoIterator<Item = &'a String>,
    ) -> bool {
        let allowed = self.roles(action);
        caller_roles.into_iter().any(|role| allowed.contains(role))
    }

    /// Adds a role; returns false when it was already present.
    pub fn add_role(&mut self, action: Action, role: &str) -> bool {
        let entry = self.roles.entry(action).or_default();
        if entry.iter().any(|existing| existing == role) {
            return false;
        }
        entry.push(role.to_string());
        true
    }

    /// Removes a role; returns false when it was not present.
    pub fn remove_role(&mut self, action: Action, role: &str) -> bool {
        let Some(entry) = self.roles.get_mut(&action) else {
            return false;
        };
        let before = entry.len();
        entry.retain(|existing| existing != role);
        entry.len() != before
    }

    /// Iterates over every action with its roles, in [`Action::ALL`] order.
    pub fn iter(&self) -> impl Iterator<Item = (Action, &[String])> {
        Action::ALL.into_iter().map(|action| (action, self.roles(action)))
    }

    /// Returns a label-keyed copy for display and status output.
    #[must_use]
    pub fn summary(&self) -> BTreeMap<String, Vec<String>> {
        self.iter().map(|(action, roles)| (action.as_str().to_string(), roles.to_vec())).collect()
    }

    /// Decodes a permission document.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError`] when the document is malformed.
    pub fn from_document(document: Value) -> Result<Self, DocumentError> {
        let Value::Object(object) = document else {
            return Err(DocumentError::NotAnObject);
        };
        let mut set = Self::default();
        for (key, value) in object {
            let Ok(action) = Action::parse(&key) else {
                set.extra.insert(key, value);
                continue;
            };
            let Value::Array(items) = value else {
                return Err(DocumentError::InvalidEntry(action));
            };
            set.roles.entry(action).or_default();
            for item in items {
                let Value::String(role) = item else {
                    return Err(DocumentError::InvalidEntry(action));
                };
                set.add_role(action, &role);
            }
        }
        Ok(set)
    }

    /// Encodes the set as a permission document.
    #[must_use]
    pub fn to_document(&self) -> Value {
        let mut object = self.extra.clone();
        for (action, roles) in &self.roles {
            let items = roles.iter().cloned().map(Value::String).collect();
            object.insert(action.as_str().to_string(), Value::Array(items));
        }
        Value::Object(object)
    }

    /// Decodes a permission document from JSON bytes.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError`] when the bytes are not a valid document.
    pub fn from_json_bytes(bytes: &[u8]) -> Result<Self, DocumentError> {
        let document: Value =
            serde_json::from_slice(bytes).map_err(|err| DocumentError::Syntax(err.to_string()))?;
        Self::from_document(document)
    }

    /// Encodes the set as pretty-printed JSON bytes with a trailing newline.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::Syntax`] when serialization fails.
    pub fn to_json_bytes(&self) -> Result<Vec<u8>, DocumentError> {
        let mut bytes = serde_json::to_vec_pretty(&self.to_document())
            .map_err(|err| DocumentError::Syntax(err.to_string()))?;
        bytes.push(b'\n');
        Ok(bytes)
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
