// crates/dockgate-core/src/runtime/permission_store.rs
// ============================================================================
// Module: Dockgate Permission Store
// Description: Self-healing load and read-modify-write role mutations.
// Purpose: Keep the persisted permission document the only source of truth.
// Dependencies: crate::{core, interfaces}, tokio, tracing
// ============================================================================

//! ## Overview
//! [`PermissionStore`] re-reads the backend on every call; nothing is cached.
//! A missing, unreadable or corrupt document is replaced with defaults and the
//! defaults are written back. Mutations are serialized inside the process and
//! any write failure is returned to the caller.
//!
//! The `*_async` variants run the same operations on tokio's blocking pool so
//! async callers never perform file I/O on the control loop.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::sync::Mutex;

use thiserror::Error;
use tracing::info;
use tracing::warn;

use crate::core::Action;
use crate::core::PermissionSet;
use crate::core::UnknownActionError;
use crate::interfaces::PermissionBackend;
use crate::interfaces::StoreError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum role name length in characters.
pub const MAX_ROLE_NAME_LENGTH: usize = 100;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Permission mutation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PermissionError {
    /// The action is not part of the closed action set.
    #[error(transparent)]
    UnknownAction(#[from] UnknownActionError),
    /// The role name is blank or too long.
    #[error("invalid role name")]
    InvalidRole,
    /// The updated document could not be persisted.
    #[error(transparent)]
    Io(#[from] StoreError),
}

// ============================================================================
// SECTION: Permission Store
// ============================================================================

/// Persisted permission document with default re-initialization.
pub struct PermissionStore {
    /// Raw document storage.
    backend: Arc<dyn PermissionBackend>,
    /// Roles granted to every action when the document is (re)created.
    default_roles: Vec<String>,
    /// Serializes in-process read-modify-write cycles.
    write_lock: Mutex<()>,
}

impl PermissionStore {
    /// Creates a store over `backend`.
    #[must_use]
    pub fn new(backend: Arc<dyn PermissionBackend>, default_roles: Vec<String>) -> Self {
        Self {
            backend,
            default_roles,
            write_lock: Mutex::new(()),
        }
    }

    /// Returns the configured default roles.
    #[must_use]
    pub fn default_roles(&self) -> &[String] {
        &self.default_roles
    }

    /// Loads the current permission set, healing a missing or corrupt document.
    #[must_use]
    pub fn load(&self) -> PermissionSet {
        let failure = match self.backend.read() {
            Ok(Some(bytes)) => match PermissionSet::from_json_bytes(&bytes) {
                Ok(set) => return set,
                Err(err) => err.to_string(),
            },
            Ok(None) => "permission document absent".to_string(),
            Err(err) => err.to_string(),
        };
        let defaults = PermissionSet::with_defaults(&self.default_roles);
        warn!(reason = %failure, "re-initializing permission document with defaults");
        if let Err(err) = self.persist(&defaults) {
            warn!(error = %err, "failed to persist default permission document");
        }
        defaults
    }

    /// Returns the full current mapping for display.
    #[must_use]
    pub fn list(&self) -> PermissionSet {
        self.load()
    }

    /// Grants `role` the right to run `action`.
    ///
    /// Returns false when the role was already present.
    ///
    /// # Errors
    ///
    /// Returns [`PermissionError`] for unknown actions, invalid roles, or when
    /// the document cannot be written.
    pub fn add_role(&self, action: &str, role: &str) -> Result<bool, PermissionError> {
        self.mutate(action, role, |set, action, role| set.add_role(action, role))
    }

    /// Revokes `role` from `action`; revoking a non-member is a no-op.
    ///
    /// Returns false when the role was not present.
    ///
    /// # Errors
    ///
    /// Returns [`PermissionError`] for unknown actions, invalid roles, or when
    /// the document cannot be written.
    pub fn remove_role(&self, action: &str, role: &str) -> Result<bool, PermissionError> {
        self.mutate(action, role, |set, action, role| set.remove_role(action, role))
    }

    /// Validates inputs and runs one serialized read-modify-write cycle.
    fn mutate(
        &self,
        action: &str,
        role: &str,
        apply: impl FnOnce(&mut PermissionSet, Action, &str) -> bool,
    ) -> Result<bool, PermissionError> {
        let action = Action::parse(action)?;
        let role = validate_role(role)?;
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| StoreError::Store("permission write lock poisoned".to_string()))?;
        let mut set = self.load();
        let changed = apply(&mut set, action, role);
        if changed {
            self.persist(&set)?;
            info!(action = %action, role = %role, "permission document updated");
        }
        Ok(changed)
    }

    /// Writes `set` to the backend.
    fn persist(&self, set: &PermissionSet) -> Result<(), StoreError> {
        let bytes = set.to_json_bytes().map_err(|err| StoreError::Store(err.to_string()))?;
        self.backend.write(&bytes)
    }
}

// ============================================================================
// SECTION: Async Access
// ============================================================================

impl PermissionStore {
    /// Loads the permission set on the blocking pool.
    ///
    /// A failed blocking task yields an empty set, which denies every role.
    pub async fn load_async(self: &Arc<Self>) -> PermissionSet {
        let store = Arc::clone(self);
        match tokio::task::spawn_blocking(move || store.load()).await {
            Ok(set) => set,
            Err(err) => {
                warn!(error = %err, "permission load task failed");
                PermissionSet::default()
            }
        }
    }

    /// Runs [`PermissionStore::add_role`] on the blocking pool.
    ///
    /// # Errors
    ///
    /// Returns [`PermissionError`] as [`PermissionStore::add_role`] does, or
    /// [`PermissionError::Io`] when the blocking task fails.
    pub async fn add_role_async(
        self: &Arc<Self>,
        action: &str,
        role: &str,
    ) -> Result<bool, PermissionError> {
        let (action, role) = (action.to_string(), role.to_string());
        self.off_loop(move |store| store.add_role(&action, &role)).await
    }

    /// Runs [`PermissionStore::remove_role`] on the blocking pool.
    ///
    /// # Errors
    ///
    /// Returns [`PermissionError`] as [`PermissionStore::remove_role`] does, or
    /// [`PermissionError::Io`] when the blocking task fails.
    pub async fn remove_role_async(
        self: &Arc<Self>,
        action: &str,
        role: &str,
    ) -> Result<bool, PermissionError> {
        let (action, role) = (action.to_string(), role.to_string());
        self.off_loop(move |store| store.remove_role(&action, &role)).await
    }

    /// Runs a mutation on the blocking pool.
    async fn off_loop(
        self: &Arc<Self>,
        job: impl FnOnce(&Self) -> Result<bool, PermissionError> + Send + 'static,
    ) -> Result<bool, PermissionError> {
        let store = Arc::clone(self);
        tokio::task::spawn_blocking(move || job(&store))
            .await
            .map_err(|err| StoreError::Store(format!("permission task failed: {err}")))?
    }
}

/// Trims a role name and checks it is non-blank and bounded.
fn validate_role(role: &str) -> Result<&str, PermissionError> {
    let trimmed = role.trim();
    if trimmed.is_empty() || trimmed.chars().count() > MAX_ROLE_NAME_LENGTH {
        return Err(PermissionError::InvalidRole);
    }
    Ok(trimmed)
}
