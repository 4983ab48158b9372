// crates/dockgate-core/src/runtime/authorizer.rs
// ============================================================================
// Module: Dockgate Action Authorizer
// Description: Role and administrator checks against the live permission set.
// Purpose: Answer "may this caller perform this action" without caching.
// Dependencies: crate::{core, runtime::permission_store}, serde
// ============================================================================

//! ## Overview
//! [`ActionAuthorizer`] composes the [`PermissionStore`] with the caller's role
//! set and administrator flag. The administrator flag overrides everything.
//! Otherwise a caller is allowed when any of its roles appears in the freshly
//! loaded role list for the action. Unknown actions are always denied.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Serialize;

use crate::core::Action;
use crate::core::PermissionSet;
use crate::runtime::permission_store::PermissionStore;

// ============================================================================
// SECTION: Caller
// ============================================================================

/// Identity attributes supplied by the transport.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Caller {
    /// Transport-specific caller identifier, used for audit only.
    pub id: String,
    /// Role names the transport reports for the caller.
    pub roles: BTreeSet<String>,
    /// Transport-level administrator flag.
    pub is_administrator: bool,
}

impl Caller {
    /// Creates a caller with the given roles.
    pub fn new<I, S>(id: impl Into<String>, roles: I, is_administrator: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: id.into(),
            roles: roles.into_iter().map(Into::into).collect(),
            is_administrator,
        }
    }
}

/// Authorization outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthzDecision {
    /// Allowed through the administrator override.
    AllowedAdministrator,
    /// Allowed through a matching role.
    AllowedRole,
    /// Denied.
    Denied,
}

impl AuthzDecision {
    /// Returns true for either allow variant.
    #[must_use]
    pub const fn is_allowed(self) -> bool {
        !matches!(self, Self::Denied)
    }
}

// ============================================================================
// SECTION: Authorizer
// ============================================================================

/// Per-action role authorizer.
#[derive(Clone)]
pub struct ActionAuthorizer {
    /// Permission source re-read on every check.
    store: Arc<PermissionStore>,
}

impl ActionAuthorizer {
    /// Creates an authorizer over `store`.
    #[must_use]
    pub const fn new(store: Arc<PermissionStore>) -> Self {
        Self {
            store,
        }
    }

    /// Returns true when the caller may run the action named `action`.
    #[must_use]
    pub fn is_allowed(
        &self,
        action: &str,
        caller_roles: &BTreeSet<String>,
        is_administrator: bool,
    ) -> bool {
        if is_administrator {
            return true;
        }
        let Ok(action) = Action::parse(action) else {
            return false;
        };
        self.store.load().allows_any(action, caller_roles)
    }

    /// Decides whether `caller` may run `action`.
    #[must_use]
    pub fn decide(&self, action: Action, caller: &Caller) -> AuthzDecision {
        if caller.is_administrator {
            return AuthzDecision::AllowedAdministrator;
        }
        by_role(&self.store.load(), action, caller)
    }

    /// Decides like [`ActionAuthorizer::decide`], reading the permission
    /// document on the blocking pool.
    pub async fn decide_async(&self, action: Action, caller: &Caller) -> AuthzDecision {
        if caller.is_administrator {
            return AuthzDecision::AllowedAdministrator;
        }
        by_role(&self.store.load_async().await, action, caller)
    }
}

/// Role-based decision for a non-administrator.
fn by_role(permissions: &PermissionSet, action: Action, caller: &Caller) -> AuthzDecision {
    if permissions.allows_any(action, &caller.roles) {
        AuthzDecision::AllowedRole
    } else {
        AuthzDecision::Denied
    }
}
