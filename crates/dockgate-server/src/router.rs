// crates/dockgate-server/src/router.rs
// ============================================================================
// Module: Command Router
// Description: Authorizes parsed commands and dispatches them to the core.
// Purpose: Produce operator-facing replies for the chat command surface.
// Dependencies: dockgate-core, dockgate-broker, tracing
// ============================================================================

//! ## Overview
//! [`CommandRouter`] is the single dispatch point for operator commands. Each
//! [`Command`] variant maps to exactly one handler through an exhaustive
//! match. Authorization always runs before target resolution so callers
//! without permission never learn allow-list contents. A missing permission
//! and a target outside the allow-list produce the same reply.
//!
//! Immediate replies are returned in order. Scheduled stop/restart progress
//! after the countdown notice is delivered through the transport's
//! [`NotificationSink`], and every scheduler transition is audited.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::sync::Arc;

use dockgate_broker::FanoutSink;
use dockgate_core::Action;
use dockgate_core::ActionAuthorizer;
use dockgate_core::ActionScheduler;
use dockgate_core::ActivityLog;
use dockgate_core::AuthzDecision;
use dockgate_core::Caller;
use dockgate_core::ContainerGateway;
use dockgate_core::ContainerIdentifier;
use dockgate_core::DelayedAction;
use dockgate_core::GatewayError;
use dockgate_core::Notification;
use dockgate_core::NotificationSink;
use dockgate_core::PermissionError;
use dockgate_core::PermissionStore;
use dockgate_core::ScheduleError;
use dockgate_core::ScheduleState;
use dockgate_core::SinkError;
use dockgate_core::ValidationError;
use dockgate_core::runtime::describe_delay;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::audit::AuditEvent;
use crate::audit::AuditSink;
use crate::audit::ScheduleAuditSink;
use crate::commands::Command;
use crate::commands::PermCommand;
use crate::commands::parse_command;
use crate::commands::split_word;

// ============================================================================
// SECTION: Replies
// ============================================================================

/// Reply for callers who fail authorization or name a target outside the
/// allow-list.
pub const PERMISSION_DENIED: &str = "You do not have permission to use this command.";

/// Reply when no container is configured.
pub const NOT_CONFIGURED: &str = "No container configured";

/// Reply when a target is required but several are configured.
pub const AMBIGUOUS_TARGET: &str =
    "Multiple containers configured; specify one of the allowed containers.";

/// Reply for permission edits naming an unknown action.
pub const UNKNOWN_ACTION: &str = "Unknown action";

/// Reply for bare or incomplete `perm`.
pub const PERM_HELP: &str = "subcommands: add, remove, list";

// ============================================================================
// SECTION: Types
// ============================================================================

/// One operator command as delivered by a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRequest {
    /// Transport origin (channel) identifier.
    pub origin: String,
    /// Caller identity and roles.
    pub caller: Caller,
    /// Raw message text.
    pub text: String,
}

/// Command surface settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouterSettings {
    /// Command prefix.
    pub prefix: String,
    /// Accepted origins; empty accepts every origin.
    pub allowed_channels: BTreeSet<String>,
}

impl Default for RouterSettings {
    fn default() -> Self {
        Self {
            prefix: "!".to_string(),
            allowed_channels: BTreeSet::new(),
        }
    }
}

// ============================================================================
// SECTION: Router
// ============================================================================

/// Dispatches operator commands to the control core.
#[derive(Clone)]
pub struct CommandRouter {
    /// Prefix and origin filter.
    settings: RouterSettings,
    /// Per-action authorizer.
    authorizer: ActionAuthorizer,
    /// Permission document, for `perm` commands.
    store: Arc<PermissionStore>,
    /// Immediate container operations.
    gateway: Arc<ContainerGateway>,
    /// Delayed stop/restart.
    scheduler: ActionScheduler,
    /// Recent activity for the status surface.
    activity: Arc<ActivityLog>,
    /// Security audit destination.
    audit: Arc<dyn AuditSink>,
    /// Optional record of every scheduled-action notification.
    notification_log: Option<Arc<dyn NotificationSink>>,
}

impl CommandRouter {
    /// Creates a router over the shared core components.
    #[must_use]
    pub fn new(
        settings: RouterSettings,
        store: Arc<PermissionStore>,
        gateway: Arc<ContainerGateway>,
        scheduler: ActionScheduler,
        activity: Arc<ActivityLog>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            settings,
            authorizer: ActionAuthorizer::new(Arc::clone(&store)),
            store,
            gateway,
            scheduler,
            activity,
            audit,
            notification_log: None,
        }
    }

    /// Also delivers every scheduled-action notification to `sink`.
    #[must_use]
    pub fn with_notification_log(mut self, sink: Arc<dyn NotificationSink>) -> Self {
        self.notification_log = Some(sink);
        self
    }

    /// Returns the scheduler owning delayed actions.
    #[must_use]
    pub const fn scheduler(&self) -> &ActionScheduler {
        &self.scheduler
    }

    /// Returns the configured command prefix.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.settings.prefix
    }

    /// Handles one command and returns the immediate replies in order.
    ///
    /// Unrecognized text and text from unlisted origins yield no replies.
    pub async fn handle(
        &self,
        request: &CommandRequest,
        sink: Arc<dyn NotificationSink>,
    ) -> Vec<String> {
        if !self.origin_allowed(&request.origin) {
            debug!(origin = %request.origin, "ignoring command from unlisted origin");
            return Vec::new();
        }
        let Some(command) = parse_command(&self.settings.prefix, &request.text) else {
            return Vec::new();
        };
        match command {
            Command::Start {
                target,
            } => self.start(request, target.as_deref()).await,
            Command::Stop {
                target,
            } => self.delayed(request, DelayedAction::Stop, target.as_deref(), sink).await,
            Command::Restart {
                target,
            } => self.delayed(request, DelayedAction::Restart, target.as_deref(), sink).await,
            Command::Status {
                target,
            } => self.status(target.as_deref()).await,
            Command::Announce {
                text,
            } => self.announce(request, &text).await,
            Command::Perm(perm) => vec![self.perm(request, perm).await],
        }
    }

    /// Returns true when commands from `origin` are accepted.
    fn origin_allowed(&self, origin: &str) -> bool {
        self.settings.allowed_channels.is_empty() || self.settings.allowed_channels.contains(origin)
    }

    /// Checks and audits a command authorization.
    async fn authorize(
        &self,
        request: &CommandRequest,
        action: Action,
        target: Option<&str>,
    ) -> bool {
        let decision = self.authorizer.decide_async(action, &request.caller).await;
        self.record_authz(request, action.as_str(), target, decision);
        decision.is_allowed()
    }

    /// Emits a command authorization audit event.
    fn record_authz(
        &self,
        request: &CommandRequest,
        action: &str,
        target: Option<&str>,
        decision: AuthzDecision,
    ) {
        if !decision.is_allowed() {
            info!(caller = %request.caller.id, action, "command denied");
        }
        self.audit.emit(AuditEvent::CommandAuthz {
            origin: request.origin.clone(),
            caller: request.caller.id.clone(),
            action: action.to_string(),
            target: target.map(str::to_string),
            decision,
        });
    }

    /// Handles `start`.
    async fn start(&self, request: &CommandRequest, target: Option<&str>) -> Vec<String> {
        if !self.authorize(request, Action::Start, target).await {
            return vec![PERMISSION_DENIED.to_string()];
        }
        let target = match self.gateway.resolve_target(target) {
            Ok(target) => target,
            Err(err) => return vec![self.describe(&err, true)],
        };
        let mut replies = vec![format!("Starting {target}...")];
        match self.gateway.start(&target).await {
            Ok(outcome) => {
                self.activity.record(format!(
                    "start {target}: {} (by {})",
                    outcome.as_str(),
                    request.caller.id
                ));
                replies.push(outcome.as_str().to_string());
            }
            Err(err) => replies.push(self.describe(&err, true)),
        }
        replies
    }

    /// Handles `stop` and `restart`.
    async fn delayed(
        &self,
        request: &CommandRequest,
        kind: DelayedAction,
        target: Option<&str>,
        sink: Arc<dyn NotificationSink>,
    ) -> Vec<String> {
        if !self.authorize(request, kind.action(), target).await {
            return vec![PERMISSION_DENIED.to_string()];
        }
        let target = match self.gateway.resolve_target(target) {
            Ok(target) => target,
            Err(err) => return vec![self.describe(&err, true)],
        };
        let mut fanout = FanoutSink::default()
            .with(Arc::new(ScheduleAuditSink::new(Arc::clone(&self.audit))));
        if let Some(log) = &self.notification_log {
            fanout = fanout.with(Arc::clone(log));
        }
        let progress: Arc<dyn NotificationSink> = Arc::new(fanout.with(Arc::new(ProgressRelay {
            transport: sink,
        })));
        match self.scheduler.schedule(kind, target.clone(), progress) {
            Ok(handle) => vec![
                format!(
                    "Server {target} will {kind} in {} (countdown started).",
                    describe_delay(self.scheduler.delay())
                ),
                handle.announcement.as_str().to_string(),
            ],
            Err(ScheduleError::NotAllowed) => vec![PERMISSION_DENIED.to_string()],
            Err(err) => {
                warn!(target = %target, error = %err, "failed to schedule countdown");
                vec![format!("error: {err}")]
            }
        }
    }

    /// Handles `status`; open to every caller, as is the status surface.
    async fn status(&self, target: Option<&str>) -> Vec<String> {
        let resolved = self.gateway.resolve_target(target);
        let target = match (target, resolved) {
            (_, Ok(target)) => target,
            (Some(_), Err(_)) => return Vec::new(),
            (None, Err(err)) => return vec![self.describe(&err, false)],
        };
        let state = match self.gateway.status(&target).await {
            Ok(state) => state.to_string(),
            Err(GatewayError::NotFound(_)) => "not found".to_string(),
            Err(err) => {
                warn!(target = %target, error = %err, "status query failed");
                "unknown".to_string()
            }
        };
        vec![format!("Status for {target}: {state}")]
    }

    /// Handles `announce [target] <message>`.
    async fn announce(&self, request: &CommandRequest, text: &str) -> Vec<String> {
        let (first, remainder) = split_word(text);
        let (target, message) = match first {
            Some(word) if self.gateway.allow_list().lookup(word).is_some() => (Some(word), remainder),
            _ => (None, text.trim()),
        };
        if !self.authorize(request, Action::Announce, target).await {
            return vec![PERMISSION_DENIED.to_string()];
        }
        let target = match self.gateway.resolve_target(target) {
            Ok(target) => target,
            Err(err) => return vec![self.describe(&err, true)],
        };
        match self.gateway.announce(&target, message).await {
            Ok(_) => {
                self.activity.record(format!("announce {target} (by {})", request.caller.id));
                vec![format!("Announcement sent to {target}.")]
            }
            Err(err) => vec![self.describe(&err, true)],
        }
    }

    /// Handles `perm`; administrators only.
    async fn perm(&self, request: &CommandRequest, perm: PermCommand) -> String {
        let decision = if request.caller.is_administrator {
            AuthzDecision::AllowedAdministrator
        } else {
            AuthzDecision::Denied
        };
        self.record_authz(request, "perm", None, decision);
        if !decision.is_allowed() {
            return PERMISSION_DENIED.to_string();
        }
        match perm {
            PermCommand::Help => PERM_HELP.to_string(),
            PermCommand::List => self
                .store
                .load_async()
                .await
                .iter()
                .map(|(action, roles)| format!("{action}: {}", roles.join(", ")))
                .collect::<Vec<_>>()
                .join("\n"),
            PermCommand::Add {
                action,
                role,
            } => self.mutate(request, PermOperation::Add, &action, &role).await,
            PermCommand::Remove {
                action,
                role,
            } => self.mutate(request, PermOperation::Remove, &action, &role).await,
        }
    }

    /// Applies and audits a permission edit.
    async fn mutate(
        &self,
        request: &CommandRequest,
        operation: PermOperation,
        action: &str,
        role: &str,
    ) -> String {
        let result = match operation {
            PermOperation::Add => self.store.add_role_async(action, role).await,
            PermOperation::Remove => self.store.remove_role_async(action, role).await,
        };
        let (reply, outcome) = match result {
            Ok(changed) => {
                if changed {
                    self.activity.record(format!(
                        "perm {} {action} {role} (by {})",
                        operation.as_str(),
                        request.caller.id
                    ));
                }
                let reply = match operation {
                    PermOperation::Add => format!("Added role {role} to {action}"),
                    PermOperation::Remove => format!("Removed role {role} from {action}"),
                };
                (reply, if changed { "changed" } else { "unchanged" })
            }
            Err(PermissionError::UnknownAction(_)) => (UNKNOWN_ACTION.to_string(), "unknown_action"),
            Err(PermissionError::InvalidRole) => ("Invalid role name".to_string(), "invalid_role"),
            Err(PermissionError::Io(err)) => {
                warn!(error = %err, "permission update failed");
                (format!("Failed to update permissions: {err}"), "io_error")
            }
        };
        self.audit.emit(AuditEvent::PermissionChange {
            caller: request.caller.id.clone(),
            operation: operation.as_str(),
            action: action.to_string(),
            role: role.to_string(),
            outcome: outcome.to_string(),
        });
        reply
    }

    /// Maps a gateway failure to operator wording.
    fn describe(&self, err: &GatewayError, authorized: bool) -> String {
        match err {
            GatewayError::NotConfigured => NOT_CONFIGURED.to_string(),
            GatewayError::Ambiguous(names) if authorized => {
                let names: Vec<&str> = names.iter().map(ContainerIdentifier::as_str).collect();
                format!("{AMBIGUOUS_TARGET} Allowed: {}", names.join(", "))
            }
            GatewayError::Ambiguous(_) => AMBIGUOUS_TARGET.to_string(),
            GatewayError::Validation(ValidationError::EmptyMessage) => {
                format!("Usage: {}announce [target] <message>", self.settings.prefix)
            }
            GatewayError::NotAllowed | GatewayError::Validation(_) => PERMISSION_DENIED.to_string(),
            GatewayError::NotFound(target) => format!("container {target} not found"),
            GatewayError::Execution {
                ..
            } => format!("error: {err}"),
        }
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Permission edit kind.
#[derive(Debug, Clone, Copy)]
enum PermOperation {
    /// Grant a role.
    Add,
    /// Revoke a role.
    Remove,
}

impl PermOperation {
    /// Returns the audit label.
    const fn as_str(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Remove => "remove",
        }
    }
}

/// Relays scheduler progress past the countdown notice to the transport.
///
/// The countdown notice itself is part of the immediate replies.
struct ProgressRelay {
    /// Transport sink.
    transport: Arc<dyn NotificationSink>,
}

impl NotificationSink for ProgressRelay {
    fn notify(&self, notification: &Notification) -> Result<(), SinkError> {
        if notification.state == ScheduleState::Announced {
            return Ok(());
        }
        self.transport.notify(notification)
    }
}
