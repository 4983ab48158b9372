// crates/dockgate-core/src/runtime/gateway.rs
// ============================================================================
// Module: Dockgate Container Gateway
// Description: Allow-list enforcement in front of the runtime client.
// Purpose: Run validated, serialized, idempotent container operations.
// Dependencies: crate::{core, interfaces, runtime::worker_pool}, tokio, tracing
// ============================================================================

//! ## Overview
//! [`ContainerGateway`] is the only path from an operator request to the
//! runtime client. Every operation re-checks allow-list membership, runs the
//! blocking client call on the [`WorkerPool`], and holds a per-target lock for
//! state-changing calls so two requests cannot race on one container.
//!
//! Announcements are built from a configured template. The argument-vector
//! form appends the sanitized message as one extra argument. The shell form
//! substitutes the sanitized message into `{message}` and runs it through
//! `/bin/sh -c`; it is kept only for existing deployments.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::debug;

use crate::core::AllowList;
use crate::core::ContainerIdentifier;
use crate::core::SanitizedMessage;
use crate::core::ValidationError;
use crate::interfaces::ContainerState;
use crate::interfaces::ExecOutput;
use crate::interfaces::RuntimeClient;
use crate::interfaces::RuntimeError;
use crate::runtime::worker_pool::WorkerPool;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Placeholder replaced by the sanitized message in shell templates.
pub const MESSAGE_PLACEHOLDER: &str = "{message}";

/// Shell used for the deprecated template form.
const SHELL_PATH: &str = "/bin/sh";

/// Replacement text for redacted secrets in diagnostics.
const REDACTED: &str = "[redacted]";

/// Default cap on diagnostic output length in characters.
pub const DEFAULT_MAX_DIAGNOSTIC_CHARS: usize = 500;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Gateway failures.
///
/// # Invariants
/// - `Execution` output is redacted and truncated before construction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// Malformed identifier or empty message.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// Target is not allow-listed.
    #[error("target is not allowed")]
    NotAllowed,
    /// Target is allowed but absent from the runtime.
    #[error("container not found: {0}")]
    NotFound(ContainerIdentifier),
    /// No target given and several are configured.
    #[error("target is ambiguous")]
    Ambiguous(Vec<ContainerIdentifier>),
    /// No target given and none are configured.
    #[error("no container configured")]
    NotConfigured,
    /// Runtime call failed or exited non-zero.
    #[error("{}", execution_summary(*exit_code, output))]
    Execution {
        /// Exit code when the command ran.
        exit_code: Option<i32>,
        /// Redacted, truncated diagnostic output.
        output: String,
    },
}

/// Formats an execution failure message.
fn execution_summary(exit_code: Option<i32>, output: &str) -> String {
    match (exit_code, output.is_empty()) {
        (Some(code), true) => format!("command exited with status {code}"),
        (Some(code), false) => format!("command exited with status {code}: {output}"),
        (None, true) => "runtime call failed".to_string(),
        (None, false) => format!("runtime call failed: {output}"),
    }
}

// ============================================================================
// SECTION: Outcomes
// ============================================================================

/// Result of a state-changing container operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionOutcome {
    /// The container was started.
    Started,
    /// Start requested but the container was already running.
    AlreadyRunning,
    /// The container was stopped.
    Stopped,
    /// Stop requested but the container was not running.
    NotRunning,
    /// The container was restarted.
    Restarted,
}

impl ActionOutcome {
    /// Returns the operator-facing label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Started => "started",
            Self::AlreadyRunning => "already running",
            Self::Stopped => "stopped",
            Self::NotRunning => "not running",
            Self::Restarted => "restarted",
        }
    }
}

// ============================================================================
// SECTION: Announce Template
// ============================================================================

/// Command template used for in-container announcements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnnounceTemplate {
    /// Argument vector; the message is appended as one argument.
    Argv(Vec<String>),
    /// Deprecated shell string containing [`MESSAGE_PLACEHOLDER`].
    ShellTemplate(String),
}

impl Default for AnnounceTemplate {
    fn default() -> Self {
        Self::Argv(vec!["echo".to_string()])
    }
}

impl AnnounceTemplate {
    /// Builds the argument vector for `message`.
    #[must_use]
    pub fn build(&self, message: &SanitizedMessage) -> Vec<String> {
        match self {
            Self::Argv(argv) => {
                let mut command = argv.clone();
                command.push(message.as_str().to_string());
                command
            }
            Self::ShellTemplate(template) => vec![
                SHELL_PATH.to_string(),
                "-c".to_string(),
                template.replace(MESSAGE_PLACEHOLDER, message.as_str()),
            ],
        }
    }
}

// ============================================================================
// SECTION: Gateway Config
// ============================================================================

/// Gateway tuning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    /// Grace period passed to stop and restart.
    pub stop_timeout: Duration,
    /// Announcement command template.
    pub announce: AnnounceTemplate,
    /// Secret strings scrubbed from diagnostics.
    pub redactions: Vec<String>,
    /// Maximum diagnostic output length in characters.
    pub max_diagnostic_chars: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            stop_timeout: Duration::from_secs(10),
            announce: AnnounceTemplate::default(),
            redactions: Vec::new(),
            max_diagnostic_chars: DEFAULT_MAX_DIAGNOSTIC_CHARS,
        }
    }
}

// ============================================================================
// SECTION: Target Resolution
// ============================================================================

/// Resolves an optional raw name against the allow-list.
///
/// # Errors
///
/// Returns [`GatewayError::Validation`] for malformed names,
/// [`GatewayError::NotAllowed`] for names outside the list,
/// [`GatewayError::Ambiguous`] when no name is given and several are
/// configured, and [`GatewayError::NotConfigured`] when none are.
pub fn resolve_target(
    raw: Option<&str>,
    allow_list: &AllowList,
) -> Result<ContainerIdentifier, GatewayError> {
    match raw {
        Some(raw) => {
            let target = ContainerIdentifier::parse(raw)?;
            if allow_list.contains(&target) {
                Ok(target)
            } else {
                Err(GatewayError::NotAllowed)
            }
        }
        None => {
            if allow_list.is_empty() {
                return Err(GatewayError::NotConfigured);
            }
            allow_list
                .single()
                .cloned()
                .ok_or_else(|| GatewayError::Ambiguous(allow_list.iter().cloned().collect()))
        }
    }
}

// ============================================================================
// SECTION: Gateway
// ============================================================================

/// Allow-list enforcing front for the runtime client.
pub struct ContainerGateway {
    /// Injected runtime client.
    client: Arc<dyn RuntimeClient>,
    /// Targets this process may act upon.
    allow_list: AllowList,
    /// Executor for blocking client calls.
    workers: WorkerPool,
    /// One lock per allow-listed target.
    locks: BTreeMap<ContainerIdentifier, Arc<Mutex<()>>>,
    /// Tuning.
    config: GatewayConfig,
}

impl ContainerGateway {
    /// Creates a gateway.
    #[must_use]
    pub fn new(
        client: Arc<dyn RuntimeClient>,
        allow_list: AllowList,
        workers: WorkerPool,
        config: GatewayConfig,
    ) -> Self {
        let locks = allow_list.iter().map(|target| (target.clone(), Arc::new(Mutex::new(())))).collect();
        Self {
            client,
            allow_list,
            workers,
            locks,
            config,
        }
    }

    /// Returns the allow-list.
    #[must_use]
    pub const fn allow_list(&self) -> &AllowList {
        &self.allow_list
    }

    /// Returns the configured stop and restart grace period.
    #[must_use]
    pub const fn stop_timeout(&self) -> Duration {
        self.config.stop_timeout
    }

    /// Resolves an optional raw name against this gateway's allow-list.
    ///
    /// # Errors
    ///
    /// See [`resolve_target`].
    pub fn resolve_target(&self, raw: Option<&str>) -> Result<ContainerIdentifier, GatewayError> {
        resolve_target(raw, &self.allow_list)
    }

    /// Starts `target`; a running target is left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError`] when the target is not allowed, missing, or
    /// the runtime call fails.
    pub async fn start(&self, target: &ContainerIdentifier) -> Result<ActionOutcome, GatewayError> {
        let lock = self.lock_for(target)?;
        let _guard = lock.lock().await;
        let owned = target.clone();
        self.call(move |client| {
            if client.inspect(&owned)?.is_running() {
                return Ok(ActionOutcome::AlreadyRunning);
            }
            client.start(&owned)?;
            Ok(ActionOutcome::Started)
        })
        .await
    }

    /// Stops `target`; a target that is not running is left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError`] when the target is not allowed, missing, or
    /// the runtime call fails.
    pub async fn stop(
        &self,
        target: &ContainerIdentifier,
        timeout: Duration,
    ) -> Result<ActionOutcome, GatewayError> {
        let lock = self.lock_for(target)?;
        let _guard = lock.lock().await;
        let owned = target.clone();
        self.call(move |client| {
            if !client.inspect(&owned)?.is_running() {
                return Ok(ActionOutcome::NotRunning);
            }
            client.stop(&owned, timeout)?;
            Ok(ActionOutcome::Stopped)
        })
        .await
    }

    /// Restarts `target` regardless of its current state.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError`] when the target is not allowed, missing, or
    /// the runtime call fails.
    pub async fn restart(
        &self,
        target: &ContainerIdentifier,
        timeout: Duration,
    ) -> Result<ActionOutcome, GatewayError> {
        let lock = self.lock_for(target)?;
        let _guard = lock.lock().await;
        let owned = target.clone();
        self.call(move |client| {
            client.inspect(&owned)?;
            client.restart(&owned, timeout)?;
            Ok(ActionOutcome::Restarted)
        })
        .await
    }

    /// Reports the runtime status of `target`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::NotFound`] when the runtime has no such
    /// container, or another [`GatewayError`] when the call fails.
    pub async fn status(&self, target: &ContainerIdentifier) -> Result<ContainerState, GatewayError> {
        self.ensure_allowed(target)?;
        let owned = target.clone();
        self.call(move |client| client.inspect(&owned)).await
    }

    /// Sanitizes `raw` and broadcasts it inside `target`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Validation`] when nothing survives
    /// sanitization and [`GatewayError::Execution`] on a non-zero exit.
    pub async fn announce(
        &self,
        target: &ContainerIdentifier,
        raw: &str,
    ) -> Result<ExecOutput, GatewayError> {
        self.announce_sanitized(target, &SanitizedMessage::new(raw)).await
    }

    /// Broadcasts an already sanitized message inside `target`.
    ///
    /// # Errors
    ///
    /// Same as [`ContainerGateway::announce`].
    pub async fn announce_sanitized(
        &self,
        target: &ContainerIdentifier,
        message: &SanitizedMessage,
    ) -> Result<ExecOutput, GatewayError> {
        self.ensure_allowed(target)?;
        if message.is_empty() {
            return Err(ValidationError::EmptyMessage.into());
        }
        let argv = self.config.announce.build(message);
        debug!(target = %target, args = argv.len(), "executing announcement");
        let owned = target.clone();
        let output = self.call(move |client| client.exec(&owned, &argv)).await?;
        if output.success() {
            return Ok(output);
        }
        Err(GatewayError::Execution {
            exit_code: output.exit_code,
            output: self.diagnostic(&output.output),
        })
    }

    /// Re-checks allow-list membership.
    fn ensure_allowed(&self, target: &ContainerIdentifier) -> Result<(), GatewayError> {
        if self.allow_list.contains(target) { Ok(()) } else { Err(GatewayError::NotAllowed) }
    }

    /// Returns the per-target lock, which also proves membership.
    fn lock_for(&self, target: &ContainerIdentifier) -> Result<Arc<Mutex<()>>, GatewayError> {
        self.locks.get(target).cloned().ok_or(GatewayError::NotAllowed)
    }

    /// Runs a client job on the worker pool and maps its errors.
    async fn call<T, F>(&self, job: F) -> Result<T, GatewayError>
    where
        F: FnOnce(&dyn RuntimeClient) -> Result<T, RuntimeError> + Send + 'static,
        T: Send + 'static,
    {
        let client = Arc::clone(&self.client);
        let result = self.workers.run(move || job(client.as_ref())).await.map_err(|err| {
            GatewayError::Execution {
                exit_code: None,
                output: err.to_string(),
            }
        })?;
        result.map_err(|err| match err {
            RuntimeError::NotFound(target) => GatewayError::NotFound(target),
            RuntimeError::Failed(message) => GatewayError::Execution {
                exit_code: None,
                output: self.diagnostic(&message),
            },
        })
    }

    /// Redacts configured secrets and truncates diagnostic text.
    fn diagnostic(&self, raw: &str) -> String {
        redact_and_truncate(raw, &self.config.redactions, self.config.max_diagnostic_chars)
    }
}

/// Replaces every non-empty secret with a marker, then truncates.
#[must_use]
pub fn redact_and_truncate(raw: &str, secrets: &[String], max_chars: usize) -> String {
    let mut text = raw.trim().to_string();
    for secret in secrets.iter().filter(|secret| !secret.is_empty()) {
        text = text.replace(secret.as_str(), REDACTED);
    }
    if text.chars().count() > max_chars {
        let mut truncated: String = text.chars().take(max_chars).collect();
        truncated.push_str("...");
        return truncated;
    }
    text
}
