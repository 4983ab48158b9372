// crates/dockgate-server/src/server.rs
// ============================================================================
// Module: Dockgate Server
// Description: Wires configuration into the control core and its surfaces.
// Purpose: Build the command router and serve the HTTP status surface.
// Dependencies: axum, dockgate-broker, dockgate-config, dockgate-core, dockgate-docker, tokio
// ============================================================================

//! ## Overview
//! [`DockgateServer`] validates a [`DockgateConfig`], builds every core
//! component once and shares it between the command router and the status
//! surface. Transports hand commands to [`DockgateServer::router`] and the
//! status surface is served with [`DockgateServer::serve_status`]. Transports
//! that stop accepting commands await [`DockgateServer::drain_scheduled`] so
//! accepted countdowns still run and report.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use axum::Router;
use dockgate_broker::LogSink;
use dockgate_config::DockgateConfig;
use dockgate_core::ActionScheduler;
use dockgate_core::ActivityLog;
use dockgate_core::Caller;
use dockgate_core::ContainerGateway;
use dockgate_core::FilePermissionBackend;
use dockgate_core::NotificationSink;
use dockgate_core::PermissionStore;
use dockgate_core::RuntimeClient;
use dockgate_core::StatusAggregator;
use dockgate_core::WorkerPool;
use dockgate_docker::DockerCliClient;
use thiserror::Error;
use tracing::info;
use tracing::warn;

use crate::audit::AuditSink;
use crate::audit::FileAuditSink;
use crate::audit::NoopAuditSink;
use crate::audit::StderrAuditSink;
use crate::auth::StatusAuth;
use crate::router::CommandRouter;
use crate::router::RouterSettings;
use crate::status::StatusState;
use crate::status::status_router;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Server bootstrap and transport errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Configuration is invalid.
    #[error("config error: {0}")]
    Config(String),
    /// A component failed to initialize.
    #[error("init error: {0}")]
    Init(String),
    /// The status transport failed.
    #[error("transport error: {0}")]
    Transport(String),
}

// ============================================================================
// SECTION: Server
// ============================================================================

/// Assembled dockgate components.
pub struct DockgateServer {
    /// Validated configuration.
    config: DockgateConfig,
    /// Live permission document.
    store: Arc<PermissionStore>,
    /// Allow-listed container operations.
    gateway: Arc<ContainerGateway>,
    /// Recent activity.
    activity: Arc<ActivityLog>,
    /// Status snapshot producer.
    aggregator: StatusAggregator,
    /// Operator command dispatch.
    router: CommandRouter,
    /// Status surface state.
    status: Arc<StatusState>,
}

impl DockgateServer {
    /// Builds a server that drives the docker CLI.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] when configuration or initialization fails.
    pub fn from_config(config: DockgateConfig) -> Result<Self, ServerError> {
        config.validate().map_err(|err| ServerError::Config(err.to_string()))?;
        let audit = audit_sink_from_config(&config)?;
        let runtime: Arc<dyn RuntimeClient> =
            Arc::new(DockerCliClient::new(&config.runtime.docker_binary));
        Self::with_runtime(config, runtime, audit)
    }

    /// Builds a server over an explicit runtime client and audit sink.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] when configuration or initialization fails.
    pub fn with_runtime(
        config: DockgateConfig,
        runtime: Arc<dyn RuntimeClient>,
        audit: Arc<dyn AuditSink>,
    ) -> Result<Self, ServerError> {
        config.validate().map_err(|err| ServerError::Config(err.to_string()))?;
        let allow_list = config.allow_list().map_err(|err| ServerError::Config(err.to_string()))?;
        if allow_list.is_empty() {
            warn!("no containers are allow-listed; lifecycle commands will be refused");
        }
        let backend = Arc::new(FilePermissionBackend::new(&config.permissions.file));
        let store =
            Arc::new(PermissionStore::new(backend, config.permissions.default_roles.clone()));
        let workers = WorkerPool::new(config.runtime.max_workers);
        let gateway =
            Arc::new(ContainerGateway::new(runtime, allow_list, workers, config.gateway_config()));
        let activity = Arc::new(ActivityLog::new(config.status.max_activity));
        let scheduler =
            ActionScheduler::new(Arc::clone(&gateway), Arc::clone(&activity), config.shutdown_delay());
        let aggregator =
            StatusAggregator::new(Arc::clone(&gateway), Arc::clone(&store), Arc::clone(&activity));
        let settings = RouterSettings {
            prefix: config.commands.prefix.clone(),
            allowed_channels: config.commands.allowed_channels.iter().cloned().collect(),
        };
        let mut router = CommandRouter::new(
            settings,
            Arc::clone(&store),
            Arc::clone(&gateway),
            scheduler,
            Arc::clone(&activity),
            Arc::clone(&audit),
        );
        if let Some(path) = &config.scheduler.notification_log {
            router = router.with_notification_log(notification_log(path)?);
        }
        let status = Arc::new(StatusState {
            aggregator: aggregator.clone(),
            auth: StatusAuth::new(config.status.token.clone(), audit),
        });
        Ok(Self {
            config,
            store,
            gateway,
            activity,
            aggregator,
            router,
            status,
        })
    }

    /// Returns the validated configuration.
    #[must_use]
    pub const fn config(&self) -> &DockgateConfig {
        &self.config
    }

    /// Returns the permission store.
    #[must_use]
    pub fn store(&self) -> Arc<PermissionStore> {
        Arc::clone(&self.store)
    }

    /// Returns the container gateway.
    #[must_use]
    pub fn gateway(&self) -> Arc<ContainerGateway> {
        Arc::clone(&self.gateway)
    }

    /// Returns the activity log.
    #[must_use]
    pub fn activity(&self) -> Arc<ActivityLog> {
        Arc::clone(&self.activity)
    }

    /// Returns the status aggregator.
    #[must_use]
    pub const fn aggregator(&self) -> &StatusAggregator {
        &self.aggregator
    }

    /// Returns the command router.
    #[must_use]
    pub const fn router(&self) -> &CommandRouter {
        &self.router
    }

    /// Waits for every accepted countdown to reach a terminal state.
    pub async fn drain_scheduled(&self) {
        let pending = self.router.scheduler().pending().len();
        if pending > 0 {
            info!(pending, "waiting for scheduled actions to finish");
        }
        self.router.scheduler().drain().await;
    }

    /// Returns the caller identity for the local console transport.
    #[must_use]
    pub fn console_caller(&self) -> Caller {
        let console = &self.config.console;
        Caller::new(console.caller.clone(), console.roles.iter().cloned(), console.administrator)
    }

    /// Returns the status surface router.
    #[must_use]
    pub fn status_app(&self) -> Router {
        status_router(Arc::clone(&self.status))
    }

    /// Serves the status surface on the configured bind address.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] when binding or serving fails.
    pub async fn serve_status(&self) -> Result<(), ServerError> {
        let addr =
            self.config.status.bind_addr().map_err(|err| ServerError::Config(err.to_string()))?;
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|err| ServerError::Transport(format!("status bind failed: {err}")))?;
        info!(addr = %addr, authenticated = !self.status.auth.is_open(), "status surface listening");
        axum::serve(listener, self.status_app().into_make_service_with_connect_info::<SocketAddr>())
            .await
            .map_err(|err| ServerError::Transport(format!("status server failed: {err}")))
    }
}

// ============================================================================
// SECTION: Log Wiring
// ============================================================================

/// Opens the scheduled-action notification log in append mode.
fn notification_log(path: &str) -> Result<Arc<dyn NotificationSink>, ServerError> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|err| ServerError::Init(format!("notification log {path}: {err}")))?;
    Ok(Arc::new(LogSink::new(file)))
}

/// Selects the audit sink described by `[audit]`.
///
/// # Errors
///
/// Returns [`ServerError::Init`] when the audit file cannot be opened.
pub fn audit_sink_from_config(config: &DockgateConfig) -> Result<Arc<dyn AuditSink>, ServerError> {
    if !config.audit.enabled {
        return Ok(Arc::new(NoopAuditSink));
    }
    match &config.audit.path {
        Some(path) => {
            let sink = FileAuditSink::new(Path::new(path))
                .map_err(|err| ServerError::Init(format!("audit log {path}: {err}")))?;
            Ok(Arc::new(sink))
        }
        None => Ok(Arc::new(StderrAuditSink)),
    }
}
