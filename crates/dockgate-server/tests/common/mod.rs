// crates/dockgate-server/tests/common/mod.rs
// ============================================================================
// Module: Common Test Utilities
// Description: Shared fixtures for dockgate-server integration tests.
// Purpose: Wire the router and status surface over in-memory collaborators.
// Dependencies: dockgate-core, dockgate-server, serde_json
// ============================================================================

//! ## Overview
//! Provides recording audit and notification sinks plus a [`RouterFixture`]
//! over the in-memory runtime client and permission backend.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    dead_code,
    reason = "Test-only helpers; not every test binary uses every helper."
)]

use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use dockgate_config::DockgateConfig;
use dockgate_core::ActionScheduler;
use dockgate_core::ActivityLog;
use dockgate_core::AllowList;
use dockgate_core::Caller;
use dockgate_core::ContainerGateway;
use dockgate_core::GatewayConfig;
use dockgate_core::InMemoryPermissionBackend;
use dockgate_core::InMemoryRuntimeClient;
use dockgate_core::Notification;
use dockgate_core::NotificationSink;
use dockgate_core::PermissionStore;
use dockgate_core::SinkError;
use dockgate_core::WorkerPool;
use dockgate_server::AuditRecord;
use dockgate_server::AuditSink;
use dockgate_server::CommandRequest;
use dockgate_server::CommandRouter;
use dockgate_server::DockgateServer;
use dockgate_server::RouterSettings;
use serde_json::Value;
use tempfile::TempDir;

/// Status token used by server fixtures.
pub const STATUS_TOKEN: &str = "status-token-0123456789";

/// Countdown used by router fixtures.
pub const DELAY: Duration = Duration::from_millis(200);

// ============================================================================
// SECTION: Recording Sinks
// ============================================================================

/// Audit sink that keeps serialized records.
#[derive(Default)]
pub struct RecordingAuditSink {
    /// Records in arrival order.
    records: Mutex<Vec<Value>>,
}

impl RecordingAuditSink {
    /// Returns the recorded events.
    pub fn events(&self) -> Vec<Value> {
        self.records.lock().unwrap().clone()
    }

    /// Returns recorded events of one kind.
    pub fn events_of(&self, kind: &str) -> Vec<Value> {
        self.events().into_iter().filter(|event| event["event"] == kind).collect()
    }
}

impl AuditSink for RecordingAuditSink {
    fn record(&self, record: &AuditRecord) {
        self.records.lock().unwrap().push(serde_json::to_value(record).unwrap());
    }
}

/// Notification sink that keeps delivered texts.
#[derive(Default)]
pub struct RecordingSink {
    /// Delivered notifications in order.
    notifications: Mutex<Vec<Notification>>,
}

impl RecordingSink {
    /// Returns the delivered notification texts.
    pub fn texts(&self) -> Vec<String> {
        self.notifications.lock().unwrap().iter().map(|note| note.text.clone()).collect()
    }
}

impl NotificationSink for RecordingSink {
    fn notify(&self, notification: &Notification) -> Result<(), SinkError> {
        self.notifications.lock().unwrap().push(notification.clone());
        Ok(())
    }
}

// ============================================================================
// SECTION: Router Fixture
// ============================================================================

/// Command router over in-memory collaborators.
pub struct RouterFixture {
    /// Runtime fake.
    pub runtime: InMemoryRuntimeClient,
    /// Permission backend fake.
    pub backend: InMemoryPermissionBackend,
    /// Permission store.
    pub store: Arc<PermissionStore>,
    /// Activity log.
    pub activity: Arc<ActivityLog>,
    /// Recorded audit events.
    pub audit: Arc<RecordingAuditSink>,
    /// Router under test.
    pub router: CommandRouter,
}

impl RouterFixture {
    /// Builds a fixture with default settings.
    pub fn new(allowed: &[&str], runtime: InMemoryRuntimeClient) -> Self {
        Self::with_settings(allowed, runtime, RouterSettings::default())
    }

    /// Builds a fixture with explicit router settings.
    pub fn with_settings(
        allowed: &[&str],
        runtime: InMemoryRuntimeClient,
        settings: RouterSettings,
    ) -> Self {
        let backend = InMemoryPermissionBackend::new();
        let store = Arc::new(PermissionStore::new(
            Arc::new(backend.clone()),
            vec!["ServerAdmin".to_string()],
        ));
        let gateway = Arc::new(ContainerGateway::new(
            Arc::new(runtime.clone()),
            AllowList::parse(allowed).unwrap(),
            WorkerPool::new(2),
            GatewayConfig::default(),
        ));
        let activity = Arc::new(ActivityLog::default());
        let scheduler = ActionScheduler::new(Arc::clone(&gateway), Arc::clone(&activity), DELAY);
        let audit = Arc::new(RecordingAuditSink::default());
        let router = CommandRouter::new(
            settings,
            Arc::clone(&store),
            gateway,
            scheduler,
            Arc::clone(&activity),
            audit.clone(),
        );
        Self {
            runtime,
            backend,
            store,
            activity,
            audit,
            router,
        }
    }

    /// Sends `text` as `caller` from the default origin.
    pub async fn send(&self, caller: &Caller, text: &str) -> Vec<String> {
        self.send_with_sink(caller, text, Arc::new(RecordingSink::default())).await
    }

    /// Sends `text` as `caller` and routes scheduled progress to `sink`.
    pub async fn send_with_sink(
        &self,
        caller: &Caller,
        text: &str,
        sink: Arc<RecordingSink>,
    ) -> Vec<String> {
        self.router.handle(&request("general", caller, text), sink).await
    }
}

/// Builds a command request.
pub fn request(origin: &str, caller: &Caller, text: &str) -> CommandRequest {
    CommandRequest {
        origin: origin.to_string(),
        caller: caller.clone(),
        text: text.to_string(),
    }
}

/// Caller holding the default operator role.
pub fn operator() -> Caller {
    Caller::new("alice", ["ServerAdmin"], false)
}

/// Caller with no matching role.
pub fn guest() -> Caller {
    Caller::new("bob", ["Guest"], false)
}

/// Caller with the administrator override.
pub fn administrator() -> Caller {
    Caller::new("root", Vec::<String>::new(), true)
}

// ============================================================================
// SECTION: Server Fixture
// ============================================================================

/// Fully wired server over the in-memory runtime and a temp permission file.
pub struct ServerFixture {
    /// Keeps the permission directory alive.
    pub dir: TempDir,
    /// Runtime fake.
    pub runtime: InMemoryRuntimeClient,
    /// Recorded audit events.
    pub audit: Arc<RecordingAuditSink>,
    /// Server under test.
    pub server: DockgateServer,
}

impl ServerFixture {
    /// Builds a server for `allowed` containers, optionally token-protected.
    pub fn new(allowed: &[&str], runtime: InMemoryRuntimeClient, token: Option<&str>) -> Self {
        let dir = TempDir::new().unwrap();
        let mut config = DockgateConfig::default();
        config.containers.allowed = allowed.iter().map(|name| (*name).to_string()).collect();
        config.permissions.file =
            dir.path().join("permissions.json").to_string_lossy().into_owned();
        config.status.token = token.map(str::to_string);
        let audit = Arc::new(RecordingAuditSink::default());
        let server =
            DockgateServer::with_runtime(config, Arc::new(runtime.clone()), audit.clone()).unwrap();
        Self {
            dir,
            runtime,
            audit,
            server,
        }
    }
}
