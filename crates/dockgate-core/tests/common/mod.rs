// crates/dockgate-core/tests/common/mod.rs
// ============================================================================
// Module: Common Test Utilities
// Description: Shared fixtures for dockgate-core integration tests.
// Purpose: Build gateways, stores and recording sinks over in-memory fakes.
// Dependencies: dockgate-core
// ============================================================================

//! ## Overview
//! Provides a [`Fixture`] wiring the in-memory runtime client and permission
//! backend into the real store, gateway, scheduler and aggregator.

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

use dockgate_core::ActionScheduler;
use dockgate_core::ActivityLog;
use dockgate_core::AllowList;
use dockgate_core::ContainerGateway;
use dockgate_core::ContainerIdentifier;
use dockgate_core::GatewayConfig;
use dockgate_core::InMemoryPermissionBackend;
use dockgate_core::InMemoryRuntimeClient;
use dockgate_core::Notification;
use dockgate_core::NotificationSink;
use dockgate_core::PermissionStore;
use dockgate_core::SinkError;
use dockgate_core::StatusAggregator;
use dockgate_core::WorkerPool;

// ============================================================================
// SECTION: Recording Sink
// ============================================================================

/// Notification sink that keeps every delivered notification.
#[derive(Default)]
pub struct RecordingSink {
    /// Delivered notifications in order.
    pub notifications: Mutex<Vec<Notification>>,
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
// SECTION: Fixture
// ============================================================================

/// Wired core components over in-memory collaborators.
pub struct Fixture {
    /// Runtime fake.
    pub runtime: InMemoryRuntimeClient,
    /// Permission backend fake.
    pub backend: InMemoryPermissionBackend,
    /// Permission store.
    pub store: Arc<PermissionStore>,
    /// Gateway.
    pub gateway: Arc<ContainerGateway>,
    /// Activity log.
    pub activity: Arc<ActivityLog>,
}

impl Fixture {
    /// Builds a fixture for `allowed` containers backed by `runtime`.
    pub fn new(allowed: &[&str], runtime: InMemoryRuntimeClient) -> Self {
        Self::with_config(allowed, runtime, GatewayConfig::default())
    }

    /// Builds a fixture with explicit gateway tuning.
    pub fn with_config(
        allowed: &[&str],
        runtime: InMemoryRuntimeClient,
        config: GatewayConfig,
    ) -> Self {
        let backend = InMemoryPermissionBackend::new();
        let store = Arc::new(PermissionStore::new(
            Arc::new(backend.clone()),
            vec!["ServerAdmin".to_string()],
        ));
        let gateway = Arc::new(ContainerGateway::new(
            Arc::new(runtime.clone()),
            AllowList::parse(allowed).unwrap(),
            WorkerPool::new(4),
            config,
        ));
        Self {
            runtime,
            backend,
            store,
            gateway,
            activity: Arc::new(ActivityLog::default()),
        }
    }

    /// Builds a scheduler with the given countdown.
    pub fn scheduler(&self, delay: Duration) -> ActionScheduler {
        ActionScheduler::new(Arc::clone(&self.gateway), Arc::clone(&self.activity), delay)
    }

    /// Builds a status aggregator.
    pub fn aggregator(&self) -> StatusAggregator {
        StatusAggregator::new(
            Arc::clone(&self.gateway),
            Arc::clone(&self.store),
            Arc::clone(&self.activity),
        )
    }
}

/// Parses an identifier.
pub fn id(raw: &str) -> ContainerIdentifier {
    ContainerIdentifier::parse(raw).unwrap()
}
