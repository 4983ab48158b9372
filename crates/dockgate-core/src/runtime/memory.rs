// crates/dockgate-core/src/runtime/memory.rs
// ============================================================================
// Module: Dockgate In-Memory Collaborators
// Description: In-memory permission backend and runtime client.
// Purpose: Provide deterministic substitutes for tests and local demos.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! [`InMemoryPermissionBackend`] and [`InMemoryRuntimeClient`] implement the
//! core interfaces without touching the filesystem or a container runtime.
//! Both can be told to fail so error paths are testable. They are not
//! intended for production use.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::time::Duration;

use crate::core::ContainerIdentifier;
use crate::interfaces::ContainerState;
use crate::interfaces::ExecOutput;
use crate::interfaces::PermissionBackend;
use crate::interfaces::RuntimeClient;
use crate::interfaces::RuntimeError;
use crate::interfaces::StoreError;

// ============================================================================
// SECTION: Permission Backend
// ============================================================================

/// In-memory permission document store.
#[derive(Debug, Default, Clone)]
pub struct InMemoryPermissionBackend {
    /// Stored document bytes.
    document: Arc<Mutex<Option<Vec<u8>>>>,
    /// When set, reads fail with an I/O error.
    fail_reads: Arc<AtomicBool>,
    /// When set, writes fail with an I/O error.
    fail_writes: Arc<AtomicBool>,
}

impl InMemoryPermissionBackend {
    /// Creates an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a backend holding `document`.
    #[must_use]
    pub fn with_document(document: impl Into<Vec<u8>>) -> Self {
        Self {
            document: Arc::new(Mutex::new(Some(document.into()))),
            ..Self::default()
        }
    }

    /// Toggles read failures.
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Toggles write failures.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Returns a copy of the stored document.
    #[must_use]
    pub fn snapshot(&self) -> Option<Vec<u8>> {
        self.document.lock().ok().and_then(|guard| guard.clone())
    }
}

impl PermissionBackend for InMemoryPermissionBackend {
    fn read(&self) -> Result<Option<Vec<u8>>, StoreError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Io("simulated read failure".to_string()));
        }
        let guard = self
            .document
            .lock()
            .map_err(|_| StoreError::Store("permission backend mutex poisoned".to_string()))?;
        Ok(guard.clone())
    }

    fn write(&self, document: &[u8]) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Io("simulated write failure".to_string()));
        }
        *self
            .document
            .lock()
            .map_err(|_| StoreError::Store("permission backend mutex poisoned".to_string()))? =
            Some(document.to_vec());
        Ok(())
    }
}

// ============================================================================
// SECTION: Runtime Client
// ============================================================================

/// Runtime call recorded by [`InMemoryRuntimeClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeCall {
    /// `inspect(target)`.
    Inspect(String),
    /// `start(target)`.
    Start(String),
    /// `stop(target, timeout)`.
    Stop(String),
    /// `restart(target, timeout)`.
    Restart(String),
    /// `exec(target, argv)`.
    Exec(String, Vec<String>),
}

/// Shared mutable state behind [`InMemoryRuntimeClient`].
#[derive(Debug)]
struct RuntimeFixture {
    /// Container name to status token.
    containers: BTreeMap<String, String>,
    /// Recorded calls in arrival order.
    calls: Vec<RuntimeCall>,
    /// Result returned from `exec`.
    exec_result: ExecOutput,
    /// Targets whose `inspect` fails.
    failing: BTreeSet<String>,
}

/// In-memory container runtime.
///
/// `start` and `restart` set the status to `running`; `stop` sets `exited`.
/// Unknown names yield [`RuntimeError::NotFound`].
#[derive(Debug, Clone)]
pub struct InMemoryRuntimeClient {
    /// Fixture state.
    state: Arc<Mutex<RuntimeFixture>>,
    /// Artificial blocking latency applied to every call.
    latency: Duration,
}

impl Default for InMemoryRuntimeClient {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryRuntimeClient {
    /// Creates a runtime with no containers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(RuntimeFixture {
                containers: BTreeMap::new(),
                calls: Vec::new(),
                exec_result: ExecOutput {
                    exit_code: Some(0),
                    output: String::new(),
                },
                failing: BTreeSet::new(),
            })),
            latency: Duration::ZERO,
        }
    }

    /// Adds a container with an initial status and returns the runtime.
    #[must_use]
    pub fn with_container(self, name: &str, status: &str) -> Self {
        if let Ok(mut guard) = self.state.lock() {
            guard.containers.insert(name.to_string(), status.to_string());
        }
        self
    }

    /// Applies blocking latency to every call.
    #[must_use]
    pub const fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Sets the result returned by `exec`.
    pub fn set_exec_result(&self, exit_code: Option<i32>, output: &str) {
        if let Ok(mut guard) = self.state.lock() {
            guard.exec_result = ExecOutput {
                exit_code,
                output: output.to_string(),
            };
        }
    }

    /// Makes `inspect` fail for `name`.
    pub fn fail_inspect(&self, name: &str) {
        if let Ok(mut guard) = self.state.lock() {
            guard.failing.insert(name.to_string());
        }
    }

    /// Returns the current status of `name`.
    #[must_use]
    pub fn status_of(&self, name: &str) -> Option<String> {
        self.state.lock().ok().and_then(|guard| guard.containers.get(name).cloned())
    }

    /// Returns every recorded call.
    #[must_use]
    pub fn calls(&self) -> Vec<RuntimeCall> {
        self.state.lock().map(|guard| guard.calls.clone()).unwrap_or_default()
    }

    /// Records `call`, sleeps for the configured latency and runs `apply`.
    fn record<T>(
        &self,
        call: RuntimeCall,
        apply: impl FnOnce(&mut RuntimeFixture) -> Result<T, RuntimeError>,
    ) -> Result<T, RuntimeError> {
        if !self.latency.is_zero() {
            std::thread::sleep(self.latency);
        }
        let mut guard = self
            .state
            .lock()
            .map_err(|_| RuntimeError::Failed("runtime fixture mutex poisoned".to_string()))?;
        guard.calls.push(call);
        apply(&mut guard)
    }
}

/// Sets the status of an existing container or reports it missing.
fn set_status(
    fixture: &mut RuntimeFixture,
    target: &ContainerIdentifier,
    status: &str,
) -> Result<(), RuntimeError> {
    let entry = fixture
        .containers
        .get_mut(target.as_str())
        .ok_or_else(|| RuntimeError::NotFound(target.clone()))?;
    status.clone_into(entry);
    Ok(())
}

impl RuntimeClient for InMemoryRuntimeClient {
    fn inspect(&self, target: &ContainerIdentifier) -> Result<ContainerState, RuntimeError> {
        self.record(RuntimeCall::Inspect(target.to_string()), |fixture| {
            if fixture.failing.contains(target.as_str()) {
                return Err(RuntimeError::Failed("simulated inspect failure".to_string()));
            }
            fixture
                .containers
                .get(target.as_str())
                .map(ContainerState::new)
                .ok_or_else(|| RuntimeError::NotFound(target.clone()))
        })
    }

    fn start(&self, target: &ContainerIdentifier) -> Result<(), RuntimeError> {
        self.record(RuntimeCall::Start(target.to_string()), |fixture| {
            set_status(fixture, target, ContainerState::RUNNING)
        })
    }

    fn stop(&self, target: &ContainerIdentifier, _timeout: Duration) -> Result<(), RuntimeError> {
        self.record(RuntimeCall::Stop(target.to_string()), |fixture| {
            set_status(fixture, target, "exited")
        })
    }

    fn restart(
        &self,
        target: &ContainerIdentifier,
        _timeout: Duration,
    ) -> Result<(), RuntimeError> {
        self.record(RuntimeCall::Restart(target.to_string()), |fixture| {
            set_status(fixture, target, ContainerState::RUNNING)
        })
    }

    fn exec(
        &self,
        target: &ContainerIdentifier,
        argv: &[String],
    ) -> Result<ExecOutput, RuntimeError> {
        self.record(RuntimeCall::Exec(target.to_string(), argv.to_vec()), |fixture| {
            if !fixture.containers.contains_key(target.as_str()) {
                return Err(RuntimeError::NotFound(target.clone()));
            }
            Ok(fixture.exec_result.clone())
        })
    }
}
