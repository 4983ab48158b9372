// crates/dockgate-core/src/lib.rs
// ============================================================================
// Module: Dockgate Core Library
// Description: Public API surface for the Dockgate core.
// Purpose: Expose validated types, collaborator interfaces and orchestration.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! Dockgate core decides whether an operator may act on a container, makes
//! sure untrusted names and messages cannot reach a command context unsafely,
//! and runs countdown-delayed actions without blocking the control surface.
//! It is backend-agnostic: the container runtime, permission persistence and
//! notification delivery are injected through [`interfaces`].

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use core::*;

pub use interfaces::ContainerState;
pub use interfaces::ExecOutput;
pub use interfaces::Notification;
pub use interfaces::NotificationSink;
pub use interfaces::PermissionBackend;
pub use interfaces::RuntimeClient;
pub use interfaces::RuntimeError;
pub use interfaces::SinkError;
pub use interfaces::StoreError;
pub use runtime::ActionAuthorizer;
pub use runtime::ActionOutcome;
pub use runtime::ActionScheduler;
pub use runtime::ActivityLog;
pub use runtime::AnnounceTemplate;
pub use runtime::AuthzDecision;
pub use runtime::Caller;
pub use runtime::ContainerGateway;
pub use runtime::FilePermissionBackend;
pub use runtime::GatewayConfig;
pub use runtime::GatewayError;
pub use runtime::InMemoryPermissionBackend;
pub use runtime::InMemoryRuntimeClient;
pub use runtime::PermissionError;
pub use runtime::PermissionStore;
pub use runtime::ScheduleHandle;
pub use runtime::StatusAggregator;
pub use runtime::StatusSnapshot;
pub use runtime::WorkerPool;
pub use runtime::resolve_target;
