// crates/dockgate-core/src/runtime/mod.rs
// ============================================================================
// Module: Dockgate Runtime
// Description: Permission storage, authorization, gateway and scheduling.
// Purpose: Orchestrate validated container actions over the core interfaces.
// Dependencies: crate::{core, interfaces}, tokio, tracing
// ============================================================================

//! ## Overview
//! Runtime modules compose the interfaces into the control flow
//! transport -> authorizer -> gateway or scheduler -> runtime client.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod activity;
pub mod authorizer;
pub mod file_store;
pub mod gateway;
pub mod memory;
pub mod permission_store;
pub mod scheduler;
pub mod status;
pub mod worker_pool;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use activity::ActivityLog;
pub use activity::DEFAULT_ACTIVITY_CAPACITY;
pub use authorizer::ActionAuthorizer;
pub use authorizer::AuthzDecision;
pub use authorizer::Caller;
pub use file_store::FilePermissionBackend;
pub use gateway::ActionOutcome;
pub use gateway::AnnounceTemplate;
pub use gateway::ContainerGateway;
pub use gateway::GatewayConfig;
pub use gateway::GatewayError;
pub use gateway::MESSAGE_PLACEHOLDER;
pub use gateway::redact_and_truncate;
pub use gateway::resolve_target;
pub use memory::InMemoryPermissionBackend;
pub use memory::InMemoryRuntimeClient;
pub use memory::RuntimeCall;
pub use permission_store::PermissionError;
pub use permission_store::PermissionStore;
pub use scheduler::ActionScheduler;
pub use scheduler::ScheduleHandle;
pub use scheduler::countdown_message;
pub use scheduler::describe_delay;
pub use status::StatusAggregator;
pub use status::StatusSnapshot;
pub use worker_pool::WorkerError;
pub use worker_pool::WorkerPool;
