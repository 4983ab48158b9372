// crates/dockgate-server/src/lib.rs
// ============================================================================
// Module: Dockgate Server Library
// Description: Command surface, status surface and service wiring.
// Purpose: Expose the control core to operators and monitoring.
// Dependencies: axum, dockgate-core, dockgate-config, dockgate-broker
// ============================================================================

//! ## Overview
//! Dockgate Server turns operator text into authorized container actions and
//! serves a read-only JSON status feed. [`DockgateServer`] builds every core
//! component from a validated [`dockgate_config::DockgateConfig`].
//! Security posture: all operator input and HTTP requests are untrusted;
//! authorization and token checks fail closed and emit audit events.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod audit;
pub mod auth;
pub mod commands;
pub mod router;
pub mod server;
pub mod status;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use audit::AuditEvent;
pub use audit::AuditRecord;
pub use audit::AuditSink;
pub use audit::FileAuditSink;
pub use audit::NoopAuditSink;
pub use audit::ScheduleAuditSink;
pub use audit::StderrAuditSink;
pub use auth::StatusAuth;
pub use auth::StatusAuthError;
pub use auth::TokenSource;
pub use commands::Command;
pub use commands::PermCommand;
pub use commands::parse_command;
pub use router::CommandRequest;
pub use router::CommandRouter;
pub use router::RouterSettings;
pub use server::DockgateServer;
pub use server::ServerError;
pub use server::audit_sink_from_config;
pub use status::StatusState;
pub use status::status_router;
