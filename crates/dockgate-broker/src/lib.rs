// crates/dockgate-broker/src/lib.rs
// ============================================================================
// Module: Dockgate Broker Library
// Description: Reference notification sinks for scheduled-action progress.
// Purpose: Deliver countdown and result notices to transports and logs.
// Dependencies: dockgate-core, serde_json, tracing
// ============================================================================

//! ## Overview
//! Dockgate Broker provides ready-made [`dockgate_core::NotificationSink`]
//! implementations plus a fan-out sink that wires several of them together.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod sink;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use sink::CallbackSink;
pub use sink::FanoutSink;
pub use sink::LogSink;
pub use sink::Notification;
pub use sink::NotificationSink;
pub use sink::SinkError;
