// crates/dockgate-cli/src/lib.rs
// ============================================================================
// Module: Dockgate CLI Library
// Description: Shared helpers for the dockgate binary.
// Purpose: Expose the message catalog and console transport for reuse and tests.
// Dependencies: dockgate-broker, dockgate-server, tokio
// ============================================================================

//! ## Overview
//! The `dockgate` binary routes user-facing strings through [`i18n`] and
//! drives the command router from standard input through [`console`].

pub mod console;
pub mod i18n;

pub use console::ConsoleError;
pub use console::ConsoleTransport;
