// crates/dockgate-docker/src/lib.rs
// ============================================================================
// Module: Dockgate Docker
// Description: Docker CLI runtime client.
// Purpose: Drive container lifecycle and exec through the docker binary.
// Dependencies: dockgate-core, tracing
// ============================================================================

//! ## Overview
//! Implements [`dockgate_core::RuntimeClient`] by invoking the docker CLI with
//! argument vectors. No call ever goes through a shell.

pub mod client;

pub use client::DockerCliClient;
pub use client::DockerCommand;
