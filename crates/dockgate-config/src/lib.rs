// crates/dockgate-config/src/lib.rs
// ============================================================================
// Module: Dockgate Config Library
// Description: Canonical config model, environment overrides and validation.
// Purpose: Single source of truth for dockgate.toml semantics.
// Dependencies: dockgate-core, serde, toml
// ============================================================================

//! ## Overview
//! `dockgate-config` defines the canonical configuration model for Dockgate.
//! It provides strict, fail-closed validation and converts validated settings
//! into the core's allow-list and gateway tuning.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
