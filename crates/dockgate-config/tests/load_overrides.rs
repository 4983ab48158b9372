//! File loading and environment override tests for dockgate-config.
// crates/dockgate-config/tests/load_overrides.rs
// =============================================================================
// Module: Load and Override Tests
// Description: Validate file limits and environment override semantics.
// Purpose: Ensure deployment overrides apply predictably and fail safe.
// =============================================================================

use std::fs;

use common::TestResult;
use common::env_lookup;
use common::minimal_config;
use dockgate_config::DockgateConfig;

mod common;

#[test]
fn load_reads_and_validates_file() -> TestResult {
    let dir = tempfile::tempdir().map_err(|err| err.to_string())?;
    let path = dir.path().join("dockgate.toml");
    fs::write(&path, "[containers]\nallowed = [\"game1\"]\n").map_err(|err| err.to_string())?;
    let config = DockgateConfig::load(Some(&path)).map_err(|err| err.to_string())?;
    if config.containers.allowed.is_empty() {
        return Err("allow-list should be loaded from file".to_string());
    }
    Ok(())
}

#[test]
fn load_rejects_oversized_file() -> TestResult {
    let dir = tempfile::tempdir().map_err(|err| err.to_string())?;
    let path = dir.path().join("dockgate.toml");
    let padding = format!("# {}\n", "x".repeat(1024 * 1024));
    fs::write(&path, padding).map_err(|err| err.to_string())?;
    match DockgateConfig::load(Some(&path)) {
        Err(err) if err.to_string().contains("size limit") => Ok(()),
        Err(err) => Err(format!("unexpected error {err}")),
        Ok(_) => Err("expected size limit failure".to_string()),
    }
}

#[test]
fn load_rejects_non_utf8() -> TestResult {
    let dir = tempfile::tempdir().map_err(|err| err.to_string())?;
    let path = dir.path().join("dockgate.toml");
    fs::write(&path, [0xff, 0xfe, 0x00]).map_err(|err| err.to_string())?;
    match DockgateConfig::load(Some(&path)) {
        Err(err) if err.to_string().contains("utf-8") => Ok(()),
        other => Err(format!("expected utf-8 failure, got ok={}", other.is_ok())),
    }
}

#[test]
fn list_overrides_skip_blank_entries() -> TestResult {
    let mut config = minimal_config()?;
    config.apply_overrides(env_lookup(&[
        ("DOCKGATE_ALLOWED_CONTAINERS", "game1, ,game2,"),
        ("DOCKGATE_DEFAULT_ROLES", "Ops,,Server Admin"),
    ]));
    if config.containers.allowed != vec!["game1".to_string(), "game2".to_string()] {
        return Err("allow-list override not applied".to_string());
    }
    if config.permissions.default_roles != vec!["Ops".to_string(), "Server Admin".to_string()] {
        return Err("default roles override not applied".to_string());
    }
    Ok(())
}

#[test]
fn bad_integer_override_keeps_file_value() -> TestResult {
    let mut config = minimal_config()?;
    config.scheduler.shutdown_delay_secs = 120;
    config.apply_overrides(env_lookup(&[("DOCKGATE_SHUTDOWN_DELAY_SECS", "five minutes")]));
    if config.scheduler.shutdown_delay_secs != 120 {
        return Err("invalid integer override must fall back".to_string());
    }
    config.apply_overrides(env_lookup(&[("DOCKGATE_SHUTDOWN_DELAY_SECS", " 60 ")]));
    if config.scheduler.shutdown_delay_secs != 60 {
        return Err("valid integer override must apply".to_string());
    }
    Ok(())
}

#[test]
fn token_and_path_overrides_apply() -> TestResult {
    let mut config = minimal_config()?;
    config.apply_overrides(env_lookup(&[
        ("DOCKGATE_STATUS_TOKEN", "0123456789abcdef"),
        ("DOCKGATE_PERMISSIONS_FILE", "/tmp/perms.json"),
    ]));
    if config.status.token.as_deref() != Some("0123456789abcdef") {
        return Err("token override not applied".to_string());
    }
    if config.permissions.file != "/tmp/perms.json" {
        return Err("permissions file override not applied".to_string());
    }
    config.apply_overrides(env_lookup(&[("DOCKGATE_STATUS_TOKEN", "  ")]));
    if config.status.token.is_some() {
        return Err("blank token override should clear the token".to_string());
    }
    Ok(())
}
