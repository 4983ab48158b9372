// crates/dockgate-config/tests/common/mod.rs
// =============================================================================
// Module: Config Test Helpers
// Description: Shared helpers for config validation tests.
// Purpose: Reduce duplication across integration tests for dockgate-config.
// =============================================================================

#![allow(dead_code, reason = "Test helpers are selectively used across suites.")]

use std::collections::BTreeMap;

use dockgate_config::ConfigError;
use dockgate_config::DockgateConfig;

/// Result type used by config tests.
pub type TestResult = Result<(), String>;

/// Parses a TOML string into a `DockgateConfig` for tests.
pub fn config_from_toml(toml_str: &str) -> Result<DockgateConfig, String> {
    DockgateConfig::from_toml_str(toml_str).map_err(|err| err.to_string())
}

/// Returns a minimal config with all defaults applied.
pub fn minimal_config() -> Result<DockgateConfig, String> {
    config_from_toml("")
}

/// Builds an override lookup from key/value pairs.
pub fn env_lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: BTreeMap<String, String> =
        pairs.iter().map(|(key, value)| ((*key).to_string(), (*value).to_string())).collect();
    move |key: &str| map.get(key).cloned()
}

/// Asserts a validation result failed with a message containing `needle`.
pub fn assert_invalid(result: Result<(), ConfigError>, needle: &str) -> TestResult {
    match result {
        Err(error) => {
            let message = error.to_string();
            if message.contains(needle) {
                Ok(())
            } else {
                Err(format!("error {message} did not contain {needle}"))
            }
        }
        Ok(()) => Err("expected invalid config".to_string()),
    }
}
