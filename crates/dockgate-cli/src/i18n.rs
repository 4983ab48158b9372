// crates/dockgate-cli/src/i18n.rs
// ============================================================================
// Module: CLI Message Catalog
// Description: Static catalog and substitution for CLI output strings.
// Purpose: Keep every user-facing CLI string in one reviewed place.
// Dependencies: Standard library collections.
// ============================================================================

//! ## Overview
//! All runtime output of the `dockgate` binary goes through the
//! [`t!`](crate::t) macro, which looks up a catalog key and substitutes
//! `{name}` placeholders.
//!
//! ## Invariants
//! - The catalog is built once and read-only thereafter.
//! - Missing keys render as the key itself.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::sync::OnceLock;

// ============================================================================
// SECTION: Types
// ============================================================================

/// A named value captured by the [`macro@crate::t`] macro.
#[derive(Clone)]
pub struct MessageArg {
    /// Placeholder name without braces.
    pub key: &'static str,
    /// Preformatted replacement text.
    pub value: String,
}

impl MessageArg {
    /// Constructs a new [`MessageArg`].
    pub fn new(key: &'static str, value: impl Into<String>) -> Self {
        Self {
            key,
            value: value.into(),
        }
    }
}

// ============================================================================
// SECTION: Catalog
// ============================================================================

/// English catalog entries.
const CATALOG: &[(&str, &str)] = &[
    ("main.version", "dockgate {version}"),
    ("output.stream.stdout", "stdout"),
    ("output.stream.stderr", "stderr"),
    ("output.stream.unknown", "output"),
    ("output.write_failed", "Failed to write to {stream}: {error}"),
    ("config.load_failed", "Failed to load config: {error}"),
    ("config.validate.ok", "Config valid."),
    ("serve.init_failed", "Failed to initialize dockgate: {error}"),
    ("serve.failed", "Status server failed: {error}"),
    ("serve.join_failed", "Status server task failed: {error}"),
    ("serve.console_failed", "Console transport failed: {error}"),
    (
        "serve.nothing_to_serve",
        "Nothing to serve: the status surface is disabled and --console was not given.",
    ),
    ("serve.status.disabled", "Status surface disabled by configuration."),
    ("perm.list.line", "{action}: {roles}"),
    ("perm.add.ok", "Added role {role} to {action}"),
    ("perm.add.unchanged", "Role {role} already granted for {action}"),
    ("perm.remove.ok", "Removed role {role} from {action}"),
    ("perm.remove.unchanged", "Role {role} was not granted for {action}"),
    ("perm.update_failed", "Failed to update permissions: {error}"),
    ("status.serialize_failed", "Failed to render status snapshot: {error}"),
];

/// Returns the catalog map.
fn catalog() -> &'static HashMap<&'static str, &'static str> {
    static CATALOG_MAP: OnceLock<HashMap<&'static str, &'static str>> = OnceLock::new();
    CATALOG_MAP.get_or_init(|| CATALOG.iter().copied().collect())
}

// ============================================================================
// SECTION: Translation
// ============================================================================

/// Renders `key` with `args` substituted.
#[must_use]
pub fn translate(key: &str, args: Vec<MessageArg>) -> String {
    let template = catalog().get(key).copied().unwrap_or(key);
    let mut result = template.to_string();
    for arg in args {
        let placeholder = format!("{{{}}}", arg.key);
        result = result.replace(&placeholder, &arg.value);
    }
    result
}

// ============================================================================
// SECTION: Macro
// ============================================================================

/// Formats a catalog message from a key and named arguments.
#[macro_export]
macro_rules! t {
    ($key:literal $(, $name:ident = $value:expr )* $(,)?) => {{
        let args = ::std::vec![
            $(
                $crate::i18n::MessageArg::new(stringify!($name), $value.to_string()),
            )*
        ];
        $crate::i18n::translate($key, args)
    }};
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test-only catalog assertions."
    )]

    use std::collections::BTreeSet;

    use super::CATALOG;

    #[test]
    fn substitutes_named_placeholders() {
        assert_eq!(
            crate::t!("perm.add.ok", role = "Crew", action = "start"),
            "Added role Crew to start"
        );
    }

    #[test]
    fn missing_key_renders_key() {
        assert_eq!(crate::t!("no.such.key"), "no.such.key");
    }

    #[test]
    fn catalog_keys_are_unique() {
        let keys: BTreeSet<&str> = CATALOG.iter().map(|(key, _)| *key).collect();
        assert_eq!(keys.len(), CATALOG.len());
    }
}
