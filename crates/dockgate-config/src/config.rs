// crates/dockgate-config/src/config.rs
// ============================================================================
// Module: Dockgate Configuration
// Description: Configuration loading, environment overrides and validation.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: dockgate-core, serde, toml, tracing
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits,
//! then a small set of deployment-sensitive values may be overridden from the
//! environment. Missing or invalid configuration fails closed.
//!
//! Integer overrides that do not parse keep the file value and log a warning.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use dockgate_core::AllowList;
use dockgate_core::AnnounceTemplate;
use dockgate_core::ContainerIdentifier;
use dockgate_core::GatewayConfig;
use dockgate_core::runtime::DEFAULT_ACTIVITY_CAPACITY;
use dockgate_core::runtime::MESSAGE_PLACEHOLDER;
use dockgate_core::runtime::gateway::DEFAULT_MAX_DIAGNOSTIC_CHARS;
use dockgate_core::runtime::permission_store::MAX_ROLE_NAME_LENGTH;
use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "dockgate.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "DOCKGATE_CONFIG";
/// Environment override for the allow-list (comma separated).
pub const ALLOWED_CONTAINERS_ENV_VAR: &str = "DOCKGATE_ALLOWED_CONTAINERS";
/// Environment override for the default roles (comma separated).
pub const DEFAULT_ROLES_ENV_VAR: &str = "DOCKGATE_DEFAULT_ROLES";
/// Environment override for the status token.
pub const STATUS_TOKEN_ENV_VAR: &str = "DOCKGATE_STATUS_TOKEN";
/// Environment override for the countdown length in seconds.
pub const SHUTDOWN_DELAY_ENV_VAR: &str = "DOCKGATE_SHUTDOWN_DELAY_SECS";
/// Environment override for the permission document path.
pub const PERMISSIONS_FILE_ENV_VAR: &str = "DOCKGATE_PERMISSIONS_FILE";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum number of allow-listed containers.
pub(crate) const MAX_ALLOWED_CONTAINERS: usize = 256;
/// Maximum countdown length in seconds.
pub(crate) const MAX_SHUTDOWN_DELAY_SECS: u64 = 86_400;
/// Maximum stop grace period in seconds.
pub(crate) const MAX_STOP_TIMEOUT_SECS: u64 = 3_600;
/// Maximum worker pool size.
pub(crate) const MAX_WORKERS: usize = 32;
/// Minimum status token length.
pub(crate) const MIN_STATUS_TOKEN_LENGTH: usize = 16;
/// Maximum status token length.
pub(crate) const MAX_STATUS_TOKEN_LENGTH: usize = 256;
/// Maximum retained activity entries.
pub(crate) const MAX_ACTIVITY_ENTRIES: usize = 1_000;
/// Maximum command prefix length.
pub(crate) const MAX_PREFIX_LENGTH: usize = 8;

// ============================================================================
// SECTION: Root Config
// ============================================================================

/// Dockgate configuration root.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DockgateConfig {
    /// Allow-listed containers.
    #[serde(default)]
    pub containers: ContainersConfig,
    /// Permission document settings.
    #[serde(default)]
    pub permissions: PermissionsConfig,
    /// Countdown settings.
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    /// Container runtime settings.
    #[serde(default)]
    pub runtime: RuntimeConfig,
    /// In-container announcement settings.
    #[serde(default)]
    pub announce: AnnounceConfig,
    /// Status surface settings.
    #[serde(default)]
    pub status: StatusConfig,
    /// Command surface settings.
    #[serde(default)]
    pub commands: CommandsConfig,
    /// Audit log settings.
    #[serde(default)]
    pub audit: AuditConfig,
    /// Identity used by the stdin console transport.
    #[serde(default)]
    pub console: ConsoleConfig,
}

impl DockgateConfig {
    /// Loads configuration from disk using the default resolution rules and
    /// applies process environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        let mut config = Self::from_toml_str(content)?;
        config.apply_overrides(|key| env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Parses TOML without environment overrides or validation.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the TOML is malformed.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Applies environment overrides read through `lookup`.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(raw) = lookup(ALLOWED_CONTAINERS_ENV_VAR) {
            self.containers.allowed = split_list(&raw);
        }
        if let Some(raw) = lookup(DEFAULT_ROLES_ENV_VAR) {
            self.permissions.default_roles = split_list(&raw);
        }
        if let Some(raw) = lookup(STATUS_TOKEN_ENV_VAR) {
            let token = raw.trim();
            self.status.token = (!token.is_empty()).then(|| token.to_string());
        }
        if let Some(raw) = lookup(SHUTDOWN_DELAY_ENV_VAR) {
            match raw.trim().parse::<u64>() {
                Ok(secs) => self.scheduler.shutdown_delay_secs = secs,
                Err(_) => warn!(
                    variable = SHUTDOWN_DELAY_ENV_VAR,
                    fallback = self.scheduler.shutdown_delay_secs,
                    "ignoring non-integer environment override"
                ),
            }
        }
        if let Some(raw) = lookup(PERMISSIONS_FILE_ENV_VAR) {
            let path = raw.trim();
            if !path.is_empty() {
                self.permissions.file = path.to_string();
            }
        }
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.containers.validate()?;
        self.permissions.validate()?;
        self.scheduler.validate()?;
        self.runtime.validate()?;
        self.announce.validate()?;
        self.status.validate()?;
        self.commands.validate()?;
        self.audit.validate()?;
        self.console.validate()
    }

    /// Builds the process allow-list.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when a name is not a valid identifier.
    pub fn allow_list(&self) -> Result<AllowList, ConfigError> {
        AllowList::parse(&self.containers.allowed)
            .map_err(|err| ConfigError::Invalid(format!("containers.allowed: {err}")))
    }

    /// Builds gateway tuning; the status token is redacted from diagnostics.
    #[must_use]
    pub fn gateway_config(&self) -> GatewayConfig {
        GatewayConfig {
            stop_timeout: Duration::from_secs(self.scheduler.stop_timeout_secs),
            announce: self.announce.template(),
            redactions: self.status.token.iter().cloned().collect(),
            max_diagnostic_chars: DEFAULT_MAX_DIAGNOSTIC_CHARS,
        }
    }

    /// Returns the countdown length.
    #[must_use]
    pub const fn shutdown_delay(&self) -> Duration {
        Duration::from_secs(self.scheduler.shutdown_delay_secs)
    }
}

// ============================================================================
// SECTION: Sections
// ============================================================================

/// `[containers]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContainersConfig {
    /// Container names the process may control.
    #[serde(default)]
    pub allowed: Vec<String>,
}

impl ContainersConfig {
    /// Validates allow-list entries.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.allowed.len() > MAX_ALLOWED_CONTAINERS {
            return Err(ConfigError::Invalid("containers.allowed has too many entries".to_string()));
        }
        let mut seen = BTreeSet::new();
        for name in &self.allowed {
            let id = ContainerIdentifier::parse(name)
                .map_err(|err| ConfigError::Invalid(format!("containers.allowed: {err}")))?;
            if !seen.insert(id) {
                return Err(ConfigError::Invalid(format!(
                    "containers.allowed contains duplicate entry {name}"
                )));
            }
        }
        Ok(())
    }
}

/// `[permissions]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PermissionsConfig {
    /// Permission document path.
    #[serde(default = "default_permissions_file")]
    pub file: String,
    /// Roles granted to every action when the document is (re)created.
    #[serde(default = "default_roles")]
    pub default_roles: Vec<String>,
}

impl Default for PermissionsConfig {
    fn default() -> Self {
        Self {
            file: default_permissions_file(),
            default_roles: default_roles(),
        }
    }
}

impl PermissionsConfig {
    /// Validates the document path and default roles.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_path_string("permissions.file", &self.file)?;
        validate_roles("permissions.default_roles", &self.default_roles)
    }
}

/// `[scheduler]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchedulerConfig {
    /// Countdown before stop and restart, in seconds.
    #[serde(default = "default_shutdown_delay_secs")]
    pub shutdown_delay_secs: u64,
    /// Grace period passed to the runtime on stop and restart, in seconds.
    #[serde(default = "default_stop_timeout_secs")]
    pub stop_timeout_secs: u64,
    /// Optional JSON-lines log of countdown and result notifications.
    #[serde(default)]
    pub notification_log: Option<String>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            shutdown_delay_secs: default_shutdown_delay_secs(),
            stop_timeout_secs: default_stop_timeout_secs(),
            notification_log: None,
        }
    }
}

impl SchedulerConfig {
    /// Validates countdown bounds.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.shutdown_delay_secs > MAX_SHUTDOWN_DELAY_SECS {
            return Err(ConfigError::Invalid(format!(
                "scheduler.shutdown_delay_secs must be at most {MAX_SHUTDOWN_DELAY_SECS}"
            )));
        }
        if self.stop_timeout_secs > MAX_STOP_TIMEOUT_SECS {
            return Err(ConfigError::Invalid(format!(
                "scheduler.stop_timeout_secs must be at most {MAX_STOP_TIMEOUT_SECS}"
            )));
        }
        if let Some(path) = &self.notification_log {
            validate_path_string("scheduler.notification_log", path)?;
        }
        Ok(())
    }
}

/// `[runtime]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuntimeConfig {
    /// Docker CLI binary name or path.
    #[serde(default = "default_docker_binary")]
    pub docker_binary: String,
    /// Maximum concurrent blocking runtime calls.
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            docker_binary: default_docker_binary(),
            max_workers: default_max_workers(),
        }
    }
}

impl RuntimeConfig {
    /// Validates the binary and pool size.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_path_string("runtime.docker_binary", &self.docker_binary)?;
        if !(1 ..= MAX_WORKERS).contains(&self.max_workers) {
            return Err(ConfigError::Invalid(format!(
                "runtime.max_workers must be between 1 and {MAX_WORKERS}"
            )));
        }
        Ok(())
    }
}

/// `[announce]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnnounceConfig {
    /// Argument vector; the sanitized message is appended as one argument.
    #[serde(default = "default_announce_command")]
    pub command: Vec<String>,
    /// Deprecated shell template containing `{message}`; overrides `command`.
    #[serde(default)]
    pub shell_template: Option<String>,
}

impl Default for AnnounceConfig {
    fn default() -> Self {
        Self {
            command: default_announce_command(),
            shell_template: None,
        }
    }
}

impl AnnounceConfig {
    /// Returns the effective announcement template.
    #[must_use]
    pub fn template(&self) -> AnnounceTemplate {
        self.shell_template.as_ref().map_or_else(
            || AnnounceTemplate::Argv(self.command.clone()),
            |template| AnnounceTemplate::ShellTemplate(template.clone()),
        )
    }

    /// Validates the command or template.
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(template) = &self.shell_template {
            if !template.contains(MESSAGE_PLACEHOLDER) {
                return Err(ConfigError::Invalid(format!(
                    "announce.shell_template must contain {MESSAGE_PLACEHOLDER}"
                )));
            }
            warn!("announce.shell_template is deprecated; prefer announce.command");
            return Ok(());
        }
        match self.command.first() {
            Some(program) if !program.trim().is_empty() => Ok(()),
            _ => Err(ConfigError::Invalid("announce.command must name a program".to_string())),
        }
    }
}

/// `[status]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StatusConfig {
    /// Serve the HTTP status surface.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Bind address.
    #[serde(default = "default_status_bind")]
    pub bind: String,
    /// Optional shared-secret token.
    #[serde(default)]
    pub token: Option<String>,
    /// Retained activity entries.
    #[serde(default = "default_max_activity")]
    pub max_activity: usize,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind: default_status_bind(),
            token: None,
            max_activity: default_max_activity(),
        }
    }
}

impl StatusConfig {
    /// Parses the bind address.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the address does not parse.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.bind
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid("status.bind is not a valid socket address".to_string()))
    }

    /// Validates bind, token and activity bounds.
    fn validate(&self) -> Result<(), ConfigError> {
        let addr = self.bind_addr()?;
        if let Some(token) = &self.token {
            let length = token.chars().count();
            if !(MIN_STATUS_TOKEN_LENGTH ..= MAX_STATUS_TOKEN_LENGTH).contains(&length) {
                return Err(ConfigError::Invalid(format!(
                    "status.token must be {MIN_STATUS_TOKEN_LENGTH}-{MAX_STATUS_TOKEN_LENGTH} \
                     characters"
                )));
            }
            if token.chars().any(char::is_whitespace) {
                return Err(ConfigError::Invalid(
                    "status.token must not contain whitespace".to_string(),
                ));
            }
        } else if self.enabled && !addr.ip().is_loopback() {
            return Err(ConfigError::Invalid(
                "non-loopback status bind requires status.token".to_string(),
            ));
        }
        if self.max_activity > MAX_ACTIVITY_ENTRIES {
            return Err(ConfigError::Invalid(format!(
                "status.max_activity must be at most {MAX_ACTIVITY_ENTRIES}"
            )));
        }
        Ok(())
    }
}

/// `[commands]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CommandsConfig {
    /// Prefix that marks a message as a command.
    #[serde(default = "default_prefix")]
    pub prefix: String,
    /// Origins (channels) accepted by the router; empty accepts all.
    #[serde(default)]
    pub allowed_channels: Vec<String>,
}

impl Default for CommandsConfig {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            allowed_channels: Vec::new(),
        }
    }
}

impl CommandsConfig {
    /// Validates the prefix and channel list.
    fn validate(&self) -> Result<(), ConfigError> {
        let length = self.prefix.chars().count();
        if length == 0 || length > MAX_PREFIX_LENGTH || self.prefix.chars().any(char::is_whitespace)
        {
            return Err(ConfigError::Invalid(format!(
                "commands.prefix must be 1-{MAX_PREFIX_LENGTH} non-whitespace characters"
            )));
        }
        if self.allowed_channels.iter().any(|channel| channel.trim().is_empty()) {
            return Err(ConfigError::Invalid(
                "commands.allowed_channels entries must be non-empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// `[audit]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuditConfig {
    /// Enable structured audit logging.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Optional audit log path (JSON lines); stderr when absent.
    #[serde(default)]
    pub path: Option<String>,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: None,
        }
    }
}

impl AuditConfig {
    /// Validates audit configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(path) = &self.path {
            validate_path_string("audit.path", path)?;
        }
        Ok(())
    }
}

/// `[console]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConsoleConfig {
    /// Caller identifier recorded for console commands.
    #[serde(default = "default_console_caller")]
    pub caller: String,
    /// Roles granted to the console operator.
    #[serde(default)]
    pub roles: Vec<String>,
    /// Grant the administrator override to the console operator.
    #[serde(default)]
    pub administrator: bool,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            caller: default_console_caller(),
            roles: Vec::new(),
            administrator: false,
        }
    }
}

impl ConsoleConfig {
    /// Validates console identity.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.caller.trim().is_empty() {
            return Err(ConfigError::Invalid("console.caller must be non-empty".to_string()));
        }
        validate_roles("console.roles", &self.roles)
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Defaults
// ============================================================================

/// Default permission document path.
fn default_permissions_file() -> String {
    "data/permissions.json".to_string()
}

/// Default roles for every action.
fn default_roles() -> Vec<String> {
    vec!["ServerAdmin".to_string()]
}

/// Default countdown in seconds.
const fn default_shutdown_delay_secs() -> u64 {
    300
}

/// Default stop grace period in seconds.
const fn default_stop_timeout_secs() -> u64 {
    10
}

/// Default docker binary.
fn default_docker_binary() -> String {
    "docker".to_string()
}

/// Default worker pool size.
const fn default_max_workers() -> usize {
    2
}

/// Default announcement argument vector.
fn default_announce_command() -> Vec<String> {
    vec!["echo".to_string()]
}

/// Default status bind address.
fn default_status_bind() -> String {
    "127.0.0.1:8000".to_string()
}

/// Default retained activity entries.
const fn default_max_activity() -> usize {
    DEFAULT_ACTIVITY_CAPACITY
}

/// Default command prefix.
fn default_prefix() -> String {
    "!".to_string()
}

/// Default console caller identifier.
fn default_console_caller() -> String {
    "console".to_string()
}

/// Serde default for enabled flags.
const fn default_true() -> bool {
    true
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from CLI or environment defaults.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates the resolved path against security limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    validate_path_string("config path", &path.to_string_lossy())
}

/// Validates a path string against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in Path::new(trimmed).components() {
        if component.as_os_str().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

/// Validates a role list: entries non-blank and bounded.
fn validate_roles(field: &str, roles: &[String]) -> Result<(), ConfigError> {
    for role in roles {
        let length = role.trim().chars().count();
        if length == 0 || length > MAX_ROLE_NAME_LENGTH {
            return Err(ConfigError::Invalid(format!(
                "{field} entries must be 1-{MAX_ROLE_NAME_LENGTH} characters"
            )));
        }
    }
    Ok(())
}

/// Splits a comma list, trimming entries and skipping blanks.
#[must_use]
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',').map(str::trim).filter(|entry| !entry.is_empty()).map(str::to_string).collect()
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
        reason = "Test-only config helper assertions."
    )]

    use super::MAX_PATH_COMPONENT_LENGTH;
    use super::split_list;
    use super::validate_path_string;

    #[test]
    fn split_list_skips_blank_entries() {
        assert_eq!(split_list(" game1, ,game2,,"), vec!["game1".to_string(), "game2".to_string()]);
        assert!(split_list("  ").is_empty());
    }

    #[test]
    fn validate_path_string_rejects_long_component() {
        let long = "a".repeat(MAX_PATH_COMPONENT_LENGTH + 1);
        let err = validate_path_string("permissions.file", &format!("data/{long}")).unwrap_err();
        assert!(err.to_string().contains("component too long"));
    }

    #[test]
    fn validate_path_string_rejects_whitespace_only() {
        assert!(validate_path_string("audit.path", "   ").is_err());
    }
}
