// crates/dockgate-cli/src/main.rs
// ============================================================================
// Module: Dockgate CLI Entry Point
// Description: Command dispatcher for serving, permission edits and status.
// Purpose: Provide the operator-facing binary for the dockgate control plane.
// Dependencies: clap, dockgate-config, dockgate-core, dockgate-server, tokio.
// ============================================================================

//! ## Overview
//! `dockgate serve` runs the HTTP status surface and, with `--console`, a
//! stdin command transport. `dockgate perm` edits the permission document
//! offline, `dockgate config validate` checks configuration and
//! `dockgate status` prints one status snapshot. All user-facing strings are
//! routed through the message catalog.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::Once;

use clap::ArgAction;
use clap::Args;
use clap::CommandFactory;
use clap::Parser;
use clap::Subcommand;
use dockgate_cli::ConsoleTransport;
use dockgate_cli::t;
use dockgate_config::DockgateConfig;
use dockgate_core::FilePermissionBackend;
use dockgate_core::PermissionStore;
use dockgate_server::DockgateServer;
use thiserror::Error;
use tokio::io::BufReader;
use tracing::info;
use tracing_subscriber::EnvFilter;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "dockgate", disable_help_subcommand = true, disable_version_flag = true)]
struct Cli {
    /// Print version information and exit.
    #[arg(long = "version", action = ArgAction::SetTrue, global = true)]
    show_version: bool,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve the status surface and optional console transport.
    Serve(ServeCommand),
    /// Permission document utilities.
    Perm {
        /// Selected permission subcommand.
        #[command(subcommand)]
        command: PermCommand,
    },
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
    /// Print one status snapshot as JSON.
    Status(ConfigArgs),
}

/// Shared config location argument.
#[derive(Args, Debug, Clone)]
struct ConfigArgs {
    /// Optional config file path (defaults to dockgate.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// Configuration for the `serve` command.
#[derive(Args, Debug)]
struct ServeCommand {
    /// Config location.
    #[command(flatten)]
    location: ConfigArgs,
    /// Read operator commands from stdin.
    #[arg(long, action = ArgAction::SetTrue)]
    console: bool,
}

/// Permission subcommands.
#[derive(Subcommand, Debug)]
enum PermCommand {
    /// List roles per action.
    List(ConfigArgs),
    /// Grant a role for an action.
    Add(PermEditCommand),
    /// Revoke a role for an action.
    Remove(PermEditCommand),
}

/// Arguments for permission edits.
#[derive(Args, Debug)]
struct PermEditCommand {
    /// Config location.
    #[command(flatten)]
    location: ConfigArgs,
    /// Action name (start, stop, restart, announce).
    action: String,
    /// Role name; remaining words are joined with spaces.
    #[arg(required = true, num_args = 1..)]
    role: Vec<String>,
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Validate a config file.
    Validate(ConfigArgs),
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper for rendered error messages.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`] from a rendered message.
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
async fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    init_tracing();

    if cli.show_version {
        let version = env!("CARGO_PKG_VERSION");
        write_stdout_line(&t!("main.version", version = version))
            .map_err(|err| CliError::new(output_error("stdout", &err)))?;
        return Ok(ExitCode::SUCCESS);
    }

    let Some(command) = cli.command else {
        show_help()?;
        return Ok(ExitCode::SUCCESS);
    };

    match command {
        Commands::Serve(command) => command_serve(command).await,
        Commands::Perm {
            command,
        } => command_perm(command),
        Commands::Config {
            command,
        } => command_config(command),
        Commands::Status(command) => command_status(&command).await,
    }
}

/// Installs the stderr tracing subscriber once.
fn init_tracing() {
    static TRACING_INIT: Once = Once::new();
    TRACING_INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let _ = tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_env_filter(filter)
            .try_init();
    });
}

/// Loads and validates configuration.
fn load_config(location: &ConfigArgs) -> CliResult<DockgateConfig> {
    DockgateConfig::load(location.config.as_deref())
        .map_err(|err| CliError::new(t!("config.load_failed", error = err)))
}

// ============================================================================
// SECTION: Serve Command
// ============================================================================

/// Executes the `serve` command.
async fn command_serve(command: ServeCommand) -> CliResult<ExitCode> {
    let config = load_config(&command.location)?;
    let status_enabled = config.status.enabled;
    if !status_enabled && !command.console {
        return Err(CliError::new(t!("serve.nothing_to_serve")));
    }
    let server = Arc::new(
        DockgateServer::from_config(config)
            .map_err(|err| CliError::new(t!("serve.init_failed", error = err)))?,
    );

    let status_task = if status_enabled {
        let status_server = Arc::clone(&server);
        Some(tokio::spawn(async move { status_server.serve_status().await }))
    } else {
        info!("{}", t!("serve.status.disabled"));
        None
    };

    if command.console {
        let transport = ConsoleTransport::new(
            server.router().clone(),
            server.console_caller(),
            std::io::stdout(),
        );
        transport
            .run(BufReader::new(tokio::io::stdin()))
            .await
            .map_err(|err| CliError::new(t!("serve.console_failed", error = err)))?;
        server.drain_scheduled().await;
    }

    if let Some(task) = status_task {
        task.await
            .map_err(|err| CliError::new(t!("serve.join_failed", error = err)))?
            .map_err(|err| CliError::new(t!("serve.failed", error = err)))?;
    }
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Permission Commands
// ============================================================================

/// Dispatches permission subcommands.
fn command_perm(command: PermCommand) -> CliResult<ExitCode> {
    match command {
        PermCommand::List(location) => command_perm_list(&location),
        PermCommand::Add(command) => command_perm_edit(&command, true),
        PermCommand::Remove(command) => command_perm_edit(&command, false),
    }
}

/// Opens the configured permission store.
fn open_store(location: &ConfigArgs) -> CliResult<PermissionStore> {
    let config = load_config(location)?;
    let backend = Arc::new(FilePermissionBackend::new(&config.permissions.file));
    Ok(PermissionStore::new(backend, config.permissions.default_roles))
}

/// Prints one line per action.
fn command_perm_list(location: &ConfigArgs) -> CliResult<ExitCode> {
    let store = open_store(location)?;
    for (action, roles) in store.list().iter() {
        write_stdout_line(&t!("perm.list.line", action = action, roles = roles.join(", ")))
            .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    }
    Ok(ExitCode::SUCCESS)
}

/// Grants or revokes a role.
fn command_perm_edit(command: &PermEditCommand, grant: bool) -> CliResult<ExitCode> {
    let store = open_store(&command.location)?;
    let role = command.role.join(" ");
    let action = command.action.as_str();
    let result =
        if grant { store.add_role(action, &role) } else { store.remove_role(action, &role) };
    let changed = result.map_err(|err| CliError::new(t!("perm.update_failed", error = err)))?;
    let message = match (grant, changed) {
        (true, true) => t!("perm.add.ok", role = role, action = action),
        (true, false) => t!("perm.add.unchanged", role = role, action = action),
        (false, true) => t!("perm.remove.ok", role = role, action = action),
        (false, false) => t!("perm.remove.unchanged", role = role, action = action),
    };
    write_stdout_line(&message).map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Config and Status Commands
// ============================================================================

/// Dispatches config subcommands.
fn command_config(command: ConfigCommand) -> CliResult<ExitCode> {
    match command {
        ConfigCommand::Validate(location) => command_config_validate(&location),
    }
}

/// Executes the config validation command.
fn command_config_validate(location: &ConfigArgs) -> CliResult<ExitCode> {
    let _config = load_config(location)?;
    write_stdout_line(&t!("config.validate.ok"))
        .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

/// Prints one status snapshot as JSON.
async fn command_status(location: &ConfigArgs) -> CliResult<ExitCode> {
    let config = load_config(location)?;
    let server = DockgateServer::from_config(config)
        .map_err(|err| CliError::new(t!("serve.init_failed", error = err)))?;
    let snapshot = server.aggregator().snapshot().await;
    let rendered = serde_json::to_string_pretty(&snapshot)
        .map_err(|err| CliError::new(t!("status.serialize_failed", error = err)))?;
    write_stdout_line(&rendered).map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Emits the top-level help message for the CLI.
fn show_help() -> CliResult<()> {
    let mut command = Cli::command();
    command.print_help().map_err(|err| CliError::new(output_error("stdout", &err)))?;
    write_stdout_line("").map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(())
}

/// Writes a line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats an output error message.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    let stream_label = match stream {
        "stdout" => t!("output.stream.stdout"),
        "stderr" => t!("output.stream.stderr"),
        _ => t!("output.stream.unknown"),
    };
    t!("output.write_failed", stream = stream_label, error = error)
}

/// Writes an error message and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
