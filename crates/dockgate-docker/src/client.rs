// crates/dockgate-docker/src/client.rs
// ============================================================================
// Module: Docker CLI Client
// Description: RuntimeClient backed by the docker command-line tool.
// Purpose: Translate runtime operations into docker argument vectors.
// Dependencies: dockgate-core, tracing
// ============================================================================

//! ## Overview
//! [`DockerCliClient`] spawns the configured docker binary once per runtime
//! call. Every invocation is an argument vector built by [`DockerCommand`];
//! the container identifier always follows a `--` separator so it can never
//! be read as an option. Calls block the current thread and are expected to
//! run on the core worker pool.
//!
//! Security posture: identifiers have already passed validation and the
//! allow-list; exec arguments are forwarded verbatim as separate arguments.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::borrow::Cow;
use std::path::Path;
use std::path::PathBuf;
use std::process::Command;
use std::process::Output;
use std::process::Stdio;
use std::time::Duration;

use dockgate_core::ContainerIdentifier;
use dockgate_core::ContainerState;
use dockgate_core::ExecOutput;
use dockgate_core::RuntimeClient;
use dockgate_core::RuntimeError;
use tracing::debug;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Binary used when none is configured.
pub const DEFAULT_DOCKER_BINARY: &str = "docker";

/// Go template printing the container state token.
const STATE_FORMAT: &str = "{{.State.Status}}";

/// Daemon error fragments meaning the container does not exist.
const MISSING_MARKERS: [&str; 2] = ["No such object", "No such container"];

// ============================================================================
// SECTION: Commands
// ============================================================================

/// One docker invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DockerCommand<'a> {
    /// `docker inspect` for the state token.
    Inspect(&'a ContainerIdentifier),
    /// `docker start`.
    Start(&'a ContainerIdentifier),
    /// `docker stop` with a kill timeout.
    Stop(&'a ContainerIdentifier, Duration),
    /// `docker restart` with a kill timeout.
    Restart(&'a ContainerIdentifier, Duration),
    /// `docker exec` of an argument vector.
    Exec(&'a ContainerIdentifier, &'a [String]),
}

impl DockerCommand<'_> {
    /// Returns the docker subcommand name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Inspect(_) => "inspect",
            Self::Start(_) => "start",
            Self::Stop(..) => "stop",
            Self::Restart(..) => "restart",
            Self::Exec(..) => "exec",
        }
    }

    /// Returns the target container.
    #[must_use]
    pub const fn target(&self) -> &ContainerIdentifier {
        match self {
            Self::Inspect(target)
            | Self::Start(target)
            | Self::Stop(target, _)
            | Self::Restart(target, _)
            | Self::Exec(target, _) => target,
        }
    }

    /// Builds the argument vector passed to the docker binary.
    #[must_use]
    pub fn args(&self) -> Vec<String> {
        let mut args = vec![self.name().to_string()];
        match self {
            Self::Inspect(_) => {
                args.extend(["--type", "container", "--format", STATE_FORMAT].map(String::from));
            }
            Self::Stop(_, timeout) | Self::Restart(_, timeout) => {
                args.push("-t".to_string());
                args.push(timeout.as_secs().to_string());
            }
            Self::Start(_) | Self::Exec(..) => {}
        }
        args.push("--".to_string());
        args.push(self.target().as_str().to_string());
        if let Self::Exec(_, argv) = self {
            args.extend(argv.iter().cloned());
        }
        args
    }
}

// ============================================================================
// SECTION: Client
// ============================================================================

/// Runtime client driving the docker CLI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DockerCliClient {
    /// Docker binary name or path.
    binary: PathBuf,
}

impl Default for DockerCliClient {
    fn default() -> Self {
        Self::new(DEFAULT_DOCKER_BINARY)
    }
}

impl DockerCliClient {
    /// Creates a client invoking `binary`.
    #[must_use]
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Returns the configured binary.
    #[must_use]
    pub fn binary(&self) -> &Path {
        &self.binary
    }

    /// Spawns the binary and waits for it to exit.
    fn output(&self, command: &DockerCommand<'_>) -> Result<Output, RuntimeError> {
        debug!(
            binary = %self.binary.display(),
            operation = command.name(),
            target = %command.target(),
            "invoking docker"
        );
        Command::new(&self.binary)
            .args(command.args())
            .stdin(Stdio::null())
            .output()
            .map_err(|err| {
                RuntimeError::Failed(format!("failed to launch {}: {err}", self.binary.display()))
            })
    }

    /// Runs a lifecycle command that must exit with status zero.
    fn run(&self, command: &DockerCommand<'_>) -> Result<Output, RuntimeError> {
        let output = self.output(command)?;
        if output.status.success() {
            Ok(output)
        } else {
            Err(map_failure(command.target(), &output))
        }
    }
}

impl RuntimeClient for DockerCliClient {
    fn inspect(&self, target: &ContainerIdentifier) -> Result<ContainerState, RuntimeError> {
        let output = self.run(&DockerCommand::Inspect(target))?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        let token = stdout.trim();
        if token.is_empty() {
            return Err(RuntimeError::Failed("docker inspect reported no state".to_string()));
        }
        Ok(ContainerState::new(token))
    }

    fn start(&self, target: &ContainerIdentifier) -> Result<(), RuntimeError> {
        self.run(&DockerCommand::Start(target)).map(|_| ())
    }

    fn stop(&self, target: &ContainerIdentifier, timeout: Duration) -> Result<(), RuntimeError> {
        self.run(&DockerCommand::Stop(target, timeout)).map(|_| ())
    }

    fn restart(
        &self,
        target: &ContainerIdentifier,
        timeout: Duration,
    ) -> Result<(), RuntimeError> {
        self.run(&DockerCommand::Restart(target, timeout)).map(|_| ())
    }

    fn exec(
        &self,
        target: &ContainerIdentifier,
        argv: &[String],
    ) -> Result<ExecOutput, RuntimeError> {
        let output = self.output(&DockerCommand::Exec(target, argv))?;
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !output.status.success() && names_missing_container(&stderr, target) {
            return Err(RuntimeError::NotFound(target.clone()));
        }
        Ok(ExecOutput {
            exit_code: output.status.code(),
            output: combine_streams(&String::from_utf8_lossy(&output.stdout), &stderr),
        })
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Maps a failed lifecycle invocation to a runtime error.
fn map_failure(target: &ContainerIdentifier, output: &Output) -> RuntimeError {
    let stderr = String::from_utf8_lossy(&output.stderr);
    if MISSING_MARKERS.iter().any(|marker| stderr.contains(marker)) {
        return RuntimeError::NotFound(target.clone());
    }
    let detail = stderr.trim();
    let message: Cow<'_, str> = if detail.is_empty() {
        match output.status.code() {
            Some(code) => Cow::Owned(format!("docker exited with status {code}")),
            None => Cow::Borrowed("docker terminated by signal"),
        }
    } else {
        Cow::Borrowed(detail)
    };
    RuntimeError::Failed(message.into_owned())
}

/// Returns true when exec stderr is the daemon reporting the target missing.
fn names_missing_container(stderr: &str, target: &ContainerIdentifier) -> bool {
    stderr.contains(&format!("No such container: {target}"))
}

/// Joins stdout and stderr into one diagnostic string.
fn combine_streams(stdout: &str, stderr: &str) -> String {
    match (stdout.trim_end(), stderr.trim_end()) {
        ("", err) => err.to_string(),
        (out, "") => out.to_string(),
        (out, err) => format!("{out}\n{err}"),
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
