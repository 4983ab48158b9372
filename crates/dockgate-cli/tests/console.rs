// crates/dockgate-cli/tests/console.rs
// ============================================================================
// Module: Console Transport Tests
// Description: Drives the console transport over in-memory input and output.
// Purpose: Ensure replies and scheduled progress reach the console output.
// Dependencies: dockgate-cli, dockgate-config, dockgate-server, tempfile, tokio
// ============================================================================

//! ## Overview
//! Runs [`dockgate_cli::ConsoleTransport`] against a fully wired server over
//! the in-memory runtime client.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::io::Write;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use dockgate_cli::ConsoleTransport;
use dockgate_config::DockgateConfig;
use dockgate_core::InMemoryRuntimeClient;
use dockgate_server::DockgateServer;
use dockgate_server::NoopAuditSink;
use tempfile::TempDir;
use tokio::time::sleep;
use tokio::time::timeout;

/// Clonable in-memory writer.
#[derive(Clone, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    fn lines(&self) -> Vec<String> {
        String::from_utf8(self.0.lock().unwrap().clone())
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

fn server(dir: &TempDir, runtime: &InMemoryRuntimeClient, administrator: bool) -> DockgateServer {
    let mut config = DockgateConfig::default();
    config.containers.allowed = vec!["game1".to_string()];
    config.permissions.file = dir.path().join("permissions.json").to_string_lossy().into_owned();
    config.scheduler.shutdown_delay_secs = 0;
    config.console.roles = vec!["ServerAdmin".to_string()];
    config.console.administrator = administrator;
    DockgateServer::with_runtime(config, Arc::new(runtime.clone()), Arc::new(NoopAuditSink)).unwrap()
}

/// Verifies each non-blank line is one command with ordered replies.
#[tokio::test]
async fn lines_are_commands_from_the_console_caller() {
    let dir = TempDir::new().unwrap();
    let runtime = InMemoryRuntimeClient::new().with_container("game1", "exited");
    let server = server(&dir, &runtime, false);
    let output = SharedBuffer::default();
    let transport =
        ConsoleTransport::new(server.router().clone(), server.console_caller(), output.clone());

    let handled = transport.run(&b"!status\n\n!perm list\n!start\n"[..]).await.unwrap();
    assert_eq!(handled, 3);
    assert_eq!(output.lines(), vec![
        "Status for game1: exited".to_string(),
        "You do not have permission to use this command.".to_string(),
        "Starting game1...".to_string(),
        "started".to_string(),
    ]);
}

/// Verifies scheduled results are written after the immediate replies.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn scheduled_results_reach_the_console() {
    let dir = TempDir::new().unwrap();
    let runtime = InMemoryRuntimeClient::new().with_container("game1", "running");
    let server = server(&dir, &runtime, true);
    let output = SharedBuffer::default();
    let transport =
        ConsoleTransport::new(server.router().clone(), server.console_caller(), output.clone());

    transport.run(&b"!stop\n"[..]).await.unwrap();
    timeout(Duration::from_secs(5), async {
        while !output.lines().iter().any(|line| line == "Stop result: stopped") {
            sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .unwrap();

    let lines = output.lines();
    assert_eq!(lines[0], "Server game1 will stop in 0 seconds (countdown started).");
    assert_eq!(lines[1], "Server will shut down in 0 seconds. Please prepare to log off.");
    assert_eq!(lines.last().unwrap(), "Stop result: stopped");
    assert_eq!(runtime.status_of("game1").as_deref(), Some("exited"));
}
