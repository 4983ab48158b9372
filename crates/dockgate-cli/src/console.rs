// crates/dockgate-cli/src/console.rs
// ============================================================================
// Module: Console Transport
// Description: Line-oriented command transport over standard streams.
// Purpose: Let a local operator drive the command router without chat.
// Dependencies: dockgate-broker, dockgate-core, dockgate-server, tokio
// ============================================================================

//! ## Overview
//! Each input line is one command from a single configured caller. Immediate
//! replies and later scheduled-action progress are written as lines to the
//! same output, which is shared behind a mutex so countdown results never
//! interleave with a reply mid-line.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io;
use std::io::Write;
use std::sync::Arc;
use std::sync::Mutex;

use dockgate_broker::CallbackSink;
use dockgate_core::Caller;
use dockgate_core::NotificationSink;
use dockgate_core::SinkError;
use dockgate_server::CommandRequest;
use dockgate_server::CommandRouter;
use thiserror::Error;
use tokio::io::AsyncBufRead;
use tokio::io::AsyncBufReadExt;

/// Origin label reported for console commands.
pub const CONSOLE_ORIGIN: &str = "console";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Console transport errors.
#[derive(Debug, Error)]
pub enum ConsoleError {
    /// Reading a command line failed.
    #[error("console read failed: {0}")]
    Read(String),
    /// Writing a reply failed.
    #[error("console write failed: {0}")]
    Write(String),
}

// ============================================================================
// SECTION: Transport
// ============================================================================

/// Feeds input lines to a [`CommandRouter`] as one caller.
pub struct ConsoleTransport<W> {
    /// Command dispatch.
    router: CommandRouter,
    /// Identity attached to every line.
    caller: Caller,
    /// Shared reply output.
    output: Arc<Mutex<W>>,
}

impl<W> ConsoleTransport<W>
where
    W: Write + Send + 'static,
{
    /// Creates a transport writing replies to `output`.
    pub fn new(router: CommandRouter, caller: Caller, output: W) -> Self {
        Self {
            router,
            caller,
            output: Arc::new(Mutex::new(output)),
        }
    }

    /// Reads commands until end of input and returns how many were read.
    ///
    /// # Errors
    ///
    /// Returns [`ConsoleError`] when reading input or writing replies fails.
    pub async fn run<R>(&self, reader: R) -> Result<usize, ConsoleError>
    where
        R: AsyncBufRead + Unpin,
    {
        let sink = self.sink();
        let mut lines = reader.lines();
        let mut handled = 0;
        while let Some(line) =
            lines.next_line().await.map_err(|err| ConsoleError::Read(err.to_string()))?
        {
            if line.trim().is_empty() {
                continue;
            }
            handled += 1;
            let request = CommandRequest {
                origin: CONSOLE_ORIGIN.to_string(),
                caller: self.caller.clone(),
                text: line,
            };
            for reply in self.router.handle(&request, Arc::clone(&sink)).await {
                write_line(&self.output, &reply)
                    .map_err(|err| ConsoleError::Write(err.to_string()))?;
            }
        }
        Ok(handled)
    }

    /// Builds the sink that prints scheduled-action progress.
    fn sink(&self) -> Arc<dyn NotificationSink> {
        let output = Arc::clone(&self.output);
        Arc::new(CallbackSink::new(move |notification| {
            write_line(&output, &notification.text)
                .map_err(|err| SinkError::DeliveryFailed(err.to_string()))
        }))
    }
}

/// Writes one line to the shared output.
fn write_line<W: Write>(output: &Mutex<W>, text: &str) -> io::Result<()> {
    let mut guard = output.lock().map_err(|_| io::Error::other("console output lock poisoned"))?;
    writeln!(guard, "{text}")?;
    guard.flush()
}
