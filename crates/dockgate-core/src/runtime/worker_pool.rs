// crates/dockgate-core/src/runtime/worker_pool.rs
// ============================================================================
// Module: Dockgate Worker Pool
// Description: Bounded pool for blocking runtime-client calls.
// Purpose: Keep blocking container calls off the async control loop.
// Dependencies: tokio
// ============================================================================

//! ## Overview
//! [`WorkerPool`] runs closures on tokio's blocking thread pool while a
//! semaphore caps how many run at once. Callers await a permit, so excess work
//! queues instead of spawning unbounded threads.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Semaphore;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Worker pool failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkerError {
    /// The pool was closed.
    #[error("worker pool closed")]
    Closed,
    /// The blocking task panicked or was cancelled.
    #[error("worker task failed: {0}")]
    Join(String),
}

// ============================================================================
// SECTION: Worker Pool
// ============================================================================

/// Semaphore-bounded blocking executor.
#[derive(Debug, Clone)]
pub struct WorkerPool {
    /// Concurrency permits.
    permits: Arc<Semaphore>,
    /// Configured pool size.
    size: usize,
}

impl WorkerPool {
    /// Creates a pool running at most `size` jobs at once (minimum one).
    #[must_use]
    pub fn new(size: usize) -> Self {
        let size = size.max(1);
        Self {
            permits: Arc::new(Semaphore::new(size)),
            size,
        }
    }

    /// Returns the configured pool size.
    #[must_use]
    pub const fn size(&self) -> usize {
        self.size
    }

    /// Runs `job` on a blocking thread once a permit is available.
    ///
    /// # Errors
    ///
    /// Returns [`WorkerError`] when the pool is closed or the job panics.
    pub async fn run<F, T>(&self, job: F) -> Result<T, WorkerError>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let permit = Arc::clone(&self.permits).acquire_owned().await.map_err(|_| WorkerError::Closed)?;
        tokio::task::spawn_blocking(move || {
            let _permit = permit;
            job()
        })
        .await
        .map_err(|err| WorkerError::Join(err.to_string()))
    }
}
