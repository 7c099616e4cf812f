//! Error types for benchmark runs
//!
//! Library operations return [`BenchError`]. The binary wraps these in
//! `anyhow` with context, the same way configuration errors are reported.

use crate::counter::CounterError;
use thiserror::Error;

/// Errors that abort a benchmark run
///
/// There is no partial-success mode: any of these means the run is reported
/// as failed after every spawned worker has been joined and the shared
/// counter released.
#[derive(Error, Debug)]
pub enum BenchError {
    /// The shared counter (or its lock) could not be allocated
    #[error(transparent)]
    Counter(#[from] CounterError),

    /// The OS refused to create a worker unit
    #[error("failed to spawn worker {worker_id}: {source}")]
    SpawnFailure {
        worker_id: usize,
        #[source]
        source: std::io::Error,
    },

    /// A worker unit terminated abnormally
    #[error("worker {worker_id} failed: {reason}")]
    WorkerFailed { worker_id: usize, reason: String },

    /// Waiting on a worker process failed
    #[error("failed to wait for worker {worker_id}: {source}")]
    Join {
        worker_id: usize,
        #[source]
        source: std::io::Error,
    },
}

impl BenchError {
    /// True when the run failed because shared resources could not be allocated
    pub fn is_resource_exhaustion(&self) -> bool {
        matches!(self, BenchError::Counter(CounterError::ResourceExhaustion { .. }))
    }
}

/// Result alias for benchmark operations
pub type BenchResult<T> = std::result::Result<T, BenchError>;
