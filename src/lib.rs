//! syncbench - process vs thread synchronization micro-benchmark
//!
//! Runs one deterministic workload under two execution models and compares
//! them: forked processes sharing a counter through SysV shared memory and a
//! semaphore, and threads sharing a mutex-guarded counter.
//!
//! # Architecture
//!
//! - **Workload**: a seeded decision grid, one row of flags per worker
//! - **Counter**: the shared flagged-item total, one backing per model
//! - **Worker**: scans its row and increments the counter per flagged item
//! - **Coordinator**: allocates the counter, spawns and joins workers, times the run
//!
//! ```no_run
//! use std::time::Duration;
//! use syncbench::coordinator::{Coordinator, EventOutput, WorkerOptions};
//! use syncbench::workload;
//!
//! let grid = workload::generate(42, 8, 5);
//! let options = WorkerOptions {
//!     service_time: Duration::from_millis(10),
//!     events: EventOutput::Silent,
//! };
//! let results = Coordinator::new(grid, 42, options).compare()?;
//! assert_eq!(results[0].total_flagged, results[1].total_flagged);
//! # Ok::<(), syncbench::BenchError>(())
//! ```

pub mod config;
pub mod coordinator;
pub mod counter;
pub mod error;
pub mod output;
pub mod util;
pub mod worker;
pub mod workload;

// Re-export commonly used types
pub use config::Config;
pub use coordinator::{BenchmarkResult, Coordinator, ExecutionModel};
pub use counter::SharedCounter;
pub use error::{BenchError, BenchResult};
pub use workload::DecisionGrid;

/// Result type used by the binary and configuration layer
pub type Result<T> = anyhow::Result<T>;
