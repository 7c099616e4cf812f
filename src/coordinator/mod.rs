//! Coordinator module
//!
//! Spawns one worker per grid row under an [`ExecutionModel`], waits for all
//! of them, and reports the final counter value with the elapsed time.
//!
//! Both models share one driver ([`Coordinator::run`]); the differences are
//! confined to [`CounterHandle`] (which counter backs the run) and the two
//! spawn/join backends in [`process`] and [`thread`]:
//!
//! ```text
//! process: Init -> CounterAllocated -> Spawning -> AllSpawned -> AllJoined -> Reported -> Destroyed
//! thread:  Init -> CounterReady     -> Spawning -> AllSpawned -> AllJoined -> Reported
//! ```
//!
//! Elapsed time covers only spawn through last join, on the monotonic clock.
//! Counter setup and teardown are excluded.
//!
//! # Error paths
//!
//! - Counter allocation fails: nothing is spawned, the error is returned.
//! - A spawn fails: already-spawned workers are joined first, then the
//!   counter is released (by `Drop`) and `SpawnFailure` is returned.
//! - A worker fails: every other worker is still joined before the first
//!   failure is returned.

pub mod process;
pub mod thread;

pub use crate::config::workload::{ExecutionModel, ModelSelection};

use crate::config::Config;
use crate::counter::process::ProcessCounter;
use crate::counter::thread::ThreadCounter;
use crate::counter::{CounterError, SharedCounter};
use crate::error::{BenchError, BenchResult};
use crate::util::time::Timestamp;
use crate::worker::sink::EventSink;
use crate::worker::DEFAULT_SERVICE_TIME;
use crate::workload::{DecisionGrid, WorkloadGenerator};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Where worker events go
#[derive(Clone)]
pub enum EventOutput {
    /// One line per event on standard output
    Stdout,
    /// Discard worker events
    Silent,
    /// A caller-provided sink. Under the process model each child writes to
    /// its own copy, so in-memory sinks only observe thread-model runs.
    Custom(Arc<dyn EventSink>),
}

impl std::fmt::Debug for EventOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stdout => write!(f, "Stdout"),
            Self::Silent => write!(f, "Silent"),
            Self::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

/// Per-worker settings shared by every worker of a run
#[derive(Debug, Clone)]
pub struct WorkerOptions {
    /// Simulated per-item processing time
    pub service_time: Duration,
    pub events: EventOutput,
}

impl Default for WorkerOptions {
    fn default() -> Self {
        Self {
            service_time: DEFAULT_SERVICE_TIME,
            events: EventOutput::Stdout,
        }
    }
}

/// Shared counter for one run, tagged by execution model
pub enum CounterHandle {
    Process(ProcessCounter),
    Thread(Arc<ThreadCounter>),
}

impl CounterHandle {
    /// Allocate the counter the model needs, starting at zero
    pub fn allocate(model: ExecutionModel) -> Result<Self, CounterError> {
        match model {
            ExecutionModel::Process => Ok(Self::Process(ProcessCounter::create(0)?)),
            ExecutionModel::Thread => Ok(Self::Thread(Arc::new(ThreadCounter::create(0)?))),
        }
    }

    pub fn model(&self) -> ExecutionModel {
        match self {
            Self::Process(_) => ExecutionModel::Process,
            Self::Thread(_) => ExecutionModel::Thread,
        }
    }

    pub fn as_counter(&self) -> &dyn SharedCounter {
        match self {
            Self::Process(counter) => counter,
            Self::Thread(counter) => counter.as_ref(),
        }
    }

    pub fn read(&self) -> u64 {
        self.as_counter().read()
    }

    /// Release the counter's resources
    ///
    /// For the process model this removes the shared memory segment and the
    /// semaphore. The thread-model counter is simply dropped.
    pub fn release(self) -> Result<(), CounterError> {
        match self {
            Self::Process(counter) => counter.destroy(),
            Self::Thread(_) => Ok(()),
        }
    }
}

/// Handle to wait on one spawned worker
#[derive(Debug)]
pub enum CompletionHandle {
    Process(process::ProcessHandle),
    Thread(thread::ThreadHandle),
}

impl CompletionHandle {
    pub fn worker_id(&self) -> usize {
        match self {
            Self::Process(handle) => handle.worker_id,
            Self::Thread(handle) => handle.worker_id,
        }
    }

    /// Block until the worker has terminated
    pub fn join(self) -> BenchResult<()> {
        match self {
            Self::Process(handle) => handle.join(),
            Self::Thread(handle) => handle.join(),
        }
    }
}

/// Spawn one worker per grid row against `counter`
///
/// The counter's variant selects the execution model. If a spawn fails, the
/// workers spawned so far are joined before the error is returned.
pub fn spawn_workers(
    grid: &Arc<DecisionGrid>,
    counter: &CounterHandle,
    options: &WorkerOptions,
) -> BenchResult<Vec<CompletionHandle>> {
    spawn_each(grid.workers(), |worker_id| match counter {
        CounterHandle::Process(counter) => {
            process::spawn(worker_id, grid, counter, options).map(CompletionHandle::Process)
        }
        CounterHandle::Thread(counter) => {
            thread::spawn(worker_id, grid, counter, options).map(CompletionHandle::Thread)
        }
    })
}

/// Spawn workers `0..workers` with `spawn`, draining on the first failure
fn spawn_each<F>(workers: usize, mut spawn: F) -> BenchResult<Vec<CompletionHandle>>
where
    F: FnMut(usize) -> std::io::Result<CompletionHandle>,
{
    let mut handles = Vec::with_capacity(workers);

    for worker_id in 0..workers {
        match spawn(worker_id) {
            Ok(handle) => handles.push(handle),
            Err(source) => {
                warn!(worker_id, error = %source, "spawn failed, draining {} workers", handles.len());
                if let Err(err) = join_all(handles) {
                    warn!(error = %err, "worker failed while draining after spawn failure");
                }
                return Err(BenchError::SpawnFailure { worker_id, source });
            }
        }
    }

    Ok(handles)
}

/// Wait for every worker, in any order
///
/// All handles are joined even when some fail; the first failure is
/// returned afterwards.
pub fn join_all(handles: Vec<CompletionHandle>) -> BenchResult<()> {
    let mut first_error = None;

    for handle in handles {
        let worker_id = handle.worker_id();
        if let Err(err) = handle.join() {
            warn!(worker_id, error = %err, "worker did not complete");
            first_error.get_or_insert(err);
        }
    }

    match first_error {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

/// Outcome of one benchmark run
#[derive(Debug, Clone)]
pub struct BenchmarkResult {
    pub model: ExecutionModel,
    pub workers: usize,
    pub items_per_worker: usize,
    pub seed: u64,
    pub service_time: Duration,
    /// Final counter value
    pub total_flagged: u64,
    /// Number of `true` cells in the grid
    pub expected_flagged: u64,
    /// First spawn to last join
    pub elapsed: Duration,
    pub started_at: DateTime<Utc>,
}

impl BenchmarkResult {
    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed.as_secs_f64() * 1000.0
    }

    /// Final counter equals the grid's flagged count
    pub fn is_consistent(&self) -> bool {
        self.total_flagged == self.expected_flagged
    }

    /// Lower bound on elapsed time: each worker sleeps through its items
    /// sequentially, so no amount of parallelism beats one row's worth.
    pub fn service_floor(&self) -> Duration {
        u32::try_from(self.items_per_worker)
            .ok()
            .and_then(|items| self.service_time.checked_mul(items))
            .unwrap_or(Duration::MAX)
    }
}

/// Drives benchmark runs over one decision grid
#[derive(Debug, Clone)]
pub struct Coordinator {
    grid: Arc<DecisionGrid>,
    seed: u64,
    options: WorkerOptions,
}

impl Coordinator {
    /// Coordinator over an existing grid
    pub fn new(grid: DecisionGrid, seed: u64, options: WorkerOptions) -> Self {
        Self {
            grid: Arc::new(grid),
            seed,
            options,
        }
    }

    /// Resolve the seed and generate the grid described by `config`
    pub fn from_config(config: &Config) -> Self {
        let workload = &config.workload;
        let seed = workload.seed.resolve();
        let grid = WorkloadGenerator::new(seed)
            .with_probability(workload.flag_probability)
            .with_order(workload.generation_order)
            .generate(config.workers.count, workload.items_per_worker);

        let events = if config.output.quiet {
            EventOutput::Silent
        } else {
            EventOutput::Stdout
        };

        Self::new(
            grid,
            seed,
            WorkerOptions {
                service_time: workload.service_time(),
                events,
            },
        )
    }

    pub fn grid(&self) -> &DecisionGrid {
        &self.grid
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn options(&self) -> &WorkerOptions {
        &self.options
    }

    /// Run every worker under `model` and report the result
    pub fn run(&self, model: ExecutionModel) -> BenchResult<BenchmarkResult> {
        let (workers, items) = self.grid.dimensions();
        debug!(%model, workers, items, "init");

        let counter = CounterHandle::allocate(model)?;
        debug!(%model, backing = counter.as_counter().backing(), "counter allocated");

        let started_at = Utc::now();
        let start = Timestamp::now();

        let handles = spawn_workers(&self.grid, &counter, &self.options)?;
        debug!(%model, spawned = handles.len(), "all spawned");

        let joined = join_all(handles);
        let elapsed = start.elapsed();
        joined?;
        debug!(%model, "all joined");

        let result = BenchmarkResult {
            model,
            workers,
            items_per_worker: items,
            seed: self.seed,
            service_time: self.options.service_time,
            total_flagged: counter.read(),
            expected_flagged: self.grid.count_flagged(),
            elapsed,
            started_at,
        };
        info!(
            %model,
            total = result.total_flagged,
            expected = result.expected_flagged,
            elapsed_ms = result.elapsed_ms(),
            "reported"
        );

        counter.release()?;
        debug!(%model, "counter released");

        Ok(result)
    }

    /// Run each selected model in turn over the same grid
    pub fn run_selection(&self, selection: ModelSelection) -> BenchResult<Vec<BenchmarkResult>> {
        selection.models().into_iter().map(|model| self.run(model)).collect()
    }

    /// Run both models over the same grid
    pub fn compare(&self) -> BenchResult<Vec<BenchmarkResult>> {
        self.run_selection(ModelSelection::Both)
    }
}
