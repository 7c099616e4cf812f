//! Thread execution backend: one named OS thread per worker

use super::{EventOutput, WorkerOptions};
use crate::counter::thread::ThreadCounter;
use crate::counter::CounterError;
use crate::error::{BenchError, BenchResult};
use crate::worker::sink::{EventSink, NullSink, StdoutSink};
use crate::worker::{Worker, WorkerSummary};
use crate::workload::DecisionGrid;
use std::io;
use std::sync::Arc;
use std::thread::JoinHandle;

/// A spawned worker thread
#[derive(Debug)]
pub struct ThreadHandle {
    pub worker_id: usize,
    handle: JoinHandle<Result<WorkerSummary, CounterError>>,
}

/// Spawn a thread that runs worker `worker_id`
pub fn spawn(
    worker_id: usize,
    grid: &Arc<DecisionGrid>,
    counter: &Arc<ThreadCounter>,
    options: &WorkerOptions,
) -> io::Result<ThreadHandle> {
    let grid = Arc::clone(grid);
    let counter = Arc::clone(counter);
    let service_time = options.service_time;
    let sink: Arc<dyn EventSink> = match &options.events {
        EventOutput::Stdout => Arc::new(StdoutSink),
        EventOutput::Silent => Arc::new(NullSink),
        EventOutput::Custom(sink) => Arc::clone(sink),
    };

    let handle = std::thread::Builder::new()
        .name(format!("worker-{}", worker_id))
        .spawn(move || {
            Worker::new(worker_id, grid.row(worker_id), counter.as_ref())
                .with_sink(sink.as_ref())
                .with_service_time(service_time)
                .run()
        })?;

    Ok(ThreadHandle { worker_id, handle })
}

impl ThreadHandle {
    /// Wait for the thread's completion
    pub fn join(self) -> BenchResult<()> {
        match self.handle.join() {
            Ok(Ok(_summary)) => Ok(()),
            Ok(Err(err)) => Err(BenchError::WorkerFailed {
                worker_id: self.worker_id,
                reason: err.to_string(),
            }),
            Err(_) => Err(BenchError::WorkerFailed {
                worker_id: self.worker_id,
                reason: "worker panicked".to_string(),
            }),
        }
    }
}
