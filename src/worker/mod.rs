//! Worker implementation
//!
//! A [`Worker`] is the unit of execution the coordinator spawns, once per
//! worker id, either in a forked child process or in its own thread. It walks
//! its row of the [`DecisionGrid`](crate::workload::DecisionGrid) item by item:
//!
//! 1. report `processing`, then sleep for the configured service time
//!    (unsynchronized; this is the simulated work),
//! 2. read the pre-generated decision for the item (no lock: the grid is
//!    read-only),
//! 3. if flagged, increment the shared counter and report the new total while
//!    still holding the counter's lock.
//!
//! # Example
//!
//! ```
//! use syncbench::counter::{SharedCounter, thread::ThreadCounter};
//! use syncbench::worker::{Worker, sink::MemorySink};
//! use std::time::Duration;
//!
//! let counter = ThreadCounter::create(0)?;
//! let sink = MemorySink::new();
//! let row = [true, false, true];
//!
//! let summary = Worker::new(0, &row, &counter)
//!     .with_sink(&sink)
//!     .with_service_time(Duration::ZERO)
//!     .run()?;
//!
//! assert_eq!(summary.items_flagged, 2);
//! assert_eq!(counter.read(), 2);
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod sink;

use crate::counter::{CounterError, SharedCounter};
use sink::{EventSink, NullSink};
use std::fmt;
use std::time::Duration;

/// Default simulated per-item service time
pub const DEFAULT_SERVICE_TIME: Duration = Duration::from_millis(100);

/// Something a worker reports while running
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerEvent {
    /// Simulated work on an item is starting
    Processing { worker_id: usize, item_index: usize },
    /// An item was flagged; `total` is the counter value right after this
    /// worker's increment
    Flagged {
        worker_id: usize,
        item_index: usize,
        total: u64,
    },
    /// The worker processed all of its items
    Finished { worker_id: usize },
}

impl WorkerEvent {
    pub fn worker_id(&self) -> usize {
        match *self {
            Self::Processing { worker_id, .. }
            | Self::Flagged { worker_id, .. }
            | Self::Finished { worker_id } => worker_id,
        }
    }
}

impl fmt::Display for WorkerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Processing { worker_id, item_index } => {
                write!(f, "worker {} processing item {}", worker_id, item_index)
            }
            Self::Flagged { worker_id, item_index, total } => write!(
                f,
                "worker {} flagged item {} (total: {})",
                worker_id, item_index, total
            ),
            Self::Finished { worker_id } => write!(f, "worker {} finished", worker_id),
        }
    }
}

/// What a worker did, returned when it finishes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerSummary {
    pub worker_id: usize,
    pub items_processed: usize,
    pub items_flagged: u64,
}

/// One worker's task: its id, its row of decisions and the shared counter
///
/// Created once per worker before spawn and consumed by [`Worker::run`].
pub struct Worker<'a> {
    id: usize,
    row: &'a [bool],
    counter: &'a dyn SharedCounter,
    sink: &'a dyn EventSink,
    service_time: Duration,
}

impl<'a> Worker<'a> {
    /// Create a worker with the default service time and no event output
    pub fn new(id: usize, row: &'a [bool], counter: &'a dyn SharedCounter) -> Self {
        Self {
            id,
            row,
            counter,
            sink: &NullSink,
            service_time: DEFAULT_SERVICE_TIME,
        }
    }

    pub fn with_sink(mut self, sink: &'a dyn EventSink) -> Self {
        self.sink = sink;
        self
    }

    pub fn with_service_time(mut self, service_time: Duration) -> Self {
        self.service_time = service_time;
        self
    }

    /// Process every item in the row
    ///
    /// # Errors
    ///
    /// Returns the counter's error if a lock operation fails; the worker
    /// stops at that item.
    pub fn run(self) -> Result<WorkerSummary, CounterError> {
        let mut flagged = 0u64;

        for (item_index, &decision) in self.row.iter().enumerate() {
            self.process_item(item_index);

            if decision {
                let worker_id = self.id;
                let sink = self.sink;
                self.counter.increment_with(&mut |total| {
                    sink.emit(&WorkerEvent::Flagged {
                        worker_id,
                        item_index,
                        total,
                    });
                })?;
                flagged += 1;
            }
        }

        self.sink.emit(&WorkerEvent::Finished { worker_id: self.id });

        Ok(WorkerSummary {
            worker_id: self.id,
            items_processed: self.row.len(),
            items_flagged: flagged,
        })
    }

    /// Simulated work; never called with the counter lock held
    fn process_item(&self, item_index: usize) {
        self.sink.emit(&WorkerEvent::Processing {
            worker_id: self.id,
            item_index,
        });
        if !self.service_time.is_zero() {
            std::thread::sleep(self.service_time);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::counter::thread::ThreadCounter;
    use sink::MemorySink;
    use std::time::Instant;

    #[test]
    fn test_event_display() {
        assert_eq!(
            WorkerEvent::Processing { worker_id: 2, item_index: 4 }.to_string(),
            "worker 2 processing item 4"
        );
        assert_eq!(
            WorkerEvent::Flagged { worker_id: 1, item_index: 0, total: 7 }.to_string(),
            "worker 1 flagged item 0 (total: 7)"
        );
        assert_eq!(WorkerEvent::Finished { worker_id: 5 }.to_string(), "worker 5 finished");
    }

    #[test]
    fn test_run_emits_expected_events() {
        let counter = ThreadCounter::create(0).unwrap();
        let sink = MemorySink::new();
        let row = [false, true, false, true, true];

        let summary = Worker::new(3, &row, &counter)
            .with_sink(&sink)
            .with_service_time(Duration::ZERO)
            .run()
            .unwrap();

        assert_eq!(
            summary,
            WorkerSummary { worker_id: 3, items_processed: 5, items_flagged: 3 }
        );
        assert_eq!(counter.read(), 3);

        let events = sink.events();
        let processing = events
            .iter()
            .filter(|e| matches!(e, WorkerEvent::Processing { .. }))
            .count();
        assert_eq!(processing, 5);

        let flagged: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                WorkerEvent::Flagged { item_index, total, .. } => Some((*item_index, *total)),
                _ => None,
            })
            .collect();
        assert_eq!(flagged, vec![(1, 1), (3, 2), (4, 3)]);

        assert_eq!(events.last(), Some(&WorkerEvent::Finished { worker_id: 3 }));
        assert!(events.iter().all(|e| e.worker_id() == 3));
    }

    #[test]
    fn test_processing_precedes_flag_for_each_item() {
        let counter = ThreadCounter::create(0).unwrap();
        let sink = MemorySink::new();
        let row = [true, true];

        Worker::new(0, &row, &counter)
            .with_sink(&sink)
            .with_service_time(Duration::ZERO)
            .run()
            .unwrap();

        assert_eq!(
            sink.events(),
            vec![
                WorkerEvent::Processing { worker_id: 0, item_index: 0 },
                WorkerEvent::Flagged { worker_id: 0, item_index: 0, total: 1 },
                WorkerEvent::Processing { worker_id: 0, item_index: 1 },
                WorkerEvent::Flagged { worker_id: 0, item_index: 1, total: 2 },
                WorkerEvent::Finished { worker_id: 0 },
            ]
        );
    }

    #[test]
    fn test_service_time_applies_per_item() {
        let counter = ThreadCounter::create(0).unwrap();
        let row = [false; 4];
        let start = Instant::now();

        Worker::new(0, &row, &counter)
            .with_service_time(Duration::from_millis(5))
            .run()
            .unwrap();

        assert!(start.elapsed() >= Duration::from_millis(20));
        assert_eq!(counter.read(), 0);
    }

    #[test]
    fn test_empty_row() {
        let counter = ThreadCounter::create(0).unwrap();
        let summary = Worker::new(9, &[], &counter).run().unwrap();
        assert_eq!(summary.items_processed, 0);
        assert_eq!(summary.items_flagged, 0);
    }
}
