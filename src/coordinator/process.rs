//! Process execution backend: one `fork` per worker
//!
//! The child inherits the grid (copy-on-write) and the attached counter
//! segment, runs its worker, and leaves with `_exit` so that none of the
//! parent's atexit handlers, buffered output or test harness state runs
//! twice. The parent takes no worker role; it only records the pid.
//!
//! Child exit codes:
//!
//! | code | meaning |
//! |------|---------|
//! | 0 | all items processed |
//! | 1 | counter lock error |
//! | 2 | worker panicked |

use super::{EventOutput, WorkerOptions};
use crate::counter::process::ProcessCounter;
use crate::error::{BenchError, BenchResult};
use crate::worker::sink::{write_raw, EventSink, NullSink, RawStdoutSink};
use crate::worker::Worker;
use crate::workload::DecisionGrid;
use std::io::{self, Write};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

const EXIT_OK: libc::c_int = 0;
const EXIT_COUNTER_ERROR: libc::c_int = 1;
const EXIT_PANIC: libc::c_int = 2;

/// A forked worker process
#[derive(Debug)]
pub struct ProcessHandle {
    pub worker_id: usize,
    pub pid: libc::pid_t,
}

/// Fork a child that runs worker `worker_id`
pub fn spawn(
    worker_id: usize,
    grid: &Arc<DecisionGrid>,
    counter: &ProcessCounter,
    options: &WorkerOptions,
) -> io::Result<ProcessHandle> {
    // Anything still buffered would otherwise be flushed once per child
    let _ = io::stdout().flush();

    let pid = unsafe { libc::fork() };
    if pid == -1 {
        return Err(io::Error::last_os_error());
    }

    if pid == 0 {
        let code = run_child(worker_id, grid, counter, options);
        unsafe { libc::_exit(code) };
    }

    Ok(ProcessHandle { worker_id, pid })
}

fn run_child(
    worker_id: usize,
    grid: &DecisionGrid,
    counter: &ProcessCounter,
    options: &WorkerOptions,
) -> libc::c_int {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        let sink: &dyn EventSink = match &options.events {
            EventOutput::Stdout => &RawStdoutSink,
            EventOutput::Silent => &NullSink,
            EventOutput::Custom(sink) => sink.as_ref(),
        };

        Worker::new(worker_id, grid.row(worker_id), counter)
            .with_sink(sink)
            .with_service_time(options.service_time)
            .run()
    }));

    match outcome {
        Ok(Ok(_)) => EXIT_OK,
        Ok(Err(err)) => {
            write_raw(
                libc::STDERR_FILENO,
                &format!("worker {} failed: {}\n", worker_id, err),
            );
            EXIT_COUNTER_ERROR
        }
        Err(_) => EXIT_PANIC,
    }
}

impl ProcessHandle {
    /// Reap the child and translate its exit status
    pub fn join(self) -> BenchResult<()> {
        let status = wait_for(self.pid).map_err(|source| BenchError::Join {
            worker_id: self.worker_id,
            source,
        })?;

        if libc::WIFEXITED(status) {
            match libc::WEXITSTATUS(status) {
                EXIT_OK => Ok(()),
                EXIT_COUNTER_ERROR => Err(BenchError::WorkerFailed {
                    worker_id: self.worker_id,
                    reason: "counter lock operation failed".to_string(),
                }),
                EXIT_PANIC => Err(BenchError::WorkerFailed {
                    worker_id: self.worker_id,
                    reason: "worker panicked".to_string(),
                }),
                code => Err(BenchError::WorkerFailed {
                    worker_id: self.worker_id,
                    reason: format!("exited with status {}", code),
                }),
            }
        } else if libc::WIFSIGNALED(status) {
            Err(BenchError::WorkerFailed {
                worker_id: self.worker_id,
                reason: format!("killed by signal {}", libc::WTERMSIG(status)),
            })
        } else {
            Err(BenchError::WorkerFailed {
                worker_id: self.worker_id,
                reason: format!("unexpected wait status {:#x}", status),
            })
        }
    }
}

/// `waitpid` on one pid, retrying on EINTR
fn wait_for(pid: libc::pid_t) -> io::Result<libc::c_int> {
    let mut status: libc::c_int = 0;
    loop {
        let result = unsafe { libc::waitpid(pid, &mut status, 0) };
        if result == pid {
            return Ok(status);
        }
        let err = io::Error::last_os_error();
        if err.kind() != io::ErrorKind::Interrupted {
            return Err(err);
        }
    }
}
