//! Destinations for worker events
//!
//! Workers report progress through an [`EventSink`] instead of printing
//! directly. The thread model uses [`StdoutSink`]. Forked children use
//! [`RawStdoutSink`], which bypasses Rust's stdout lock: a child inherits
//! that lock in whatever state the parent had it at `fork` time, so taking
//! it there can deadlock.

use super::WorkerEvent;
use std::io::Write;
use std::sync::Mutex;

/// Receiver of worker events
///
/// Sinks are shared by every worker of a run and must tolerate arbitrary
/// interleaving between workers.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &WorkerEvent);
}

/// One line per event on standard output
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutSink;

impl EventSink for StdoutSink {
    fn emit(&self, event: &WorkerEvent) {
        let mut out = std::io::stdout().lock();
        let _ = writeln!(out, "{}", event);
    }
}

/// One `write(2)` per event on file descriptor 1
///
/// Each line is formatted into a buffer first and written with a single
/// syscall, so lines from concurrent processes do not interleave mid-line
/// on pipes and terminals.
#[derive(Debug, Default, Clone, Copy)]
pub struct RawStdoutSink;

impl EventSink for RawStdoutSink {
    fn emit(&self, event: &WorkerEvent) {
        write_raw(libc::STDOUT_FILENO, &format!("{}\n", event));
    }
}

/// Write `text` to `fd` with `write(2)`, without touching Rust's stdio locks
///
/// Retries on EINTR and short writes; other errors are dropped.
pub fn write_raw(fd: libc::c_int, text: &str) {
    let mut remaining = text.as_bytes();
    while !remaining.is_empty() {
        let written = unsafe {
            libc::write(fd, remaining.as_ptr() as *const libc::c_void, remaining.len())
        };
        if written < 0 {
            if std::io::Error::last_os_error().kind() == std::io::ErrorKind::Interrupted {
                continue;
            }
            return;
        }
        remaining = &remaining[written as usize..];
    }
}

/// Discards every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: &WorkerEvent) {}
}

/// Collects events in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<WorkerEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything emitted so far, in emission order
    pub fn events(&self) -> Vec<WorkerEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl EventSink for MemorySink {
    fn emit(&self, event: &WorkerEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_sink_keeps_order() {
        let sink = MemorySink::new();
        sink.emit(&WorkerEvent::Processing { worker_id: 0, item_index: 0 });
        sink.emit(&WorkerEvent::Finished { worker_id: 0 });
        assert_eq!(
            sink.events(),
            vec![
                WorkerEvent::Processing { worker_id: 0, item_index: 0 },
                WorkerEvent::Finished { worker_id: 0 },
            ]
        );
    }

    #[test]
    fn test_null_sink_is_silent() {
        NullSink.emit(&WorkerEvent::Finished { worker_id: 3 });
    }
}
