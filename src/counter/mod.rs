//! Shared flag counters
//!
//! A [`SharedCounter`] is a single non-negative integer that many workers
//! increment under mutual exclusion. Two backings implement the same contract:
//!
//! - [`process::ProcessCounter`]: a System V shared memory segment holding the
//!   value, guarded by a System V semaphore. Survives `fork`, so every child
//!   process increments the same integer.
//! - [`thread::ThreadCounter`]: a `Mutex<u64>` shared between threads of one
//!   process.
//!
//! # Critical section
//!
//! The lock is held only for the increment and whatever the caller does in
//! the `increment_with` callback (the flag message). Simulated work never runs
//! under the lock.
//!
//! # Example
//!
//! ```
//! use syncbench::counter::{SharedCounter, thread::ThreadCounter};
//!
//! let counter = ThreadCounter::create(0).unwrap();
//! let total = counter.increment().unwrap();
//! assert_eq!(total, 1);
//! assert_eq!(counter.read(), 1);
//! counter.destroy().unwrap();
//! ```

pub mod process;
pub mod thread;

use std::io;
use thiserror::Error;

/// Errors from counter allocation and locking
#[derive(Error, Debug)]
pub enum CounterError {
    /// The OS refused to allocate the backing storage or the lock object.
    /// Nothing is left allocated when this is returned.
    #[error("resource exhaustion: cannot allocate {resource}: {source}")]
    ResourceExhaustion {
        resource: &'static str,
        #[source]
        source: io::Error,
    },

    /// Acquiring or releasing the lock failed
    #[error("counter lock operation failed: {0}")]
    Lock(#[source] io::Error),

    /// A thread panicked while holding the lock
    #[error("counter lock poisoned by a panicked worker")]
    Poisoned,

    /// Releasing the shared resources failed
    #[error("failed to release {resource}: {source}")]
    Release {
        resource: &'static str,
        #[source]
        source: io::Error,
    },
}

/// Integer aggregate mutated under mutual exclusion
///
/// Implementations must make `increment_with` linearizable: no two callers
/// ever observe the same post-increment value.
pub trait SharedCounter: Send + Sync {
    /// Acquire the lock, add one, run `on_increment` with the new total while
    /// still holding the lock, then release. Returns the new total.
    fn increment_with(&self, on_increment: &mut dyn FnMut(u64)) -> Result<u64, CounterError>;

    /// Add one under the lock and return the new total
    fn increment(&self) -> Result<u64, CounterError> {
        self.increment_with(&mut |_| {})
    }

    /// Current value
    ///
    /// Only meaningful once every worker has finished; there is no
    /// synchronization contract against concurrent increments.
    fn read(&self) -> u64;

    /// Short name of the backing, for logs and reports
    fn backing(&self) -> &'static str;
}
