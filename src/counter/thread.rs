//! In-process counter backed by a mutex

use super::{CounterError, SharedCounter};
use std::sync::Mutex;

/// Counter shared between threads of one process
///
/// Lives for as long as any worker holds it (the coordinator wraps it in an
/// `Arc`); its memory goes away with the last reference, so there is no
/// explicit detach step.
#[derive(Debug, Default)]
pub struct ThreadCounter {
    value: Mutex<u64>,
}

impl ThreadCounter {
    /// Create a counter starting at `initial`
    ///
    /// Heap allocation failure aborts the process rather than returning, so
    /// this never yields `ResourceExhaustion` in practice; the `Result` keeps
    /// the signature aligned with the cross-process backing.
    pub fn create(initial: u64) -> Result<Self, CounterError> {
        Ok(Self {
            value: Mutex::new(initial),
        })
    }

    /// Release the counter
    pub fn destroy(self) -> Result<(), CounterError> {
        Ok(())
    }
}

impl SharedCounter for ThreadCounter {
    fn increment_with(&self, on_increment: &mut dyn FnMut(u64)) -> Result<u64, CounterError> {
        let mut value = self.value.lock().map_err(|_| CounterError::Poisoned)?;
        *value += 1;
        let total = *value;
        on_increment(total);
        Ok(total)
    }

    fn read(&self) -> u64 {
        match self.value.lock() {
            Ok(value) => *value,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    fn backing(&self) -> &'static str {
        "mutex"
    }
}
