//! Workload definition structures

use serde::{Deserialize, Serialize};
use std::fmt;

/// How worker units are created
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionModel {
    /// One forked process per worker; counter in System V shared memory,
    /// guarded by a System V semaphore
    Process,
    /// One OS thread per worker; counter behind an in-process mutex
    Thread,
}

impl ExecutionModel {
    /// Label used in reports
    pub fn label(&self) -> &'static str {
        match self {
            Self::Process => "processes (shared memory + semaphore)",
            Self::Thread => "threads (mutex)",
        }
    }
}

impl fmt::Display for ExecutionModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Process => write!(f, "process"),
            Self::Thread => write!(f, "thread"),
        }
    }
}

/// Which execution model(s) a run uses
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ModelSelection {
    Process,
    Thread,
    /// Run both models over the same grid and compare
    Both,
}

impl ModelSelection {
    /// Models to run, in order
    pub fn models(&self) -> Vec<ExecutionModel> {
        match self {
            Self::Process => vec![ExecutionModel::Process],
            Self::Thread => vec![ExecutionModel::Thread],
            Self::Both => vec![ExecutionModel::Process, ExecutionModel::Thread],
        }
    }
}

impl Default for ModelSelection {
    fn default() -> Self {
        Self::Both
    }
}

/// Where the workload seed comes from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SeedSource {
    /// Fixed seed; identical grid on every run
    Fixed(u64),
    /// Derived from wall-clock time and process id
    Entropy,
}

impl SeedSource {
    /// Resolve to a concrete seed
    ///
    /// The resolved value is always reported so that an entropy run can be
    /// replayed with a fixed seed.
    pub fn resolve(&self) -> u64 {
        match *self {
            Self::Fixed(seed) => seed,
            Self::Entropy => {
                let nanos = std::time::SystemTime::now()
                    .duration_since(std::time::UNIX_EPOCH)
                    .map(|d| d.as_nanos() as u64)
                    .unwrap_or(0);
                nanos ^ (std::process::id() as u64).rotate_left(32)
            }
        }
    }
}

impl Default for SeedSource {
    fn default() -> Self {
        Self::Fixed(42)
    }
}

/// Order in which grid cells are drawn from the PRNG
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GenerationOrder {
    /// One stream threaded across all cells, worker 0 first
    RowMajor,
    /// One independent stream per worker row
    PerWorker,
}

impl Default for GenerationOrder {
    fn default() -> Self {
        Self::RowMajor
    }
}

/// Probability that an item is flagged: `draw in [0, range) < threshold`
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct FlagProbability {
    pub threshold: u32,
    pub range: u32,
}

impl FlagProbability {
    pub fn new(threshold: u32, range: u32) -> Self {
        Self { threshold, range }
    }

    /// Probability as a percentage
    pub fn percent(&self) -> f64 {
        if self.range == 0 {
            return 0.0;
        }
        self.threshold as f64 * 100.0 / self.range as f64
    }
}

impl Default for FlagProbability {
    fn default() -> Self {
        Self { threshold: 3, range: 10 }
    }
}

impl fmt::Display for FlagProbability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} ({:.1}%)", self.threshold, self.range, self.percent())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_selection() {
        assert_eq!(ModelSelection::Both.models(), vec![ExecutionModel::Process, ExecutionModel::Thread]);
        assert_eq!(ModelSelection::Thread.models(), vec![ExecutionModel::Thread]);
    }

    #[test]
    fn test_fixed_seed_resolves_to_itself() {
        assert_eq!(SeedSource::Fixed(7).resolve(), 7);
        assert_eq!(SeedSource::default(), SeedSource::Fixed(42));
    }

    #[test]
    fn test_flag_probability_percent() {
        assert_eq!(FlagProbability::default().percent(), 30.0);
        assert_eq!(FlagProbability::new(1, 0).percent(), 0.0);
        assert_eq!(FlagProbability::default().to_string(), "3/10 (30.0%)");
    }
}
