//! Configuration module
//!
//! Handles CLI argument parsing, TOML configuration files, and validation.

pub mod cli;
pub mod cli_convert;
pub mod toml;
pub mod validator;
pub mod workload;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use workload::*;

/// Complete benchmark configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub workload: WorkloadConfig,
    #[serde(default)]
    pub workers: WorkerConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub runtime: RuntimeConfig,
}

/// Workload configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkloadConfig {
    /// Items each worker scans
    #[serde(default = "default_items_per_worker")]
    pub items_per_worker: usize,
    /// Simulated per-item service time in microseconds
    #[serde(default = "default_service_time_us")]
    pub service_time_us: u64,
    /// Probability that an item is flagged
    #[serde(default)]
    pub flag_probability: FlagProbability,
    /// Workload seed
    #[serde(default)]
    pub seed: SeedSource,
    /// Order in which grid cells are drawn
    #[serde(default)]
    pub generation_order: GenerationOrder,
    /// Execution model(s) to run
    #[serde(default)]
    pub model: ModelSelection,
}

impl WorkloadConfig {
    pub fn service_time(&self) -> Duration {
        Duration::from_micros(self.service_time_us)
    }
}

fn default_items_per_worker() -> usize {
    5
}

fn default_service_time_us() -> u64 {
    100_000
}

impl Default for WorkloadConfig {
    fn default() -> Self {
        Self {
            items_per_worker: default_items_per_worker(),
            service_time_us: default_service_time_us(),
            flag_probability: FlagProbability::default(),
            seed: SeedSource::default(),
            generation_order: GenerationOrder::default(),
            model: ModelSelection::default(),
        }
    }
}

/// Worker configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Number of workers (processes or threads)
    #[serde(default = "default_worker_count")]
    pub count: usize,
}

fn default_worker_count() -> usize {
    8
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            count: default_worker_count(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Suppress per-item worker lines (summary is still printed)
    #[serde(default)]
    pub quiet: bool,
    /// Print the decision grid before running
    #[serde(default)]
    pub show_grid: bool,
    /// JSON report file path
    pub json_output: Option<PathBuf>,
}

/// Runtime configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Dry run mode
    #[serde(default)]
    pub dry_run: bool,
    /// Enable debug logging
    #[serde(default)]
    pub debug: bool,
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Configuration:")?;
        writeln!(f, "  Model:            {:?}", self.workload.model)?;
        writeln!(f, "  Workers:          {}", self.workers.count)?;
        writeln!(f, "  Items per worker: {}", self.workload.items_per_worker)?;
        writeln!(
            f,
            "  Service time:     {}",
            crate::util::time::format_duration(self.workload.service_time())
        )?;
        writeln!(f, "  Flag probability: {}", self.workload.flag_probability)?;
        match self.workload.seed {
            SeedSource::Fixed(seed) => writeln!(f, "  Seed:             {}", seed)?,
            SeedSource::Entropy => writeln!(f, "  Seed:             (derived at start)")?,
        }
        write!(f, "  Generation order: {:?}", self.workload.generation_order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.workers.count, 8);
        assert_eq!(config.workload.items_per_worker, 5);
        assert_eq!(config.workload.service_time(), Duration::from_millis(100));
        assert_eq!(config.workload.flag_probability, FlagProbability::new(3, 10));
        assert_eq!(config.workload.seed, SeedSource::Fixed(42));
        assert_eq!(config.workload.generation_order, GenerationOrder::RowMajor);
        assert_eq!(config.workload.model, ModelSelection::Both);
        assert!(!config.output.quiet);
        assert!(config.output.json_output.is_none());
    }

    #[test]
    fn test_display_mentions_settings() {
        let rendered = Config::default().to_string();
        assert!(rendered.contains("Workers:          8"));
        assert!(rendered.contains("Seed:             42"));
        assert!(rendered.contains("100.00ms"));
    }
}
