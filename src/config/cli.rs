//! CLI argument parsing using clap

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// syncbench - process vs thread synchronization micro-benchmark
#[derive(Parser, Debug)]
#[command(name = "syncbench")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Execution model: process, thread, or both (same grid, compared)
    #[arg(short = 'm', long, value_enum)]
    pub model: Option<ModelArg>,

    // === Workload Options ===
    /// Number of workers (processes or threads)
    #[arg(short = 'w', long)]
    pub workers: Option<usize>,

    /// Items scanned by each worker
    #[arg(short = 'i', long)]
    pub items: Option<usize>,

    /// Simulated per-item service time (e.g., 100ms, 250us, 1s)
    #[arg(short = 'd', long)]
    pub delay: Option<String>,

    /// Flag threshold: an item is flagged when a draw in [0, range) is below it
    #[arg(long)]
    pub flag_threshold: Option<u32>,

    /// Range of the flag draw
    #[arg(long)]
    pub flag_range: Option<u32>,

    /// Fixed workload seed
    #[arg(short = 's', long, env = "SYNCBENCH_SEED", conflicts_with = "random_seed")]
    pub seed: Option<u64>,

    /// Derive the seed from the clock and process id instead of a fixed value
    #[arg(long)]
    pub random_seed: bool,

    /// Order in which grid cells are drawn
    #[arg(long, value_enum)]
    pub order: Option<OrderArg>,

    // === Output Options ===
    /// Suppress per-item worker lines
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// Print the decision grid before running
    #[arg(long)]
    pub show_grid: bool,

    /// JSON report file path
    #[arg(long)]
    pub json_output: Option<PathBuf>,

    // === Configuration File ===
    /// TOML configuration file
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Dry run - validate configuration without executing
    #[arg(long)]
    pub dry_run: bool,

    /// Enable debug logging on stderr
    #[arg(long)]
    pub debug: bool,
}

/// Execution model selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModelArg {
    /// Forked processes, shared memory + semaphore
    Process,
    /// Threads, mutex
    Thread,
    /// Both models over the same grid
    Both,
}

/// Grid generation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OrderArg {
    /// One stream across all cells, worker by worker
    RowMajor,
    /// One independent stream per worker
    PerWorker,
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate CLI arguments
    ///
    /// Only catches what can be checked before merging with a config file;
    /// the merged configuration goes through `validator::validate_config`.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.workers == Some(0) {
            anyhow::bail!("workers must be at least 1");
        }

        if self.items == Some(0) {
            anyhow::bail!("items must be at least 1");
        }

        if self.flag_range == Some(0) {
            anyhow::bail!("flag_range must be at least 1");
        }

        if let (Some(threshold), Some(range)) = (self.flag_threshold, self.flag_range) {
            if threshold > range {
                anyhow::bail!("flag_threshold ({}) cannot exceed flag_range ({})", threshold, range);
            }
        }

        Ok(())
    }
}
