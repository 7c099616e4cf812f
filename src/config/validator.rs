//! Configuration validation

use super::*;
use anyhow::Result;

/// Upper bound on worker count; each process worker is a forked child
pub const MAX_WORKERS: usize = 4096;

/// Validate complete configuration
pub fn validate_config(config: &Config) -> Result<()> {
    validate_workload(&config.workload)?;
    validate_workers(&config.workers)?;
    validate_output(&config.output)?;

    Ok(())
}

/// Validate workload configuration
pub fn validate_workload(workload: &WorkloadConfig) -> Result<()> {
    if workload.items_per_worker == 0 {
        anyhow::bail!("workload.items_per_worker must be at least 1");
    }

    let probability = workload.flag_probability;
    if probability.range == 0 {
        anyhow::bail!("workload.flag_probability.range must be at least 1");
    }
    if probability.threshold > probability.range {
        anyhow::bail!(
            "workload.flag_probability.threshold ({}) cannot exceed range ({})",
            probability.threshold,
            probability.range
        );
    }

    if workload.service_time_us == 0 {
        tracing::warn!("service time is zero; elapsed time will be dominated by spawn and lock costs");
    }

    Ok(())
}

/// Validate workers configuration
pub fn validate_workers(workers: &WorkerConfig) -> Result<()> {
    if workers.count == 0 {
        anyhow::bail!("workers.count must be at least 1");
    }

    if workers.count > MAX_WORKERS {
        anyhow::bail!(
            "workers.count must be at most {}, got {}",
            MAX_WORKERS,
            workers.count
        );
    }

    let cpus = crate::util::num_cpus();
    if workers.count > cpus * 64 {
        tracing::warn!(
            workers = workers.count,
            cpus,
            "very high worker count relative to CPUs"
        );
    }

    Ok(())
}

/// Validate output configuration
pub fn validate_output(output: &OutputConfig) -> Result<()> {
    if let Some(path) = &output.json_output {
        if path.as_os_str().is_empty() {
            anyhow::bail!("output.json_output must not be an empty path");
        }
    }

    Ok(())
}
