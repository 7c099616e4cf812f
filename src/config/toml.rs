//! TOML configuration file parsing

use super::*;
use crate::config::cli::Cli;
use crate::config::cli_convert::{convert_model, convert_order, convert_seed, parse_time_us};
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Parse TOML configuration file
pub fn parse_toml_file(path: &Path) -> Result<Config> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    parse_toml_string(&contents)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Parse TOML configuration from string
pub fn parse_toml_string(contents: &str) -> Result<Config> {
    let config: Config = ::toml::from_str(contents)
        .context("Failed to parse TOML configuration")?;

    Ok(config)
}

/// Merge CLI arguments with TOML configuration (CLI takes precedence)
///
/// Without a config file, pass `Config::default()` and the CLI is applied
/// over the built-in defaults.
pub fn merge_cli_with_config(cli: &Cli, mut config: Config) -> Result<Config> {
    if let Some(model) = cli.model {
        config.workload.model = convert_model(model);
    }

    if let Some(workers) = cli.workers {
        config.workers.count = workers;
    }
    if let Some(items) = cli.items {
        config.workload.items_per_worker = items;
    }

    if let Some(delay) = &cli.delay {
        config.workload.service_time_us = parse_time_us(delay)
            .with_context(|| format!("Invalid --delay value: {}", delay))?;
    }

    if let Some(threshold) = cli.flag_threshold {
        config.workload.flag_probability.threshold = threshold;
    }
    if let Some(range) = cli.flag_range {
        config.workload.flag_probability.range = range;
    }

    if let Some(seed) = convert_seed(cli.seed, cli.random_seed) {
        config.workload.seed = seed;
    }
    if let Some(order) = cli.order {
        config.workload.generation_order = convert_order(order);
    }

    // Flags only ever switch on; a config file's `true` survives a bare CLI
    config.output.quiet |= cli.quiet;
    config.output.show_grid |= cli.show_grid;
    if let Some(path) = &cli.json_output {
        config.output.json_output = Some(path.clone());
    }

    config.runtime.dry_run |= cli.dry_run;
    config.runtime.debug |= cli.debug;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write;

    #[test]
    fn test_parse_toml_basic() {
        let toml = r#"
[workload]
items_per_worker = 12
service_time_us = 2500
model = "thread"
generation_order = "per_worker"
seed = { fixed = 7 }

[workload.flag_probability]
threshold = 1
range = 4

[workers]
count = 3

[output]
quiet = true
"#;

        let config = parse_toml_string(toml).unwrap();
        assert_eq!(config.workload.items_per_worker, 12);
        assert_eq!(config.workload.service_time(), Duration::from_micros(2500));
        assert_eq!(config.workload.model, ModelSelection::Thread);
        assert_eq!(config.workload.generation_order, GenerationOrder::PerWorker);
        assert_eq!(config.workload.seed, SeedSource::Fixed(7));
        assert_eq!(config.workload.flag_probability, FlagProbability::new(1, 4));
        assert_eq!(config.workers.count, 3);
        assert!(config.output.quiet);
    }

    #[test]
    fn test_parse_toml_empty_uses_defaults() {
        let config = parse_toml_string("").unwrap();
        assert_eq!(config.workers.count, 8);
        assert_eq!(config.workload.items_per_worker, 5);
        assert_eq!(config.workload.seed, SeedSource::Fixed(42));
    }

    #[test]
    fn test_parse_toml_entropy_seed() {
        let config = parse_toml_string("[workload]\nseed = \"entropy\"\n").unwrap();
        assert_eq!(config.workload.seed, SeedSource::Entropy);
    }

    #[test]
    fn test_parse_toml_rejects_unknown_model() {
        assert!(parse_toml_string("[workload]\nmodel = \"coroutine\"\n").is_err());
    }

    #[test]
    fn test_parse_toml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[workers]\ncount = 16").unwrap();

        let config = parse_toml_file(file.path()).unwrap();
        assert_eq!(config.workers.count, 16);
    }

    #[test]
    fn test_parse_toml_file_missing() {
        let err = parse_toml_file(Path::new("/nonexistent/syncbench.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_cli_overrides_config() {
        let config = parse_toml_string("[workers]\ncount = 3\n[workload]\nitems_per_worker = 9\n").unwrap();
        let cli = Cli::try_parse_from(["syncbench", "-w", "6", "--delay", "1ms", "--seed", "11"]).unwrap();

        let merged = merge_cli_with_config(&cli, config).unwrap();
        assert_eq!(merged.workers.count, 6);
        assert_eq!(merged.workload.items_per_worker, 9);
        assert_eq!(merged.workload.service_time_us, 1_000);
        assert_eq!(merged.workload.seed, SeedSource::Fixed(11));
    }

    #[test]
    fn test_merge_keeps_config_flags() {
        let config = parse_toml_string("[output]\nquiet = true\n").unwrap();
        let cli = Cli::try_parse_from(["syncbench"]).unwrap();

        let merged = merge_cli_with_config(&cli, config).unwrap();
        assert!(merged.output.quiet);
    }

    #[test]
    fn test_runtime_debug_from_config_file() {
        let config = parse_toml_string("[runtime]\ndebug = true\n").unwrap();
        let cli = Cli::try_parse_from(["syncbench"]).unwrap();

        let merged = merge_cli_with_config(&cli, config).unwrap();
        assert!(merged.runtime.debug);
    }

    #[test]
    fn test_merge_random_seed() {
        let cli = Cli::try_parse_from(["syncbench", "--random-seed", "--order", "per-worker"]).unwrap();
        let merged = merge_cli_with_config(&cli, Config::default()).unwrap();
        assert_eq!(merged.workload.seed, SeedSource::Entropy);
        assert_eq!(merged.workload.generation_order, GenerationOrder::PerWorker);
    }

    #[test]
    fn test_merge_invalid_delay() {
        let cli = Cli::try_parse_from(["syncbench", "--delay", "soon"]).unwrap();
        assert!(merge_cli_with_config(&cli, Config::default()).is_err());
    }
}
