//! syncbench CLI entry point

use anyhow::{Context, Result};
use syncbench::config::{cli::Cli, toml, validator, Config};
use syncbench::coordinator::Coordinator;
use syncbench::output::{json, text};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let cli = Cli::parse_args();

    println!("syncbench v{}", env!("CARGO_PKG_VERSION"));
    println!("Process vs thread synchronization micro-benchmark");
    println!();

    cli.validate()?;

    // Logging waits for the merged config so `[runtime] debug` applies too
    let config = build_config(&cli)?;
    init_logging(config.runtime.debug);
    if let Some(path) = &cli.config {
        info!(path = %path.display(), "configuration file loaded");
    }

    validator::validate_config(&config).context("Configuration validation failed")?;
    debug!(?config, "configuration resolved");

    run(config)
}

/// Install the stderr subscriber; `RUST_LOG` wins over `--debug`
fn init_logging(debug: bool) {
    let default = if debug {
        "warn,syncbench=debug"
    } else {
        "warn,syncbench=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Defaults, then the TOML file if given, then CLI overrides
fn build_config(cli: &Cli) -> Result<Config> {
    let base = match &cli.config {
        Some(path) => toml::parse_toml_file(path)?,
        None => Config::default(),
    };

    toml::merge_cli_with_config(cli, base)
}

fn run(config: Config) -> Result<()> {
    let coordinator = Coordinator::from_config(&config);
    let seed = coordinator.seed();

    text::print_configuration(&config, seed);
    if config.output.show_grid {
        text::print_grid(coordinator.grid());
    }

    if config.runtime.dry_run {
        println!("Dry run mode - configuration validated successfully");
        return Ok(());
    }

    let mut results = Vec::new();
    for model in config.workload.model.models() {
        println!("Running {} model...", model);
        let result = coordinator
            .run(model)
            .map_err(|err| {
                if err.is_resource_exhaustion() {
                    warn!("System V IPC limits reached; see `ipcs -l` and `ipcs -a`");
                }
                err
            })
            .with_context(|| format!("{} model run failed", model))?;
        text::print_results(&result);
        println!();
        results.push(result);
    }

    text::print_comparison(&results);

    if let Some(path) = &config.output.json_output {
        let report = json::build_report(&config, seed, &results);
        json::write_json_output(path, &report, true)?;
        info!(path = %path.display(), "JSON report written");
    }

    if let Some(bad) = results.iter().find(|r| !r.is_consistent()) {
        anyhow::bail!(
            "{} model counted {} flagged items, grid has {}",
            bad.model,
            bad.total_flagged,
            bad.expected_flagged
        );
    }

    Ok(())
}
