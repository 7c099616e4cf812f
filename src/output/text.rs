//! Human-readable text output

use crate::config::Config;
use crate::coordinator::BenchmarkResult;
use crate::util::time::{format_duration, format_millis, speedup};
use crate::workload::DecisionGrid;

const RULE: &str = "═══════════════════════════════════════════════════════════";

fn banner(title: &str) {
    println!("{}", RULE);
    println!("{:^59}", title);
    println!("{}", RULE);
}

/// Print the effective configuration before a run
///
/// `seed` is the resolved seed, which differs from the configured one when
/// the seed is derived at start.
pub fn print_configuration(config: &Config, seed: u64) {
    println!("{}", config);
    println!("  Resolved seed:    {}", seed);
    println!("  Logical CPUs:     {}", crate::util::num_cpus());
    println!();
}

/// Print the decision grid, one row per worker
pub fn print_grid(grid: &DecisionGrid) {
    let (workers, items) = grid.dimensions();
    println!(
        "Decision grid ({} x {}, {} flagged):",
        workers,
        items,
        grid.count_flagged()
    );
    print!("{}", grid);
    println!();
}

/// Two-line run summary: flagged total and elapsed milliseconds
pub fn summary_lines(result: &BenchmarkResult) -> [String; 2] {
    [
        format!("Total flagged: {}", result.total_flagged),
        format!(
            "Elapsed time ({}): {}",
            result.model,
            format_millis(result.elapsed)
        ),
    ]
}

/// Print the summary for one run
pub fn print_results(result: &BenchmarkResult) {
    println!();
    println!("[{}]", result.model.label());
    for line in summary_lines(result) {
        println!("{}", line);
    }

    if !result.is_consistent() {
        println!(
            "  WARNING: counter {} != flagged cells {}",
            result.total_flagged, result.expected_flagged
        );
    }
}

/// Print a side-by-side comparison when more than one model ran
pub fn print_comparison(results: &[BenchmarkResult]) {
    if results.len() < 2 {
        return;
    }

    println!();
    banner("COMPARISON");
    println!(
        "  {:<10} {:>10} {:>14} {:>12}",
        "Model", "Flagged", "Elapsed", "Floor"
    );
    for result in results {
        println!(
            "  {:<10} {:>10} {:>14} {:>12}",
            result.model.to_string(),
            result.total_flagged,
            format_millis(result.elapsed),
            format_duration(result.service_floor())
        );
    }

    let baseline = &results[0];
    for candidate in &results[1..] {
        if let Some(ratio) = speedup(baseline.elapsed, candidate.elapsed) {
            println!(
                "  {} vs {}: {:.2}x",
                candidate.model,
                baseline.model,
                ratio
            );
        }
    }

    let agree = results
        .iter()
        .all(|r| r.total_flagged == baseline.total_flagged && r.is_consistent());
    println!(
        "  Totals: {}",
        if agree { "consistent" } else { "MISMATCH" }
    );
    println!("{}", RULE);
}
