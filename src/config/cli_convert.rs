//! Conversions from CLI argument types to configuration types

use super::cli;
use super::workload::{GenerationOrder, ModelSelection, SeedSource};
use anyhow::{Context, Result};

/// Parse a time string to microseconds (e.g., "100us", "5ms", "1s")
///
/// A bare number is taken as microseconds.
pub fn parse_time_us(s: &str) -> Result<u64> {
    let s = s.trim().to_lowercase();
    if s.is_empty() {
        anyhow::bail!("Empty time string");
    }

    let (num_str, multiplier) = if s.ends_with("us") {
        (s.trim_end_matches("us"), 1u64)
    } else if s.ends_with("ms") {
        (s.trim_end_matches("ms"), 1000)
    } else if s.ends_with('s') {
        (s.trim_end_matches('s'), 1_000_000)
    } else {
        (s.as_str(), 1)
    };

    let num: u64 = num_str
        .trim()
        .parse()
        .with_context(|| format!("Invalid time format: {}", s))?;

    num.checked_mul(multiplier)
        .with_context(|| format!("Time value out of range: {}", s))
}

/// Convert CLI ModelArg to ModelSelection
pub fn convert_model(arg: cli::ModelArg) -> ModelSelection {
    match arg {
        cli::ModelArg::Process => ModelSelection::Process,
        cli::ModelArg::Thread => ModelSelection::Thread,
        cli::ModelArg::Both => ModelSelection::Both,
    }
}

/// Convert CLI OrderArg to GenerationOrder
pub fn convert_order(arg: cli::OrderArg) -> GenerationOrder {
    match arg {
        cli::OrderArg::RowMajor => GenerationOrder::RowMajor,
        cli::OrderArg::PerWorker => GenerationOrder::PerWorker,
    }
}

/// Seed source requested on the command line, if any
pub fn convert_seed(seed: Option<u64>, random_seed: bool) -> Option<SeedSource> {
    match (seed, random_seed) {
        (Some(seed), _) => Some(SeedSource::Fixed(seed)),
        (None, true) => Some(SeedSource::Entropy),
        (None, false) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_time_us() {
        assert_eq!(parse_time_us("100ms").unwrap(), 100_000);
        assert_eq!(parse_time_us("250us").unwrap(), 250);
        assert_eq!(parse_time_us("2s").unwrap(), 2_000_000);
        assert_eq!(parse_time_us("42").unwrap(), 42);
        assert_eq!(parse_time_us(" 5MS ").unwrap(), 5_000);
        assert_eq!(parse_time_us("0ms").unwrap(), 0);
    }

    #[test]
    fn test_parse_time_us_errors() {
        assert!(parse_time_us("").is_err());
        assert!(parse_time_us("fast").is_err());
        assert!(parse_time_us("-5ms").is_err());
        assert!(parse_time_us("99999999999999999999s").is_err());
    }

    #[test]
    fn test_convert_seed() {
        assert_eq!(convert_seed(Some(9), false), Some(SeedSource::Fixed(9)));
        assert_eq!(convert_seed(None, true), Some(SeedSource::Entropy));
        assert_eq!(convert_seed(None, false), None);
    }

    #[test]
    fn test_convert_enums() {
        assert_eq!(convert_model(cli::ModelArg::Both), ModelSelection::Both);
        assert_eq!(convert_order(cli::OrderArg::PerWorker), GenerationOrder::PerWorker);
    }
}
