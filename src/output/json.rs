//! JSON output formatting
//!
//! One report per invocation: the configuration that produced the grid and
//! one entry per execution model that ran over it.

use crate::config::workload::GenerationOrder;
use crate::config::Config;
use crate::coordinator::BenchmarkResult;
use crate::Result;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Duration;

/// Duration with both microseconds and human-readable format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonDuration {
    pub micros: u64,
    pub millis: f64,
    pub human: String,
}

impl JsonDuration {
    pub fn from_duration(d: Duration) -> Self {
        Self {
            micros: d.as_micros() as u64,
            millis: crate::util::time::duration_ms(d),
            human: crate::util::time::format_duration(d),
        }
    }
}

/// Workload parameters shared by every run in the report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonTestConfig {
    pub workers: usize,
    pub items_per_worker: usize,
    pub service_time: JsonDuration,
    pub flag_threshold: u32,
    pub flag_range: u32,
    pub seed: u64,
    pub generation_order: GenerationOrder,
}

/// One execution model's outcome
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRunResult {
    pub model: String,
    pub total_flagged: u64,
    pub expected_flagged: u64,
    pub consistent: bool,
    pub elapsed: JsonDuration,
    pub service_floor: JsonDuration,
    /// RFC 3339 wall-clock time the run started
    pub start_time: String,
}

impl From<&BenchmarkResult> for JsonRunResult {
    fn from(result: &BenchmarkResult) -> Self {
        Self {
            model: result.model.to_string(),
            total_flagged: result.total_flagged,
            expected_flagged: result.expected_flagged,
            consistent: result.is_consistent(),
            elapsed: JsonDuration::from_duration(result.elapsed),
            service_floor: JsonDuration::from_duration(result.service_floor()),
            start_time: result.started_at.to_rfc3339(),
        }
    }
}

/// Complete JSON report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonReport {
    pub version: String,
    pub cpus: usize,
    pub config: JsonTestConfig,
    pub runs: Vec<JsonRunResult>,
}

/// Build the report for `results`, all produced from the same grid
pub fn build_report(config: &Config, seed: u64, results: &[BenchmarkResult]) -> JsonReport {
    let workload = &config.workload;
    JsonReport {
        version: env!("CARGO_PKG_VERSION").to_string(),
        cpus: crate::util::num_cpus(),
        config: JsonTestConfig {
            workers: config.workers.count,
            items_per_worker: workload.items_per_worker,
            service_time: JsonDuration::from_duration(workload.service_time()),
            flag_threshold: workload.flag_probability.threshold,
            flag_range: workload.flag_probability.range,
            seed,
            generation_order: workload.generation_order,
        },
        runs: results.iter().map(JsonRunResult::from).collect(),
    }
}

/// Write JSON output to file
pub fn write_json_output(output_path: &Path, report: &JsonReport, pretty: bool) -> Result<()> {
    let file = File::create(output_path)
        .with_context(|| format!("Failed to create JSON output: {}", output_path.display()))?;
    let mut writer = BufWriter::new(file);

    if pretty {
        serde_json::to_writer_pretty(&mut writer, report)?;
    } else {
        serde_json::to_writer(&mut writer, report)?;
    }

    writer
        .flush()
        .with_context(|| format!("Failed to write JSON output: {}", output_path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::workload::ExecutionModel;
    use chrono::{TimeZone, Utc};

    fn sample(model: ExecutionModel, flagged: u64) -> BenchmarkResult {
        BenchmarkResult {
            model,
            workers: 8,
            items_per_worker: 5,
            seed: 42,
            service_time: Duration::from_millis(100),
            total_flagged: flagged,
            expected_flagged: 12,
            elapsed: Duration::from_micros(512_500),
            started_at: Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_json_duration() {
        let d = JsonDuration::from_duration(Duration::from_micros(2500));
        assert_eq!(d.micros, 2500);
        assert_eq!(d.millis, 2.5);
        assert_eq!(d.human, "2.50ms");
    }

    #[test]
    fn test_run_result_conversion() {
        let run = JsonRunResult::from(&sample(ExecutionModel::Thread, 11));
        assert_eq!(run.model, "thread");
        assert!(!run.consistent);
        assert_eq!(run.elapsed.micros, 512_500);
        assert_eq!(run.service_floor.micros, 500_000);
        assert_eq!(run.start_time, "2026-03-01T12:00:00+00:00");
    }

    #[test]
    fn test_write_json_output() {
        let config = Config::default();
        let results = vec![
            sample(ExecutionModel::Process, 12),
            sample(ExecutionModel::Thread, 12),
        ];
        let report = build_report(&config, 42, &results);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        write_json_output(&path, &report, true).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["config"]["workers"], 8);
        assert_eq!(value["config"]["seed"], 42);
        assert_eq!(value["config"]["generation_order"], "row_major");
        assert_eq!(value["runs"].as_array().unwrap().len(), 2);
        assert_eq!(value["runs"][0]["model"], "process");
        assert_eq!(value["runs"][1]["total_flagged"], 12);
        assert_eq!(value["runs"][1]["consistent"], true);
    }

    #[test]
    fn test_write_json_output_reports_write_failure() {
        let report = build_report(&Config::default(), 42, &[]);
        let err = write_json_output(Path::new("/dev/full"), &report, true).unwrap_err();
        assert!(err.to_string().contains("Failed to write JSON output"));
    }

    #[test]
    fn test_write_json_output_bad_path() {
        let report = build_report(&Config::default(), 42, &[]);
        let err = write_json_output(Path::new("/nonexistent/dir/report.json"), &report, false)
            .unwrap_err();
        assert!(err.to_string().contains("Failed to create JSON output"));
    }
}
