//! End-to-end benchmark runs through the public API

use std::sync::Arc;
use std::time::Duration;

use syncbench::config::toml::parse_toml_string;
use syncbench::config::validator::validate_config;
use syncbench::config::workload::{FlagProbability, GenerationOrder, ModelSelection, SeedSource};
use syncbench::coordinator::{Coordinator, EventOutput, WorkerOptions};
use syncbench::counter::process::{ipc_object_exists, IpcObject, ProcessCounter};
use syncbench::counter::SharedCounter;
use syncbench::worker::sink::MemorySink;
use syncbench::worker::WorkerEvent;
use syncbench::workload::{self, WorkloadGenerator};
use syncbench::ExecutionModel;

fn silent(service_time: Duration) -> WorkerOptions {
    WorkerOptions {
        service_time,
        events: EventOutput::Silent,
    }
}

#[test]
fn test_models_agree_with_direct_count() {
    for seed in [0u64, 1, 42, 9_999] {
        let grid = workload::generate(seed, 6, 7);
        let expected = grid.count_flagged();
        let coordinator = Coordinator::new(grid, seed, silent(Duration::ZERO));

        let results = coordinator.compare().unwrap();
        let totals: Vec<u64> = results.iter().map(|r| r.total_flagged).collect();
        assert_eq!(totals, vec![expected, expected], "seed {}", seed);
    }
}

#[test]
fn test_generation_is_reproducible() {
    assert_eq!(workload::generate(42, 8, 5), workload::generate(42, 8, 5));

    let per_worker = WorkloadGenerator::new(42).with_order(GenerationOrder::PerWorker);
    assert_eq!(per_worker.generate(8, 5), per_worker.generate(8, 5));
}

#[test]
fn test_concrete_scenario() {
    let grid = workload::generate(42, 8, 5);
    let expected = grid.count_flagged();
    let coordinator = Coordinator::new(grid, 42, silent(Duration::from_millis(5)));

    for result in coordinator.compare().unwrap() {
        assert_eq!(result.total_flagged, expected);
        assert!(result.elapsed >= Duration::from_millis(25));
        assert!(result.elapsed_ms() >= 25.0);
    }
}

#[test]
fn test_thread_events_match_grid() {
    let grid = workload::generate(5, 4, 6);
    let expected = grid.count_flagged();
    let sink = Arc::new(MemorySink::new());
    let options = WorkerOptions {
        service_time: Duration::ZERO,
        events: EventOutput::Custom(sink.clone()),
    };

    let result = Coordinator::new(grid, 5, options)
        .run(ExecutionModel::Thread)
        .unwrap();
    assert_eq!(result.total_flagged, expected);

    let events = sink.events();
    let progress = events
        .iter()
        .filter(|e| matches!(e, WorkerEvent::Processing { .. }))
        .count();
    let mut totals: Vec<u64> = events
        .iter()
        .filter_map(|e| match e {
            WorkerEvent::Flagged { total, .. } => Some(*total),
            _ => None,
        })
        .collect();
    let finished = events
        .iter()
        .filter(|e| matches!(e, WorkerEvent::Finished { .. }))
        .count();

    assert_eq!(progress, 24);
    assert_eq!(finished, 4);
    totals.sort_unstable();
    assert_eq!(totals, (1..=expected).collect::<Vec<_>>());
}

#[test]
fn test_dropped_process_counter_releases_ipc() {
    let counter = ProcessCounter::create(0).unwrap();
    let shm = IpcObject::SharedMemory(counter.shm_id());
    let sem = IpcObject::Semaphore(counter.sem_id());
    counter.increment().unwrap();
    assert!(ipc_object_exists(shm));
    assert!(ipc_object_exists(sem));

    drop(counter);
    assert!(!ipc_object_exists(shm));
    assert!(!ipc_object_exists(sem));
}

#[test]
fn test_config_file_drives_run() {
    let config = parse_toml_string(
        r#"
[workload]
items_per_worker = 4
service_time_us = 0
model = "thread"
seed = { fixed = 17 }

[workload.flag_probability]
threshold = 1
range = 2

[workers]
count = 5

[output]
quiet = true
"#,
    )
    .unwrap();
    validate_config(&config).unwrap();
    assert_eq!(config.workload.seed, SeedSource::Fixed(17));
    assert_eq!(config.workload.flag_probability, FlagProbability::new(1, 2));

    let coordinator = Coordinator::from_config(&config);
    assert_eq!(coordinator.seed(), 17);
    assert_eq!(coordinator.grid().dimensions(), (5, 4));

    let results = coordinator.run_selection(config.workload.model).unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].model, ExecutionModel::Thread);
    assert_eq!(results[0].total_flagged, coordinator.grid().count_flagged());
    assert_eq!(ModelSelection::Thread, config.workload.model);
}
