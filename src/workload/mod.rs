//! Deterministic workload generation
//!
//! The workload is a [`DecisionGrid`]: one row per worker, one boolean per
//! item, drawn up front from a seeded xoshiro256++ stream. Workers never draw
//! random numbers themselves, so every execution model sees exactly the same
//! decisions and must end with the same total.
//!
//! # Generation order
//!
//! [`GenerationOrder::RowMajor`] threads a single stream through the cells in
//! order (worker 0 item 0, worker 0 item 1, ..., worker 1 item 0, ...). This
//! ordering is what makes runs comparable across models and across repeated
//! runs, and it is the default.
//!
//! [`GenerationOrder::PerWorker`] gives each row its own stream, split off the
//! seeded generator with `jump()`. No generator state is shared between rows.
//!
//! # Example
//!
//! ```
//! use syncbench::workload::WorkloadGenerator;
//!
//! let grid = WorkloadGenerator::new(42).generate(8, 5);
//! assert_eq!(grid.dimensions(), (8, 5));
//! assert_eq!(grid, WorkloadGenerator::new(42).generate(8, 5));
//! ```

pub mod grid;

pub use grid::DecisionGrid;

use crate::config::workload::{FlagProbability, GenerationOrder};
use rand::Rng;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

/// Seeded generator for decision grids
#[derive(Debug, Clone)]
pub struct WorkloadGenerator {
    seed: u64,
    probability: FlagProbability,
    order: GenerationOrder,
}

impl WorkloadGenerator {
    /// Generator with the default 3-in-10 flag probability and row-major order
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            probability: FlagProbability::default(),
            order: GenerationOrder::RowMajor,
        }
    }

    pub fn with_probability(mut self, probability: FlagProbability) -> Self {
        self.probability = probability;
        self
    }

    pub fn with_order(mut self, order: GenerationOrder) -> Self {
        self.order = order;
        self
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Generate a `workers` x `items` grid
    pub fn generate(&self, workers: usize, items: usize) -> DecisionGrid {
        let mut cells = Vec::with_capacity(workers * items);
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(self.seed);

        match self.order {
            GenerationOrder::RowMajor => {
                for _ in 0..workers * items {
                    cells.push(self.draw(&mut rng));
                }
            }
            GenerationOrder::PerWorker => {
                for _ in 0..workers {
                    let mut row_rng = rng.clone();
                    rng.jump();
                    for _ in 0..items {
                        cells.push(self.draw(&mut row_rng));
                    }
                }
            }
        }

        DecisionGrid::from_cells(workers, items, cells)
    }

    #[inline]
    fn draw(&self, rng: &mut Xoshiro256PlusPlus) -> bool {
        if self.probability.range == 0 {
            return false;
        }
        rng.gen_range(0..self.probability.range) < self.probability.threshold
    }
}

/// Shorthand for `WorkloadGenerator::new(seed).generate(workers, items)`
pub fn generate(seed: u64, workers: usize, items: usize) -> DecisionGrid {
    WorkloadGenerator::new(seed).generate(workers, items)
}
