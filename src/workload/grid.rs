//! Immutable decision grid

use std::fmt;

/// Pre-generated per-worker, per-item flag decisions
///
/// Stored row-major: row `w` holds the decisions for worker `w`. The grid is
/// never mutated after generation; workers only ever read their own row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecisionGrid {
    cells: Vec<bool>,
    workers: usize,
    items: usize,
}

impl DecisionGrid {
    /// Build a grid from row-major cells
    ///
    /// # Panics
    ///
    /// Panics if `cells.len() != workers * items`.
    pub fn from_cells(workers: usize, items: usize, cells: Vec<bool>) -> Self {
        assert_eq!(
            cells.len(),
            workers * items,
            "grid of {}x{} needs {} cells, got {}",
            workers,
            items,
            workers * items,
            cells.len()
        );
        Self { cells, workers, items }
    }

    /// Build a grid from explicit rows (mainly for tests)
    pub fn from_rows(rows: &[Vec<bool>]) -> Self {
        let workers = rows.len();
        let items = rows.first().map(|r| r.len()).unwrap_or(0);
        let mut cells = Vec::with_capacity(workers * items);
        for row in rows {
            assert_eq!(row.len(), items, "all rows must have the same length");
            cells.extend_from_slice(row);
        }
        Self { cells, workers, items }
    }

    /// Number of workers (rows)
    #[inline]
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Number of items per worker (columns)
    #[inline]
    pub fn items(&self) -> usize {
        self.items
    }

    /// (workers, items)
    pub fn dimensions(&self) -> (usize, usize) {
        (self.workers, self.items)
    }

    /// Decisions for one worker
    ///
    /// # Panics
    ///
    /// Panics if `worker_id >= self.workers()`.
    #[inline]
    pub fn row(&self, worker_id: usize) -> &[bool] {
        let start = worker_id * self.items;
        &self.cells[start..start + self.items]
    }

    /// Single decision, or `None` when out of range
    pub fn get(&self, worker_id: usize, item_index: usize) -> Option<bool> {
        if worker_id >= self.workers || item_index >= self.items {
            return None;
        }
        Some(self.cells[worker_id * self.items + item_index])
    }

    /// Number of `true` cells; the value every run must end with
    pub fn count_flagged(&self) -> u64 {
        self.cells.iter().filter(|&&c| c).count() as u64
    }
}

impl fmt::Display for DecisionGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for worker in 0..self.workers {
            write!(f, "worker {:>3}: ", worker)?;
            for &cell in self.row(worker) {
                f.write_str(if cell { "X" } else { "." })?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
