//! Parallel execution configuration
//!
//! Column-independent work (equality columns, expansion targets, row
//! selection) moves to the Rayon pool once the amount of cell work crosses a
//! configurable threshold. Intra-column ordering is never affected: the unit
//! of parallel work is always a whole column.

use std::sync::atomic::{AtomicUsize, Ordering};

/// Default threshold for automatic parallelization (10,000 cells)
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 10_000;

static PARALLEL_THRESHOLD: AtomicUsize = AtomicUsize::new(DEFAULT_PARALLEL_THRESHOLD);

/// Get the current parallel threshold
#[must_use]
pub fn parallel_threshold() -> usize {
    PARALLEL_THRESHOLD.load(Ordering::Relaxed)
}

/// Set the parallel threshold.
///
/// Operations touching more cells than this run on the thread pool. Set to 0
/// to always parallelize, or `usize::MAX` to disable parallelization.
pub fn set_parallel_threshold(threshold: usize) {
    PARALLEL_THRESHOLD.store(threshold, Ordering::Relaxed);
}

/// Check if the given amount of cell work should run in parallel
#[must_use]
pub fn should_parallelize(num_cells: usize) -> bool {
    num_cells > parallel_threshold()
}

/// Configuration builder for parallel execution
#[derive(Debug, Clone)]
pub struct ParallelConfig {
    /// Minimum cell count to trigger parallelization
    pub threshold: usize,
    /// Number of worker threads (None = Rayon default)
    pub num_threads: Option<usize>,
}

impl Default for ParallelConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_PARALLEL_THRESHOLD,
            num_threads: None,
        }
    }
}

impl ParallelConfig {
    /// Create a new parallel configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the parallelization threshold
    #[must_use]
    pub fn with_threshold(mut self, threshold: usize) -> Self {
        self.threshold = threshold;
        self
    }

    /// Set the number of worker threads
    #[must_use]
    pub fn with_num_threads(mut self, num_threads: usize) -> Self {
        self.num_threads = Some(num_threads);
        self
    }

    /// Apply this configuration globally
    pub fn apply(&self) {
        set_parallel_threshold(self.threshold);
        if let Some(threads) = self.num_threads {
            let _ = rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build_global();
        }
    }
}
