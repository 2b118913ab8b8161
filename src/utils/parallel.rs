//! Worker pool for the column-wise linear programs.
//!
//! Every estimator call solves one independent problem per matrix column.
//! [`WorkerPool`] owns a bounded Rayon thread pool and maps a fallible task
//! over column indices, placing each result at its own index so that the
//! assembled matrix never depends on completion order.

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::error::{LrpcError, Result};

/// Upper bound on the default number of worker threads.
const MAX_DEFAULT_CORES: usize = 3;

/// Default pool size: one core less than available, at most three, at least one.
pub fn default_core_count() -> usize {
    let available = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    available.saturating_sub(1).clamp(1, MAX_DEFAULT_CORES)
}

/// A bounded worker pool scoped to one top-level estimation call.
///
/// The pool is torn down when the value is dropped, so acquiring it at the
/// start of a call and passing it by reference to the inner loops releases it
/// on every exit path.
pub struct WorkerPool {
    pool: ThreadPool,
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("threads", &self.pool.current_num_threads())
            .finish()
    }
}

impl WorkerPool {
    /// Create a pool with `n_cores` worker threads.
    ///
    /// # Arguments
    ///
    /// * `n_cores` - Number of threads; must be positive
    ///
    /// # Returns
    ///
    /// * `Result<WorkerPool>` - The pool, or an error if `n_cores` is zero or
    ///   the threads cannot be spawned
    pub fn new(n_cores: usize) -> Result<Self> {
        if n_cores == 0 {
            return Err(LrpcError::InvalidConfig(
                "worker pool size must be positive".to_string(),
            ));
        }

        let pool = ThreadPoolBuilder::new()
            .num_threads(n_cores)
            .thread_name(|i| format!("lrpc-column-{}", i))
            .build()?;

        log::debug!("created worker pool with {} threads", n_cores);
        Ok(Self { pool })
    }

    /// Create a pool with [`default_core_count`] threads.
    pub fn with_default_size() -> Result<Self> {
        Self::new(default_core_count())
    }

    /// Number of worker threads.
    pub fn size(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Run `task` for every index in `0..n` on the pool.
    ///
    /// Results are returned in index order: entry `i` of the output is the
    /// value produced by `task(i)`, whatever order the workers finished in.
    /// The first failing task fails the whole call.
    ///
    /// # Arguments
    ///
    /// * `n` - Number of tasks
    /// * `task` - The task to run for each index
    ///
    /// # Returns
    ///
    /// * `Result<Vec<T>>` - One result per index, positionally merged
    pub fn map_indexed<T, F>(&self, n: usize, task: F) -> Result<Vec<T>>
    where
        T: Send,
        F: Fn(usize) -> Result<T> + Sync + Send,
    {
        let tagged: Result<Vec<(usize, T)>> = self.pool.install(|| {
            (0..n)
                .into_par_iter()
                .map(|i| task(i).map(|value| (i, value)))
                .collect()
        });

        let mut slots: Vec<Option<T>> = (0..n).map(|_| None).collect();
        for (i, value) in tagged? {
            slots[i] = Some(value);
        }

        slots
            .into_iter()
            .enumerate()
            .map(|(i, slot)| {
                slot.ok_or_else(|| {
                    LrpcError::InvalidInput(format!("task {} produced no result", i))
                })
            })
            .collect()
    }

    /// Run `task` for each listed index, returning `(index, result)` pairs in
    /// the order the indices were given.
    pub fn map_subset<T, F>(&self, indices: &[usize], task: F) -> Result<Vec<(usize, T)>>
    where
        T: Send,
        F: Fn(usize) -> Result<T> + Sync + Send,
    {
        let results = self.map_indexed(indices.len(), |k| task(indices[k]))?;
        Ok(indices.iter().copied().zip(results).collect())
    }
}
