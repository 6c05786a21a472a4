//! Worker pool for parallel phases.
//!
//! A dedicated `rayon` pool sized by `max_workers`. The phase barrier is the
//! `barrier` call itself: it returns only once every item has been processed.

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

use nova_contracts::error::{NovaError, NovaResult};

pub struct WorkerPool {
    pool: ThreadPool,
    workers: usize,
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("workers", &self.workers)
            .finish_non_exhaustive()
    }
}

impl WorkerPool {
    /// Build a pool with `workers` threads. Zero is a configuration error.
    pub fn new(workers: usize) -> NovaResult<Self> {
        if workers == 0 {
            return Err(NovaError::ConfigError {
                reason: "max_workers must be at least 1".to_string(),
            });
        }
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("nova-worker-{i}"))
            .build()
            .map_err(|e| NovaError::ConfigError {
                reason: format!("failed to build worker pool: {}", e),
            })?;
        Ok(Self { pool, workers })
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Run `f` on every item concurrently and wait for all of them.
    ///
    /// Results come back in input order, whatever order the work finished in.
    pub fn barrier<T, R, F>(&self, items: &[T], f: F) -> Vec<R>
    where
        T: Sync,
        R: Send,
        F: Fn(&T) -> R + Sync,
    {
        self.pool.install(|| items.par_iter().map(&f).collect())
    }
}
