//! Bounded task pool with join-all and per-task isolation.
//!
//! Every task runs to completion. A task that returns an error or panics
//! yields an `Err` in its own slot; the other slots are unaffected. Results
//! come back in submission order.

use std::panic::{self, AssertUnwindSafe};

#[cfg(feature = "parallel")]
use rayon::prelude::*;
#[cfg(feature = "parallel")]
use tracing::warn;

use crate::error::{Error, Result};

/// Runs independent tasks, concurrently when the `parallel` feature is on.
#[derive(Debug)]
pub struct TaskPool {
    #[cfg(feature = "parallel")]
    pool: Option<rayon::ThreadPool>,
    threads: usize,
}

impl TaskPool {
    /// Pool sized to the host's available parallelism.
    pub fn new() -> Self {
        let threads = std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get);
        Self::with_threads(threads)
    }

    /// Pool with at most `threads` workers. One worker runs tasks inline.
    pub fn with_threads(threads: usize) -> Self {
        let threads = threads.max(1);

        #[cfg(feature = "parallel")]
        {
            let pool = if threads > 1 {
                match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
                    Ok(pool) => Some(pool),
                    Err(e) => {
                        warn!(error = %e, "worker pool unavailable, running tasks inline");
                        None
                    }
                }
            } else {
                None
            };
            let threads = if pool.is_some() { threads } else { 1 };
            Self { pool, threads }
        }

        #[cfg(not(feature = "parallel"))]
        {
            Self { threads: 1 }
        }
    }

    /// A pool that always runs tasks inline on the caller's thread.
    pub fn sequential() -> Self {
        Self::with_threads(1)
    }

    /// Worker count.
    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Run `f` over every task and wait for all of them.
    pub fn join_all<T, R, F>(&self, tasks: Vec<T>, f: F) -> Vec<Result<R>>
    where
        T: Send,
        R: Send,
        F: Fn(T) -> Result<R> + Sync,
    {
        #[cfg(feature = "parallel")]
        {
            if let Some(pool) = &self.pool {
                return pool.install(|| tasks.into_par_iter().map(|t| isolate(&f, t)).collect());
            }
        }

        tasks.into_iter().map(|t| isolate(&f, t)).collect()
    }
}

impl Default for TaskPool {
    fn default() -> Self {
        Self::new()
    }
}

fn isolate<T, R, F>(f: &F, task: T) -> Result<R>
where
    F: Fn(T) -> Result<R>,
{
    match panic::catch_unwind(AssertUnwindSafe(|| f(task))) {
        Ok(result) => result,
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| (*s).to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            Err(Error::Clustering(format!("task panicked: {message}")))
        }
    }
}
