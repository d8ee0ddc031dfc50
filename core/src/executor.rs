//! Task execution for the embarrassingly parallel preprocessing stage.
//!
//! The preprocessor only talks to [`ParallelMap`], so tests can run it on
//! [`Sequential`] and the binary on a [`ThreadPool`].

use crate::{Error, Result};
use rayon::prelude::*;
use std::any::Any;
use std::num::NonZeroUsize;
use std::panic::{self, AssertUnwindSafe};

/// Applies `f` to every item. Result `i` always belongs to item `i`, and the
/// first failure fails the whole batch.
pub trait ParallelMap {
    fn try_map<T, R, F>(&self, items: &[T], f: F) -> Result<Vec<R>>
    where
        T: Sync,
        R: Send,
        F: Fn(&T) -> Result<R> + Send + Sync;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Sequential;

impl ParallelMap for Sequential {
    fn try_map<T, R, F>(&self, items: &[T], f: F) -> Result<Vec<R>>
    where
        T: Sync,
        R: Send,
        F: Fn(&T) -> Result<R> + Send + Sync,
    {
        items.iter().map(f).collect()
    }
}

/// Fixed-size rayon pool.
pub struct ThreadPool {
    pool: rayon::ThreadPool,
    workers: usize,
}

impl ThreadPool {
    pub fn new(workers: usize) -> Result<Self> {
        let workers = workers.max(1);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("preprocess-{i}"))
            .build()?;
        Ok(Self { pool, workers })
    }

    /// One worker per available processing unit.
    pub fn with_available_parallelism() -> Result<Self> {
        Self::new(available_workers())
    }

    pub fn workers(&self) -> usize { self.workers }
}

impl ParallelMap for ThreadPool {
    fn try_map<T, R, F>(&self, items: &[T], f: F) -> Result<Vec<R>>
    where
        T: Sync,
        R: Send,
        F: Fn(&T) -> Result<R> + Send + Sync,
    {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            self.pool.install(|| {
                items
                    .par_iter()
                    .enumerate()
                    .map(|(i, item)| f(item).map(|r| (i, r)))
                    .collect::<Result<Vec<(usize, R)>>>()
            })
        }));
        let mut tagged = match outcome {
            Ok(res) => res?,
            Err(payload) => return Err(Error::Worker(panic_message(payload.as_ref()))),
        };
        // Re-establish input order from the tags.
        tagged.sort_unstable_by_key(|(i, _)| *i);
        Ok(tagged.into_iter().map(|(_, r)| r).collect())
    }
}

pub fn available_workers() -> usize {
    std::thread::available_parallelism().map(NonZeroUsize::get).unwrap_or(1)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "worker panicked".to_string()
    }
}
