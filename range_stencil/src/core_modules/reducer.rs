// THEORY:
// The `ParallelReducer` is the locking half of the engine. It folds an indexed workload
// into one aggregate value using one scoped thread per range:
//
// 1.  **Local first**: each worker clones the identity and folds every index of its range
//     into that thread-private value. No lock is held while computing.
// 2.  **Merge once**: when its range is exhausted the worker takes the accumulator lock
//     exactly once, merges its partial result, and releases it.
// 3.  **Caller-owned accumulator**: the `Accumulator` is created by the caller before any
//     worker starts, borrowed by the workers, and only read after every worker has joined.
//     There is no process-wide state.
//
// Merge order follows thread completion and is therefore unspecified. Results are
// deterministic only when the merge is associative and commutative (up to floating-point
// rounding for sums); callers that need a stable order must add their own post-join step.

use crate::config::WorkerCount;
use crate::core_modules::partition::{Range, partition};
use crate::core_modules::scoped::run_scoped;
use crate::error::Result;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, info};

/// A lock-guarded aggregate shared by reducer workers.
#[derive(Debug, Default)]
pub struct Accumulator<R> {
    value: Mutex<R>,
    merges: AtomicUsize,
}

impl<R> Accumulator<R> {
    pub fn new(initial: R) -> Self {
        Self {
            value: Mutex::new(initial),
            merges: AtomicUsize::new(0),
        }
    }

    /// Merges one partial result inside the critical section.
    pub fn merge<M>(&self, partial: R, merge: M)
    where
        M: FnOnce(&mut R, R),
    {
        // Poisoning only follows a worker panic, which already fails the run.
        let mut shared = self.value.lock().unwrap_or_else(|e| e.into_inner());
        merge(&mut shared, partial);
        drop(shared);
        self.merges.fetch_add(1, Ordering::Relaxed);
    }

    /// Number of partial results merged so far.
    pub fn merges(&self) -> usize {
        self.merges.load(Ordering::Relaxed)
    }

    /// Consumes the accumulator once every worker has joined.
    pub fn into_inner(self) -> R {
        self.value.into_inner().unwrap_or_else(|e| e.into_inner())
    }
}

pub struct ParallelReducer {
    workers: WorkerCount,
}

impl ParallelReducer {
    pub fn new(workers: WorkerCount) -> Self {
        Self { workers }
    }

    /// The ranges a run over `extent` units is split into.
    pub fn plan(&self, extent: usize) -> Vec<Range> {
        partition(extent, self.workers)
    }

    /// Folds every index of `[0, extent)` into `accumulator`.
    ///
    /// Each worker starts from `identity.clone()`, applies `fold` to each index of its
    /// range, then calls `merge` on the accumulator exactly once. Returns the number of
    /// workers that ran.
    pub fn fold<R, F, M>(
        &self,
        extent: usize,
        identity: &R,
        fold: F,
        merge: M,
        accumulator: &Accumulator<R>,
    ) -> Result<usize>
    where
        R: Clone + Send + Sync,
        F: Fn(&mut R, usize) + Sync,
        M: Fn(&mut R, R) + Sync,
    {
        let ranges = self.plan(extent);
        let spawned = ranges.len();
        if spawned == 0 {
            return Ok(0);
        }

        info!(extent, workers = spawned, "starting reduction");

        run_scoped("reduce-worker", ranges, |worker, range: Range| {
            debug!(worker, start = range.start, end = range.end, "reduce worker started");
            let mut local = identity.clone();
            for index in range.indices() {
                fold(&mut local, index);
            }
            accumulator.merge(local, &merge);
        })?;

        Ok(spawned)
    }

    /// Combines `per_element(i)` for every `i` in `[0, extent)` starting from `identity`.
    ///
    /// `combine` must be associative and commutative for the result to be independent of
    /// the worker count.
    pub fn reduce<R, P, C>(
        &self,
        extent: usize,
        per_element: P,
        combine: C,
        identity: R,
    ) -> Result<R>
    where
        R: Clone + Send + Sync,
        P: Fn(usize) -> R + Sync,
        C: Fn(R, R) -> R + Sync,
    {
        let accumulator = Accumulator::new(identity.clone());
        let fold_step = |local: &mut R, index: usize| {
            let current = std::mem::replace(local, identity.clone());
            *local = combine(current, per_element(index));
        };
        let merge_step = |shared: &mut R, partial: R| {
            let current = std::mem::replace(shared, identity.clone());
            *shared = combine(current, partial);
        };

        self.fold(extent, &identity, fold_step, merge_step, &accumulator)?;
        Ok(accumulator.into_inner())
    }
}
