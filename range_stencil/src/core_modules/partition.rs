// THEORY:
// The partitioner turns an extent (rows, samples, iterations) and a worker count into the
// half-open ranges each worker owns. It is the only place that decides who touches what,
// so both parallel patterns inherit its guarantees:
//
// 1.  **Exact cover**: the ranges are contiguous, in increasing order, and together cover
//     `[0, extent)` with no gaps and no overlaps.
// 2.  **Balance**: `extent % workers` leftover units go one each to the first ranges, so
//     range lengths differ by at most one.
// 3.  **No idle workers**: the worker count is clamped to the extent. Every returned
//     range is non-empty and an empty extent produces no ranges at all.
// 4.  **Determinism**: the result depends only on the two inputs, never on scheduling.

use crate::config::WorkerCount;
use crate::error::{Result, StencilError};
use std::ops;

/// A half-open interval `[start, end)` of work-unit indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Range {
    pub start: usize,
    pub end: usize,
}

impl Range {
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end, "range start {start} past end {end}");
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn contains(&self, index: usize) -> bool {
        self.start <= index && index < self.end
    }

    pub fn indices(&self) -> ops::Range<usize> {
        self.start..self.end
    }
}

/// Splits `[0, extent)` among at most `workers` workers.
pub fn partition(extent: usize, workers: WorkerCount) -> Vec<Range> {
    let effective = workers.clamp_to(extent);
    if effective == 0 {
        return Vec::new();
    }

    let base = extent / effective;
    let remainder = extent % effective;
    let mut ranges = Vec::with_capacity(effective);
    let mut start = 0;

    for i in 0..effective {
        let len = base + usize::from(i < remainder);
        ranges.push(Range::new(start, start + len));
        start += len;
    }

    debug_assert_eq!(start, extent);
    ranges
}

/// Same as [`partition`] for a raw worker count, rejecting zero.
pub fn try_partition(extent: usize, workers: usize) -> Result<Vec<Range>> {
    let workers = WorkerCount::new(workers).map_err(|_| StencilError::InvalidWorkerCount {
        requested: workers.to_string(),
    })?;
    Ok(partition(extent, workers))
}
