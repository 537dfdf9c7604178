// THEORY:
// Run configuration: how many workers to use and how wide the blur neighborhood is.
// `WorkerCount` is the validated worker number; once one exists, "zero workers" cannot
// be expressed anywhere downstream.

use crate::error::{Result, StencilError};
use std::fmt;
use std::num::NonZeroUsize;
use std::str::FromStr;

/// Environment variable consulted by the binaries when no thread count is given.
pub const THREADS_ENV: &str = "RANGE_STENCIL_THREADS";

/// A positive number of worker threads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WorkerCount(NonZeroUsize);

impl WorkerCount {
    pub fn new(count: usize) -> Result<Self> {
        NonZeroUsize::new(count)
            .map(WorkerCount)
            .ok_or_else(|| StencilError::InvalidWorkerCount {
                requested: count.to_string(),
            })
    }

    /// One worker per logical CPU.
    pub fn available() -> Self {
        WorkerCount(NonZeroUsize::new(num_cpus::get()).unwrap_or(NonZeroUsize::MIN))
    }

    pub fn get(self) -> usize {
        self.0.get()
    }

    /// Effective count for an extent: never more workers than work units.
    /// An empty extent yields zero, meaning nothing is spawned.
    pub fn clamp_to(self, extent: usize) -> usize {
        self.get().min(extent)
    }
}

impl FromStr for WorkerCount {
    type Err = StencilError;

    /// Parses user text. Negative, zero and non-numeric values are all rejected with the
    /// user's text preserved for the diagnostic.
    fn from_str(text: &str) -> Result<Self> {
        let invalid = || StencilError::InvalidWorkerCount {
            requested: text.to_string(),
        };
        let parsed: i64 = text.trim().parse().map_err(|_| invalid())?;
        if parsed <= 0 {
            return Err(invalid());
        }
        let count = usize::try_from(parsed).map_err(|_| invalid())?;
        WorkerCount::new(count).map_err(|_| invalid())
    }
}

impl fmt::Display for WorkerCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Settings shared by every orchestrated run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Requested worker threads; clamped per run to the extent.
    pub workers: WorkerCount,
    /// Neighborhood radius of the blur kernel. 1 is the 3x3 box.
    pub blur_radius: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            workers: WorkerCount::available(),
            blur_radius: 1,
        }
    }
}

impl RunConfig {
    pub fn with_workers(workers: WorkerCount) -> Self {
        Self {
            workers,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_positive_counts() {
        let count: WorkerCount = "8".parse().unwrap();
        assert_eq!(count.get(), 8);
        let count: WorkerCount = " 3 ".parse().unwrap();
        assert_eq!(count.get(), 3);
    }

    #[test]
    fn rejects_zero_negative_and_garbage() {
        for text in ["0", "-2", "abc", "", "1.5"] {
            match text.parse::<WorkerCount>() {
                Err(StencilError::InvalidWorkerCount { requested }) => assert_eq!(requested, text),
                other => panic!("expected InvalidWorkerCount for {text:?}, got {other:?}"),
            }
        }
        assert!(WorkerCount::new(0).is_err());
    }

    #[test]
    fn clamps_to_extent() {
        let count = WorkerCount::new(8).unwrap();
        assert_eq!(count.clamp_to(3), 3);
        assert_eq!(count.clamp_to(100), 8);
        assert_eq!(count.clamp_to(0), 0);
    }

    #[test]
    fn default_config_uses_available_cpus() {
        let config = RunConfig::default();
        assert!(config.workers.get() >= 1);
        assert_eq!(config.blur_radius, 1);
    }
}
