// THEORY:
// Every failure a run can hit is a variant of `StencilError`. None of them are retried:
// the orchestrator stops the run, lets scoped threads and owned buffers unwind, and hands
// the error to the binary, which prints one diagnostic line and exits non-zero.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, StencilError>;

#[derive(Debug, Error)]
pub enum StencilError {
    /// The requested worker count was zero, negative, or not a number.
    #[error("invalid worker count: {requested:?} (expected a positive integer)")]
    InvalidWorkerCount { requested: String },

    /// No work units were loaded or requested.
    #[error("empty input: {source_name} yielded no work units")]
    EmptyInput { source_name: String },

    #[error("failed to decode image {}: {reason}", .path.display())]
    DecodeFailure { path: PathBuf, reason: String },

    #[error("failed to encode image {}: {reason}", .path.display())]
    EncodeFailure { path: PathBuf, reason: String },

    #[error("allocation failure: unable to reserve {bytes} bytes")]
    AllocationFailure { bytes: usize },

    #[error("failed to spawn worker {worker}: {source}")]
    ThreadSpawnFailure {
        worker: usize,
        #[source]
        source: io::Error,
    },

    #[error("worker {worker} panicked before finishing its range")]
    WorkerPanicked { worker: usize },

    #[error("pixel buffer holds {actual} pixels, expected {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// All x values are identical, so the least-squares slope is undefined.
    #[error("cannot fit regression: denominator is zero")]
    DegenerateRegression,

    #[error("i/o error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl StencilError {
    pub fn empty_input(source_name: impl Into<String>) -> Self {
        StencilError::EmptyInput {
            source_name: source_name.into(),
        }
    }

    /// Short machine-friendly name of the failure kind, used in log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            StencilError::InvalidWorkerCount { .. } => "InvalidWorkerCount",
            StencilError::EmptyInput { .. } => "EmptyInput",
            StencilError::DecodeFailure { .. } => "DecodeFailure",
            StencilError::EncodeFailure { .. } => "EncodeFailure",
            StencilError::AllocationFailure { .. } => "AllocationFailure",
            StencilError::ThreadSpawnFailure { .. } => "ThreadSpawnFailure",
            StencilError::WorkerPanicked { .. } => "WorkerPanicked",
            StencilError::DimensionMismatch { .. } => "DimensionMismatch",
            StencilError::DegenerateRegression => "DegenerateRegression",
            StencilError::Io { .. } => "Io",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_resource() {
        let err = StencilError::InvalidWorkerCount {
            requested: "-4".to_string(),
        };
        assert!(err.to_string().contains("\"-4\""));
        assert_eq!(err.kind(), "InvalidWorkerCount");

        let err = StencilError::DecodeFailure {
            path: PathBuf::from("missing.png"),
            reason: "No such file or directory".to_string(),
        };
        assert!(err.to_string().contains("missing.png"));
    }

    #[test]
    fn spawn_failure_keeps_io_source() {
        let err = StencilError::ThreadSpawnFailure {
            worker: 3,
            source: io::Error::new(io::ErrorKind::WouldBlock, "resource limit"),
        };
        let source = std::error::Error::source(&err).map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("resource limit"));
    }
}
