// Fresh-per-run worker threads shared by the mapper and the reducer.

use crate::error::{Result, StencilError};
use std::thread;

/// Runs `work(worker_id, task)` for every task on its own named scoped thread and joins
/// them all before returning.
///
/// If a spawn fails, no further workers are started, the ones already running are still
/// joined, and `ThreadSpawnFailure` is returned. A panicking worker surfaces as
/// `WorkerPanicked` for the lowest panicking worker id.
pub(crate) fn run_scoped<T, F>(name_prefix: &str, tasks: Vec<T>, work: F) -> Result<()>
where
    T: Send,
    F: Fn(usize, T) + Sync,
{
    thread::scope(|scope| {
        let work = &work;
        let mut handles = Vec::with_capacity(tasks.len());
        let mut failure = None;

        for (worker, task) in tasks.into_iter().enumerate() {
            let spawned = thread::Builder::new()
                .name(format!("{name_prefix}-{worker}"))
                .spawn_scoped(scope, move || work(worker, task));
            match spawned {
                Ok(handle) => handles.push((worker, handle)),
                Err(source) => {
                    failure = Some(StencilError::ThreadSpawnFailure { worker, source });
                    break;
                }
            }
        }

        for (worker, handle) in handles {
            if handle.join().is_err() && failure.is_none() {
                failure = Some(StencilError::WorkerPanicked { worker });
            }
        }

        failure.map_or(Ok(()), Err)
    })
}
