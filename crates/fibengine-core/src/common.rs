//! Bounded task execution.
//!
//! A rayon pool sized to the semaphore limit stands in for an explicit
//! counting semaphore: at most `max_concurrency` tasks run at once, the
//! rest queue. First-error-wins collection lets sibling tasks bail out
//! early through a shared flag.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rayon::ThreadPoolBuilder;

use crate::error::FibError;

/// Default semaphore width: 2 · num_cpu.
#[must_use]
pub fn default_parallelism() -> usize {
    let cpus = std::thread::available_parallelism()
        .map(std::num::NonZero::get)
        .unwrap_or(4);
    cpus * 2
}

/// Clamp a requested width to the semaphore cap; `None` or zero means the
/// cap itself.
#[must_use]
pub fn semaphore_concurrency(requested: Option<usize>) -> usize {
    let max = default_parallelism();
    match requested {
        Some(n) if n > 0 => n.min(max),
        _ => max,
    }
}

/// Run tasks with bounded concurrency, collecting all results or the first
/// error. A failing task raises a flag the remaining tasks can observe to
/// stop early; secondary cancellations are folded into the first error.
pub fn execute_tasks_first_error<T, F>(
    tasks: Vec<F>,
    max_concurrency: usize,
) -> Result<Vec<T>, FibError>
where
    T: Send,
    F: FnOnce(&AtomicBool) -> Result<T, FibError> + Send,
{
    let pool = ThreadPoolBuilder::new()
        .num_threads(max_concurrency.max(1))
        .build()
        .map_err(|e| FibError::Internal(format!("thread pool construction failed: {e}")))?;

    let error_flag = Arc::new(AtomicBool::new(false));

    let results: Vec<Result<T, FibError>> = pool.install(|| {
        use rayon::iter::{IntoParallelIterator, ParallelIterator};
        tasks
            .into_par_iter()
            .map(|task| {
                if error_flag.load(Ordering::Relaxed) {
                    return Err(FibError::Cancelled);
                }
                let result = task(&error_flag);
                if result.is_err() {
                    error_flag.store(true, Ordering::Relaxed);
                }
                result
            })
            .collect()
    });

    let mut collected = Vec::with_capacity(results.len());
    let mut first_error: Option<FibError> = None;

    for result in results {
        match result {
            Ok(value) => collected.push(value),
            Err(FibError::Cancelled) if first_error.is_some() => {}
            Err(e) => {
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }
    }

    match first_error {
        Some(err) => Err(err),
        None => Ok(collected),
    }
}
