//! Cancellable calculation context.
//!
//! Bundles cooperative cancellation with an optional deadline. Checked
//! between steps and between the three multiplications of a step; a fired
//! token never aborts a multiplication mid-flight, because partial
//! big-integer operations would leave non-canonical state.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::FibError;

/// Shared cancellation + deadline handle.
#[derive(Clone)]
pub struct CalcContext {
    cancelled: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl CalcContext {
    /// A context that never expires.
    #[must_use]
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
            deadline: None,
        }
    }

    /// A context that expires `timeout` from now.
    #[must_use]
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
            deadline: Some(Instant::now() + timeout),
        }
    }

    /// Request cancellation; all clones observe it.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation was requested or the deadline passed.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
            || self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// The configured deadline, if any.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline; `None` when unbounded.
    #[must_use]
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    /// Checkpoint: distinguishes manual cancellation from an expired
    /// deadline.
    pub fn check(&self) -> Result<(), FibError> {
        if self.cancelled.load(Ordering::Relaxed) {
            return Err(FibError::Cancelled);
        }
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return Err(FibError::DeadlineExceeded("context deadline passed".into()));
            }
        }
        Ok(())
    }
}

impl Default for CalcContext {
    fn default() -> Self {
        Self::new()
    }
}
