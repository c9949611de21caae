//! Concrete observers.

use std::sync::atomic::{AtomicU64, Ordering};

use crossbeam_channel::Sender;
use tracing::{debug, info};

use crate::constants::{LOGGING_PROGRESS_THRESHOLD, PROGRESS_REPORT_THRESHOLD};
use crate::observer::{FrozenObserver, ProgressObserver};
use crate::progress::ProgressUpdate;

/// Forwards updates into a channel with non-blocking sends; a full channel
/// drops the update rather than back-pressuring the calculation.
pub struct ChannelObserver {
    sender: Sender<ProgressUpdate>,
    last_reported: AtomicU64,
}

impl ChannelObserver {
    /// Observer writing into `sender`.
    #[must_use]
    pub fn new(sender: Sender<ProgressUpdate>) -> Self {
        Self {
            sender,
            last_reported: AtomicU64::new(0),
        }
    }
}

impl ProgressObserver for ChannelObserver {
    fn on_progress(&self, update: &ProgressUpdate) {
        let last = f64::from_bits(self.last_reported.load(Ordering::Relaxed));
        if update.done || (update.progress - last) >= PROGRESS_REPORT_THRESHOLD {
            let _ = self.sender.try_send(update.clone());
            self.last_reported
                .store(update.progress.to_bits(), Ordering::Relaxed);
        }
    }

    fn freeze(&self) -> FrozenObserver {
        FrozenObserver::new(PROGRESS_REPORT_THRESHOLD)
    }
}

/// Emits a log record when progress advanced at least `threshold` since the
/// last record (default 0.1).
pub struct LoggingObserver {
    last_reported: AtomicU64,
    threshold: f64,
}

impl LoggingObserver {
    /// Observer with the default logging threshold.
    #[must_use]
    pub fn new() -> Self {
        Self::with_threshold(LOGGING_PROGRESS_THRESHOLD)
    }

    /// Observer logging every `threshold` of progress.
    #[must_use]
    pub fn with_threshold(threshold: f64) -> Self {
        Self {
            last_reported: AtomicU64::new(0),
            threshold,
        }
    }
}

impl Default for LoggingObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressObserver for LoggingObserver {
    fn on_progress(&self, update: &ProgressUpdate) {
        let last = f64::from_bits(self.last_reported.load(Ordering::Relaxed));
        if update.done {
            info!(algorithm = %update.algorithm, "calculation complete");
            self.last_reported
                .store(update.progress.to_bits(), Ordering::Relaxed);
        } else if (update.progress - last) >= self.threshold {
            debug!(
                algorithm = %update.algorithm,
                progress = format!("{:.1}%", update.progress * 100.0),
                step = update.current_step,
                total = update.total_steps,
                "progress"
            );
            self.last_reported
                .store(update.progress.to_bits(), Ordering::Relaxed);
        }
    }

    fn freeze(&self) -> FrozenObserver {
        FrozenObserver::new(PROGRESS_REPORT_THRESHOLD)
    }
}

/// Discards everything (quiet and test modes).
pub struct NoOpObserver;

impl NoOpObserver {
    /// The discarding observer.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for NoOpObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressObserver for NoOpObserver {
    fn on_progress(&self, _update: &ProgressUpdate) {}

    fn freeze(&self) -> FrozenObserver {
        FrozenObserver::new(1.0) // never reports
    }
}
