//! Progress observation.
//!
//! `SequenceProgress` is the subject: one monotonic slot per calculator plus
//! a fan-out observer list. Writers touch only their own slot (relaxed
//! atomics), `freeze` reads a lock-free snapshot of every slot, and the
//! observer list is guarded by a mutex only around register/unregister and
//! notification.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::progress::ProgressUpdate;

/// Receiver of progress updates.
pub trait ProgressObserver: Send + Sync {
    /// Handle one update. Must not block: slow consumers drop updates.
    fn on_progress(&self, update: &ProgressUpdate);

    /// A throttle handle for hot loops.
    fn freeze(&self) -> FrozenObserver;
}

/// Lock-free per-loop throttle: tracks the last reported value so the loop
/// only pays for observer traffic when progress moved enough.
pub struct FrozenObserver {
    progress: AtomicU64,
    threshold: f64,
}

impl FrozenObserver {
    /// A throttle that reports every `threshold` of progress.
    #[must_use]
    pub fn new(threshold: f64) -> Self {
        Self {
            progress: AtomicU64::new(0),
            threshold,
        }
    }

    /// Whether `new_progress` moved far enough past the last report.
    #[inline]
    #[must_use]
    pub fn should_report(&self, new_progress: f64) -> bool {
        let current = f64::from_bits(self.progress.load(Ordering::Relaxed));
        (new_progress - current) >= self.threshold
    }

    /// Record a reported value.
    pub fn update(&self, new_progress: f64) {
        self.progress
            .store(new_progress.to_bits(), Ordering::Relaxed);
    }

    /// The last recorded value.
    #[must_use]
    pub fn current(&self) -> f64 {
        f64::from_bits(self.progress.load(Ordering::Relaxed))
    }
}

/// Progress subject: per-calculator slots and an observer list.
pub struct SequenceProgress {
    slots: Vec<AtomicU64>,
    observers: Mutex<Vec<Arc<dyn ProgressObserver>>>,
}

impl SequenceProgress {
    /// A subject with `calculators` independent slots.
    #[must_use]
    pub fn new(calculators: usize) -> Self {
        Self {
            slots: (0..calculators.max(1)).map(|_| AtomicU64::new(0)).collect(),
            observers: Mutex::new(Vec::new()),
        }
    }

    /// Number of slots.
    #[must_use]
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Record progress for one calculator and fan the update out.
    ///
    /// Slots are monotonic: a value below the current one is clamped up, so
    /// observed progress never regresses.
    pub fn update(&self, update: &ProgressUpdate) {
        if let Some(slot) = self.slots.get(update.calc_index) {
            let clamped = update.progress.clamp(0.0, 1.0);
            let current = f64::from_bits(slot.load(Ordering::Relaxed));
            if clamped > current {
                slot.store(clamped.to_bits(), Ordering::Relaxed);
            }
        }
        self.notify(update);
    }

    /// Lock-free snapshot of every slot.
    #[must_use]
    pub fn freeze(&self) -> Vec<f64> {
        self.slots
            .iter()
            .map(|slot| f64::from_bits(slot.load(Ordering::Relaxed)))
            .collect()
    }

    /// Add an observer.
    pub fn register(&self, observer: Arc<dyn ProgressObserver>) {
        self.observers.lock().push(observer);
    }

    /// Remove a previously registered observer (pointer identity).
    pub fn unregister(&self, observer: &Arc<dyn ProgressObserver>) {
        self.observers
            .lock()
            .retain(|existing| !Arc::ptr_eq(existing, observer));
    }

    /// Drop all observers.
    pub fn clear(&self) {
        self.observers.lock().clear();
    }

    /// Registered observer count.
    #[must_use]
    pub fn observer_count(&self) -> usize {
        self.observers.lock().len()
    }

    /// Fan an update out to every observer.
    pub fn notify(&self, update: &ProgressUpdate) {
        let observers = self.observers.lock();
        for observer in observers.iter() {
            observer.on_progress(update);
        }
    }
}
