//! Concurrency gate for NTT bodies.
//!
//! Transform slabs are large; more simultaneous NTT multiplications than
//! cores turns the butterflies memory-bound. A process-wide counting
//! semaphore caps concurrent NTT calls at the core count, independent of the
//! wider task semaphore the calculators use.

use std::sync::OnceLock;

use parking_lot::{Condvar, Mutex};

/// Counting semaphore with RAII permits.
pub struct NttGate {
    active: Mutex<usize>,
    cv: Condvar,
    max: usize,
}

impl NttGate {
    /// A gate admitting at most `max` concurrent holders.
    #[must_use]
    pub fn new(max: usize) -> Self {
        Self {
            active: Mutex::new(0),
            cv: Condvar::new(),
            max: max.max(1),
        }
    }

    /// Block until a slot frees up, then hold it for the permit's lifetime.
    pub fn acquire(&self) -> NttPermit<'_> {
        let mut active = self.active.lock();
        while *active >= self.max {
            self.cv.wait(&mut active);
        }
        *active += 1;
        NttPermit { gate: self }
    }

    /// Holders right now.
    #[must_use]
    pub fn active(&self) -> usize {
        *self.active.lock()
    }

    /// Maximum concurrent holders.
    #[must_use]
    pub fn max(&self) -> usize {
        self.max
    }

    fn release(&self) {
        let mut active = self.active.lock();
        *active -= 1;
        self.cv.notify_one();
    }
}

/// RAII slot in the gate.
pub struct NttPermit<'a> {
    gate: &'a NttGate,
}

impl Drop for NttPermit<'_> {
    fn drop(&mut self) {
        self.gate.release();
    }
}

/// The process-wide gate, capped at the core count.
pub fn ntt_gate() -> &'static NttGate {
    static GATE: OnceLock<NttGate> = OnceLock::new();
    GATE.get_or_init(|| {
        let cpus = std::thread::available_parallelism()
            .map(std::num::NonZero::get)
            .unwrap_or(4);
        NttGate::new(cpus)
    })
}

/// Whether pointwise stages may fan out to rayon.
///
/// Only while the gate is under half load; saturated gates mean several
/// transforms are already running and nested parallelism would thrash.
#[must_use]
pub fn parallel_pointwise_allowed() -> bool {
    let gate = ntt_gate();
    gate.active() <= (gate.max() / 2).max(1)
}
