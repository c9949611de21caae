//! Process-wide reclaim controller.
//!
//! During the tight doubling loop the pools recycle everything, so there is
//! no garbage worth sweeping; what remains after a large run is the retained
//! weight of the pools and the transform cache. Engaging the controller arms
//! a soft memory limit (3× the usage sampled at entry) and, on release, runs
//! one explicit reclaim cycle: drain the shared big-integer pool, clear the
//! transform cache, and report the deltas.
//!
//! The controller manipulates process-wide state, so concurrent calculators
//! must not interleave begin/end. The facade registers every run with
//! [`track_calculator`]; while more than one calculator is active the
//! controller stands down for all of them, and the remaining lone-calculator
//! entries serialize on one global mutex.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use fibengine_bigfft::TransformCache;
use fibengine_memory::global_pool;
use parking_lot::Mutex;
use sysinfo::System;
use tracing::{debug, info};

use crate::constants::GC_AUTO_THRESHOLD_N;
use crate::options::GcMode;

static CONTROLLER: Mutex<()> = Mutex::new(());
static ACTIVE_CALCULATORS: AtomicUsize = AtomicUsize::new(0);

/// RAII registration of one running calculator.
pub struct CalculatorTicket(());

impl Drop for CalculatorTicket {
    fn drop(&mut self) {
        ACTIVE_CALCULATORS.fetch_sub(1, Ordering::Relaxed);
    }
}

/// Register a calculator run; the ticket lasts for the whole calculation.
pub fn track_calculator() -> CalculatorTicket {
    ACTIVE_CALCULATORS.fetch_add(1, Ordering::Relaxed);
    CalculatorTicket(())
}

/// Calculators currently registered.
#[must_use]
pub fn active_calculators() -> usize {
    ACTIVE_CALCULATORS.load(Ordering::Relaxed)
}

/// Deltas reported when a scope ends.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReclaimStats {
    /// Used system memory at entry, bytes.
    pub heap_before: u64,
    /// Used system memory after the reclaim cycle, bytes.
    pub heap_after: u64,
    /// Pooled integers dropped by the cycle.
    pub pooled_dropped: usize,
    /// Cached transforms dropped by the cycle.
    pub cache_dropped: usize,
}

/// Active controller scope; dropping it runs the reclaim cycle.
pub struct ReclaimScope {
    _lock: parking_lot::MutexGuard<'static, ()>,
    soft_limit: u64,
    heap_before: u64,
    started: Instant,
}

impl ReclaimScope {
    /// The armed soft memory limit in bytes.
    #[must_use]
    pub fn soft_limit(&self) -> u64 {
        self.soft_limit
    }
}

impl Drop for ReclaimScope {
    #[allow(clippy::cast_possible_truncation)]
    fn drop(&mut self) {
        let stats = run_reclaim_cycle(self.heap_before);
        info!(
            heap_before = stats.heap_before,
            heap_after = stats.heap_after,
            pooled_dropped = stats.pooled_dropped,
            cache_dropped = stats.cache_dropped,
            held_ms = self.started.elapsed().as_millis() as u64,
            "reclaim controller released"
        );
    }
}

/// Engage the controller for a calculation of F(n).
///
/// `active` is the registered-calculator count the caller observed (the
/// facade passes [`active_calculators`]). Returns `None` when the mode and n
/// do not warrant engagement, or when more than one calculator is active —
/// concurrent calculators all run without the controller. A lone calculator
/// blocks until the previous scope is released, so entries are serialized,
/// never interleaved.
pub fn engage(mode: GcMode, n: u64, active: usize) -> Option<ReclaimScope> {
    match mode {
        GcMode::Disabled => return None,
        GcMode::Auto if n < GC_AUTO_THRESHOLD_N => return None,
        GcMode::Auto | GcMode::Aggressive => {}
    }
    if active > 1 {
        debug!(active, "reclaim controller disabled for concurrent calculators");
        return None;
    }

    let lock = CONTROLLER.lock();

    let heap_before = used_memory();
    let soft_limit = heap_before.saturating_mul(3);
    debug!(heap_before, soft_limit, "reclaim controller engaged");

    Some(ReclaimScope {
        _lock: lock,
        soft_limit,
        heap_before,
        started: Instant::now(),
    })
}

/// One explicit reclaim cycle, also usable outside a scope.
pub fn run_reclaim_cycle(heap_before: u64) -> ReclaimStats {
    let pool = global_pool();
    let pooled_dropped = pool.total_pooled();
    pool.clear();

    let cache = TransformCache::global();
    let cache_dropped = cache.len();
    cache.clear();

    ReclaimStats {
        heap_before,
        heap_after: used_memory(),
        pooled_dropped,
        cache_dropped,
    }
}

fn used_memory() -> u64 {
    let mut sys = System::new();
    sys.refresh_memory();
    sys.used_memory()
}
