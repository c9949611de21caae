//! Calculator traits and the decorating facade.
//!
//! `Calculator` is the public trait; `CoreCalculator` is what algorithms
//! implement. `FibCalculator` wraps a core with everything the contract
//! requires around it: the machine-word fast path, option normalization,
//! the pre-call budget check, cache policy, the per-call arena, the reclaim
//! controller, and the final aborted-progress snapshot on early exit.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use fibengine_bigfft::{CachePolicy, TransformCache};
use fibengine_memory::CalculationArena;
use num_bigint::BigUint;
use tracing::{debug, warn};

use crate::collector;
use crate::constants::{FIB_TABLE, MAX_FIB_U64};
use crate::context::CalcContext;
use crate::error::FibError;
use crate::memory_budget::MemoryEstimate;
use crate::modular::FastDoublingMod;
use crate::observer::{FrozenObserver, ProgressObserver};
use crate::options::Options;
use crate::progress::ProgressUpdate;

/// Public calculator interface.
pub trait Calculator: Send + Sync {
    /// Calculate F(n).
    fn calculate(
        &self,
        ctx: &CalcContext,
        observer: &dyn ProgressObserver,
        calc_index: usize,
        n: u64,
        opts: &Options,
    ) -> Result<BigUint, FibError>;

    /// Calculator name.
    fn name(&self) -> &'static str;
}

/// Internal interface implemented by the algorithms.
pub trait CoreCalculator: Send + Sync {
    /// The large-n computation; the facade owns everything around it.
    fn calculate_core(
        &self,
        ctx: &CalcContext,
        observer: &dyn ProgressObserver,
        calc_index: usize,
        n: u64,
        opts: &Options,
    ) -> Result<BigUint, FibError>;

    /// Algorithm name.
    fn name(&self) -> &'static str;
}

/// Records the highest progress seen, so an aborted run can report its last
/// observed value instead of pretending completion.
struct TrackingObserver<'a> {
    inner: &'a dyn ProgressObserver,
    last: AtomicU64,
}

impl<'a> TrackingObserver<'a> {
    fn new(inner: &'a dyn ProgressObserver) -> Self {
        Self {
            inner,
            last: AtomicU64::new(0),
        }
    }

    fn last_progress(&self) -> f64 {
        f64::from_bits(self.last.load(Ordering::Relaxed))
    }
}

impl ProgressObserver for TrackingObserver<'_> {
    fn on_progress(&self, update: &ProgressUpdate) {
        let current = self.last_progress();
        if update.progress > current {
            self.last.store(update.progress.to_bits(), Ordering::Relaxed);
        }
        self.inner.on_progress(update);
    }

    fn freeze(&self) -> FrozenObserver {
        self.inner.freeze()
    }
}

/// Decorator turning a `CoreCalculator` into a full `Calculator`.
pub struct FibCalculator {
    inner: Arc<dyn CoreCalculator>,
}

impl FibCalculator {
    /// Wrap a core algorithm.
    #[must_use]
    pub fn new(inner: Arc<dyn CoreCalculator>) -> Self {
        Self { inner }
    }

    /// Table lookup for n ≤ 93; no arena, no observer traffic beyond the
    /// caller's final done signal.
    #[allow(clippy::cast_possible_truncation)]
    fn calculate_small(n: u64) -> BigUint {
        BigUint::from(FIB_TABLE[n as usize])
    }

    fn calculate_large(
        &self,
        ctx: &CalcContext,
        observer: &dyn ProgressObserver,
        calc_index: usize,
        n: u64,
        opts: &Options,
    ) -> Result<BigUint, FibError> {
        // The registration covers the whole run; the controller stands down
        // while more than one calculator is registered.
        let _ticket = collector::track_calculator();

        // Refuse before anything is allocated.
        let estimate = MemoryEstimate::for_index(n);
        estimate.enforce(opts.memory_limit)?;

        TransformCache::global().set_policy(CachePolicy {
            enabled: opts.fft_cache_enabled,
            min_bitlen: opts.fft_cache_min_bitlen,
            max_entries: opts.fft_cache_max_entries,
        });

        let mut arena = CalculationArena::for_index(n);
        fibengine_memory::warming::warm_for_index(fibengine_memory::global_pool(), n, 2);
        debug!(
            n,
            capacity_words = arena.capacity_words(),
            estimated_bytes = estimate.total_bytes,
            "calculation arena sized"
        );

        let scope = collector::engage(opts.gc_mode, n, collector::active_calculators());
        if let Some(scope) = &scope {
            if estimate.total_bytes > scope.soft_limit() {
                warn!(
                    estimated = estimate.total_bytes,
                    soft_limit = scope.soft_limit(),
                    "estimate exceeds the armed soft memory limit"
                );
            }
        }

        let tracking = TrackingObserver::new(observer);
        let result = self
            .inner
            .calculate_core(ctx, &tracking, calc_index, n, opts);

        // LIFO release: arena first, then the collector scope runs its
        // reclaim cycle on drop.
        arena.reset();
        drop(scope);

        match result {
            Err(err @ (FibError::Cancelled | FibError::DeadlineExceeded(_))) => {
                // Final snapshot keeps the last observed value.
                observer.on_progress(&ProgressUpdate::new(
                    calc_index,
                    self.inner.name(),
                    tracking.last_progress(),
                    0,
                    0,
                ));
                Err(err)
            }
            other => other,
        }
    }
}

impl Calculator for FibCalculator {
    fn calculate(
        &self,
        ctx: &CalcContext,
        observer: &dyn ProgressObserver,
        calc_index: usize,
        n: u64,
        opts: &Options,
    ) -> Result<BigUint, FibError> {
        let opts = opts.clone().normalize();

        // Last-digits queries take the self-contained modular path.
        if opts.last_digits > 0 {
            return FastDoublingMod::new().calculate_core(ctx, observer, calc_index, n, &opts);
        }

        if n <= MAX_FIB_U64 {
            observer.on_progress(&ProgressUpdate::done(calc_index, self.inner.name()));
            return Ok(Self::calculate_small(n));
        }

        ctx.check()?;
        self.calculate_large(ctx, observer, calc_index, n, &opts)
    }

    fn name(&self) -> &'static str {
        self.inner.name()
    }
}
