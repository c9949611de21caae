//! Size-classed recycling of `BigUint` objects.
//!
//! Classes round up to powers of 4 starting at 64 bits. Objects larger than
//! `MAX_POOLED_BIT_LEN` are never retained, so one outlier calculation does
//! not pin its slabs for the life of the process.

use std::collections::HashMap;
use std::sync::OnceLock;

use num_bigint::BigUint;
use parking_lot::Mutex;
use tracing::trace;

use crate::stats::{AtomicPoolStats, PoolStats};

/// Hard cap on the bit length of pooled integers (10^8 bits).
pub const MAX_POOLED_BIT_LEN: usize = 100_000_000;

/// Per-class retention limit.
const DEFAULT_MAX_PER_CLASS: usize = 32;

/// Free lists of zeroed `BigUint`s keyed by size class.
pub struct BigIntPool {
    classes: Mutex<HashMap<usize, Vec<BigUint>>>,
    max_bit_len: usize,
    max_per_class: usize,
    stats: AtomicPoolStats,
}

impl BigIntPool {
    /// A pool with explicit retention limits.
    #[must_use]
    pub fn new(max_bit_len: usize, max_per_class: usize) -> Self {
        Self {
            classes: Mutex::new(HashMap::new()),
            max_bit_len,
            max_per_class,
            stats: AtomicPoolStats::new(),
        }
    }

    /// Take a zeroed integer sized for at least `min_bits`, or create one.
    pub fn acquire(&self, min_bits: usize) -> BigUint {
        let class = Self::size_class(min_bits);
        if let Some(value) = self.classes.lock().get_mut(&class).and_then(Vec::pop) {
            self.stats.record_hit();
            return value;
        }
        self.stats.record_miss();
        BigUint::ZERO
    }

    /// Hand an integer back for recycling. Oversized values and full classes
    /// drop the object instead.
    #[allow(clippy::cast_possible_truncation)]
    pub fn release(&self, mut value: BigUint) {
        let bits = value.bits() as usize;
        if bits > self.max_bit_len {
            trace!(bits, "dropping oversized big integer instead of pooling");
            self.stats.record_eviction();
            return;
        }

        let class = Self::size_class(bits);
        let mut classes = self.classes.lock();
        let list = classes.entry(class).or_default();
        if list.len() < self.max_per_class {
            value = BigUint::ZERO;
            list.push(value);
        } else {
            self.stats.record_eviction();
        }
    }

    /// Round `bits` up to its power-of-4 class, floored at 64.
    fn size_class(bits: usize) -> usize {
        let mut class = 64;
        while class < bits {
            class *= 4;
        }
        class
    }

    /// Pre-populate the class covering `bits` with up to `count` entries.
    pub fn warm(&self, bits: usize, count: usize) {
        let class = Self::size_class(bits);
        let mut classes = self.classes.lock();
        let list = classes.entry(class).or_default();
        while list.len() < count.min(self.max_per_class) {
            list.push(BigUint::ZERO);
        }
    }

    /// Total objects currently retained.
    #[must_use]
    pub fn total_pooled(&self) -> usize {
        self.classes.lock().values().map(Vec::len).sum()
    }

    /// Drop every retained object.
    pub fn clear(&self) {
        self.classes.lock().clear();
    }

    /// Remove and return all retained objects, grouped by class.
    pub fn drain_all(&self) -> HashMap<usize, Vec<BigUint>> {
        std::mem::take(&mut *self.classes.lock())
    }

    /// Usage counters since creation or last reset.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        self.stats.snapshot()
    }

    /// Zero the usage counters.
    pub fn reset_stats(&self) {
        self.stats.reset();
    }
}

impl Default for BigIntPool {
    fn default() -> Self {
        Self::new(MAX_POOLED_BIT_LEN, DEFAULT_MAX_PER_CLASS)
    }
}

/// The process-wide pool shared by all calculators.
pub fn global_pool() -> &'static BigIntPool {
    static POOL: OnceLock<BigIntPool> = OnceLock::new();
    POOL.get_or_init(BigIntPool::default)
}
