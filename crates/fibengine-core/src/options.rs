//! Calculation options.
//!
//! Every zero/unset field is replaced by its default at the start of a call
//! (the normalize-options invariant), so an empty record and a fully
//! specified record with the same effective values behave identically.

use crate::constants::{
    DEFAULT_DYNAMIC_ADJUSTMENT_INTERVAL, DEFAULT_FFT_CACHE_MAX_ENTRIES,
    DEFAULT_FFT_CACHE_MIN_BITLEN, DEFAULT_FFT_THRESHOLD, DEFAULT_PARALLEL_FFT_THRESHOLD,
    DEFAULT_PARALLEL_THRESHOLD, DEFAULT_STRASSEN_THRESHOLD,
};

/// Reclaim controller behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GcMode {
    /// Engage only for large n.
    #[default]
    Auto,
    /// Always engage.
    Aggressive,
    /// Never engage.
    Disabled,
}

/// Options for a Fibonacci calculation.
#[derive(Debug, Clone)]
pub struct Options {
    /// Minimum operand bits to run the step's three multiplications
    /// concurrently.
    pub parallel_threshold: usize,
    /// Minimum operand bits to use NTT multiplication (strictly above).
    pub fft_threshold: usize,
    /// Minimum operand bits to parallelize when the NTT path is chosen.
    pub parallel_fft_threshold: usize,
    /// Minimum matrix-entry bits to switch to Strassen 2x2 multiplication.
    pub strassen_threshold: usize,
    /// Whether forward transforms are cached.
    pub fft_cache_enabled: bool,
    /// Minimum operand bits before a transform is cached.
    pub fft_cache_min_bitlen: usize,
    /// Bound on cached transforms.
    pub fft_cache_max_entries: usize,
    /// Whether thresholds adjust from runtime measurements.
    pub enable_dynamic_thresholds: bool,
    /// Steps between threshold recomputations.
    pub dynamic_adjustment_interval: usize,
    /// Reclaim controller mode.
    pub gc_mode: GcMode,
    /// Hard pre-call memory limit in bytes (0 = unlimited).
    pub memory_limit: u64,
    /// Compute only the last K decimal digits (0 = full number).
    pub last_digits: u32,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
            fft_threshold: DEFAULT_FFT_THRESHOLD,
            parallel_fft_threshold: DEFAULT_PARALLEL_FFT_THRESHOLD,
            strassen_threshold: DEFAULT_STRASSEN_THRESHOLD,
            fft_cache_enabled: true,
            fft_cache_min_bitlen: DEFAULT_FFT_CACHE_MIN_BITLEN,
            fft_cache_max_entries: DEFAULT_FFT_CACHE_MAX_ENTRIES,
            enable_dynamic_thresholds: false,
            dynamic_adjustment_interval: DEFAULT_DYNAMIC_ADJUSTMENT_INTERVAL,
            gc_mode: GcMode::Auto,
            memory_limit: 0,
            last_digits: 0,
        }
    }
}

impl Options {
    /// Replace zero fields with their defaults.
    #[must_use]
    pub fn normalize(mut self) -> Self {
        if self.parallel_threshold == 0 {
            self.parallel_threshold = DEFAULT_PARALLEL_THRESHOLD;
        }
        if self.fft_threshold == 0 {
            self.fft_threshold = DEFAULT_FFT_THRESHOLD;
        }
        if self.parallel_fft_threshold == 0 {
            self.parallel_fft_threshold = DEFAULT_PARALLEL_FFT_THRESHOLD;
        }
        if self.strassen_threshold == 0 {
            self.strassen_threshold = DEFAULT_STRASSEN_THRESHOLD;
        }
        if self.fft_cache_min_bitlen == 0 {
            self.fft_cache_min_bitlen = DEFAULT_FFT_CACHE_MIN_BITLEN;
        }
        if self.fft_cache_max_entries == 0 {
            self.fft_cache_max_entries = DEFAULT_FFT_CACHE_MAX_ENTRIES;
        }
        if self.dynamic_adjustment_interval == 0 {
            self.dynamic_adjustment_interval = DEFAULT_DYNAMIC_ADJUSTMENT_INTERVAL;
        }
        self
    }
}
