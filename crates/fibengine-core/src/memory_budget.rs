//! Pre-call memory estimation and limit parsing.
//!
//! The refusal happens before any large allocation: an estimate above the
//! user's limit returns `BudgetExceeded` carrying both numbers, and the
//! error text points at the modular last-digits mode as the fallback.

use crate::constants::LOG2_PHI;
use crate::error::FibError;

/// Footprint multipliers, in units of the result size: five state integers,
/// transform scratch, cached transforms, and allocator overhead.
const STATE_FACTOR: u64 = 5;
const FFT_FACTOR: u64 = 3;
const CACHE_FACTOR: u64 = 2;
const OVERHEAD_FACTOR: u64 = 5;

/// Estimated peak footprint of one calculation.
#[derive(Debug, Clone, Copy)]
pub struct MemoryEstimate {
    /// Bytes of F(n) itself.
    pub result_bytes: u64,
    /// The five state integers.
    pub state_bytes: u64,
    /// Transform scratch.
    pub fft_bytes: u64,
    /// Cached forward transforms.
    pub cache_bytes: u64,
    /// Allocator and bookkeeping overhead.
    pub overhead_bytes: u64,
    /// Sum of the above terms (excluding the result, which `state_bytes`
    /// already covers).
    pub total_bytes: u64,
}

impl MemoryEstimate {
    /// Estimate for computing F(n): every term is a multiple of
    /// `bytes_per_fib = ceil(log2(φ)·n / 8)`, ≈ 15× in total.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn for_index(n: u64) -> Self {
        let result_bits = (n as f64 * LOG2_PHI).ceil() as u64;
        let result_bytes = result_bits.div_ceil(8);

        let state_bytes = result_bytes * STATE_FACTOR;
        let fft_bytes = result_bytes * FFT_FACTOR;
        let cache_bytes = result_bytes * CACHE_FACTOR;
        let overhead_bytes = result_bytes * OVERHEAD_FACTOR;

        Self {
            result_bytes,
            state_bytes,
            fft_bytes,
            cache_bytes,
            overhead_bytes,
            total_bytes: state_bytes + fft_bytes + cache_bytes + overhead_bytes,
        }
    }

    /// Enforce a limit (0 = unlimited) before anything is allocated.
    pub fn enforce(&self, limit: u64) -> Result<(), FibError> {
        if limit > 0 && self.total_bytes > limit {
            return Err(FibError::BudgetExceeded {
                estimated: self.total_bytes,
                limit,
            });
        }
        Ok(())
    }
}

/// Parse a human-readable memory limit: a decimal integer with an optional
/// case-insensitive `K`, `M`, or `G` suffix (powers of 1024). An optional
/// trailing `B` is tolerated (`"512MB"`). Empty input means unlimited.
pub fn parse_memory_limit(s: &str) -> Result<u64, FibError> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Ok(0);
    }

    let upper = trimmed.to_ascii_uppercase();
    let without_b = upper.strip_suffix('B').unwrap_or(&upper);
    let (number, multiplier) = if let Some(n) = without_b.strip_suffix('G') {
        (n, 1024u64 * 1024 * 1024)
    } else if let Some(n) = without_b.strip_suffix('M') {
        (n, 1024 * 1024)
    } else if let Some(n) = without_b.strip_suffix('K') {
        (n, 1024)
    } else {
        (without_b, 1)
    };

    let value: u64 = number
        .trim()
        .parse()
        .map_err(|e| FibError::InvalidArgument(format!("bad memory limit {trimmed:?}: {e}")))?;
    value
        .checked_mul(multiplier)
        .ok_or_else(|| FibError::InvalidArgument(format!("memory limit {trimmed:?} overflows")))
}
