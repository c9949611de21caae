//! Per-calculation arena for the doubling state.
//!
//! One arena backs the five state integers of a single F(n) run. Capacity is
//! derived from n before the loop starts, so the hot path never grows the
//! arena: `bits(F(n)) ≈ n · log2(φ)`, five integers plus five product-sized
//! margins gives the 10× factor.

use bumpalo::Bump;

/// Growth rate of Fibonacci bit length per index: log2(φ).
const LOG2_PHI: f64 = 0.69424;

/// Approximate bit length of F(n): `ceil(n · log2(φ))`.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn fib_bits(n: u64) -> usize {
    (n as f64 * LOG2_PHI).ceil() as usize
}

/// Contiguous backing for one calculation's working set.
pub struct CalculationArena {
    bump: Bump,
    capacity_words: usize,
}

impl CalculationArena {
    /// Size an arena for computing F(n).
    ///
    /// Reserves `ceil(10 · n · log2(φ) / 64)` words: five state integers and
    /// a same-sized margin for the products written during each step.
    #[must_use]
    pub fn for_index(n: u64) -> Self {
        let capacity_words = (10 * fib_bits(n)).div_ceil(64).max(64);
        Self {
            bump: Bump::with_capacity(capacity_words * 8),
            capacity_words,
        }
    }

    /// An arena with explicit word capacity (tests, small runs).
    #[must_use]
    pub fn with_words(capacity_words: usize) -> Self {
        Self {
            bump: Bump::with_capacity(capacity_words * 8),
            capacity_words,
        }
    }

    /// Carve a zero-filled backing slice of `words` words.
    pub fn carve(&self, words: usize) -> &mut [u64] {
        self.bump.alloc_slice_fill_default(words)
    }

    /// Words reserved when the arena was sized.
    #[must_use]
    pub fn capacity_words(&self) -> usize {
        self.capacity_words
    }

    /// Bytes currently carved out.
    #[must_use]
    pub fn allocated_bytes(&self) -> usize {
        self.bump.allocated_bytes()
    }

    /// Release every slice at once.
    pub fn reset(&mut self) {
        self.bump.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizing_follows_golden_ratio_estimate() {
        let arena = CalculationArena::for_index(1_000_000);
        // 10 * 694_240 bits / 64 ≈ 108_475 words
        assert!(arena.capacity_words() > 100_000);
        assert!(arena.capacity_words() < 120_000);
    }

    #[test]
    fn small_n_gets_floor_capacity() {
        let arena = CalculationArena::for_index(1);
        assert_eq!(arena.capacity_words(), 64);
    }

    #[test]
    fn carve_and_reset() {
        let mut arena = CalculationArena::with_words(256);
        let slice = arena.carve(100);
        assert_eq!(slice.len(), 100);
        assert!(arena.allocated_bytes() >= 800);
        arena.reset();
    }

    #[test]
    fn carve_past_capacity_still_succeeds() {
        // The arena chains a new chunk rather than failing.
        let arena = CalculationArena::with_words(8);
        let slice = arena.carve(4096);
        assert_eq!(slice.len(), 4096);
    }
}
