//! Lazy Fibonacci sequence enumeration.

use num_bigint::BigUint;
use num_traits::{One, Zero};

/// Yields `(index, F(index))` from F(0) upward via the additive recurrence.
/// The right tool for small-to-medium ranges; single lookups of large n
/// belong to the calculators.
pub struct FibIterator {
    a: BigUint,
    b: BigUint,
    index: u64,
}

impl FibIterator {
    /// Iterator starting at F(0).
    #[must_use]
    pub fn new() -> Self {
        Self {
            a: BigUint::zero(),
            b: BigUint::one(),
            index: 0,
        }
    }

    /// Iterator whose first item is `(n, F(n))`.
    #[must_use]
    pub fn from_index(n: u64) -> Self {
        let mut iter = Self::new();
        for _ in 0..n {
            iter.next();
        }
        iter
    }
}

impl Default for FibIterator {
    fn default() -> Self {
        Self::new()
    }
}

impl Iterator for FibIterator {
    type Item = (u64, BigUint);

    fn next(&mut self) -> Option<Self::Item> {
        let value = self.a.clone();
        let index = self.index;
        let next = &self.a + &self.b;
        self.a = std::mem::replace(&mut self.b, next);
        self.index += 1;
        Some((index, value))
    }
}
