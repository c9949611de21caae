//! Symmetric 2x2 matrices of big integers.
//!
//! Every power of the Fibonacci Q-matrix [[1,1],[1,0]] is symmetric, so the
//! off-diagonal entry is stored once. Squaring costs 3 squarings + 1
//! multiply; a general symmetric product costs 5 multiplies.

use num_bigint::BigUint;
use num_traits::One;

/// A symmetric 2x2 matrix [[a, b], [b, d]].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymMatrix {
    /// Top-left entry.
    pub a: BigUint,
    /// Both off-diagonal entries.
    pub b: BigUint,
    /// Bottom-right entry.
    pub d: BigUint,
}

impl SymMatrix {
    /// The identity matrix.
    #[must_use]
    pub fn identity() -> Self {
        Self {
            a: BigUint::one(),
            b: BigUint::ZERO,
            d: BigUint::one(),
        }
    }

    /// The Fibonacci Q-matrix [[1,1],[1,0]].
    #[must_use]
    pub fn fibonacci_q() -> Self {
        Self {
            a: BigUint::one(),
            b: BigUint::one(),
            d: BigUint::ZERO,
        }
    }

    /// Whether this is the identity.
    #[must_use]
    pub fn is_identity(&self) -> bool {
        self.a.is_one() && self.b == BigUint::ZERO && self.d.is_one()
    }

    /// Square: [[a²+b², b(a+d)], [b(a+d), b²+d²]].
    #[must_use]
    pub fn square(&self) -> Self {
        let b_sq = &self.b * &self.b;
        let a = &self.a * &self.a + &b_sq;
        let b = &self.b * (&self.a + &self.d);
        let d = b_sq + &self.d * &self.d;
        Self { a, b, d }
    }

    /// Product of two symmetric Q-powers (they commute, so the result is
    /// symmetric again): 5 multiplies.
    #[must_use]
    pub fn multiply(&self, other: &Self) -> Self {
        let b1_b2 = &self.b * &other.b;
        let a = &self.a * &other.a + &b1_b2;
        let b = &self.a * &other.b + &self.b * &other.d;
        let d = b1_b2 + &self.d * &other.d;
        Self { a, b, d }
    }

    /// Largest entry bit length, the Strassen switch input.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn max_entry_bits(&self) -> usize {
        self.a.bits().max(self.b.bits()).max(self.d.bits()) as usize
    }
}

/// Accumulator and current power for binary exponentiation.
pub struct MatrixState {
    /// Running product.
    pub result: SymMatrix,
    /// The Q-matrix base.
    pub base: SymMatrix,
}

impl MatrixState {
    /// State ready to compute Q^n.
    #[must_use]
    pub fn new() -> Self {
        Self {
            result: SymMatrix::identity(),
            base: SymMatrix::fibonacci_q(),
        }
    }

    /// Restore the initial state for reuse.
    pub fn reset(&mut self) {
        self.result = SymMatrix::identity();
        self.base = SymMatrix::fibonacci_q();
    }
}

impl Default for MatrixState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_properties() {
        let id = SymMatrix::identity();
        assert!(id.is_identity());
        let q = SymMatrix::fibonacci_q();
        assert_eq!(id.multiply(&q), q);
        assert_eq!(q.multiply(&id), q);
        assert!(id.square().is_identity());
    }

    #[test]
    fn q_squared() {
        // Q² = [[2,1],[1,1]]
        let q2 = SymMatrix::fibonacci_q().square();
        assert_eq!(q2.a, BigUint::from(2u32));
        assert_eq!(q2.b, BigUint::one());
        assert_eq!(q2.d, BigUint::one());
    }

    #[test]
    fn q_fifth_power_reads_fib_5() {
        // Q^5: a = F(6) = 8, b = F(5) = 5, d = F(4) = 3
        let q = SymMatrix::fibonacci_q();
        let q2 = q.square();
        let q4 = q2.square();
        let q5 = q4.multiply(&q);
        assert_eq!(q5.a, BigUint::from(8u32));
        assert_eq!(q5.b, BigUint::from(5u32));
        assert_eq!(q5.d, BigUint::from(3u32));
    }

    #[test]
    fn square_equals_self_multiply() {
        let q3 = SymMatrix::fibonacci_q().square().multiply(&SymMatrix::fibonacci_q());
        assert_eq!(q3.square(), q3.multiply(&q3));
    }

    #[test]
    fn state_reset() {
        let mut state = MatrixState::new();
        state.result = state.result.square().multiply(&state.base);
        state.reset();
        assert!(state.result.is_identity());
        assert_eq!(state.base, SymMatrix::fibonacci_q());
    }

    #[test]
    fn max_entry_bits() {
        let q5 = {
            let q = SymMatrix::fibonacci_q();
            q.square().square().multiply(&q)
        };
        assert_eq!(q5.max_entry_bits(), 4); // a = 8
    }
}
