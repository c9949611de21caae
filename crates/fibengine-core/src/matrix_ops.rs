//! Matrix products with the Strassen switch.
//!
//! Below the threshold, the symmetric 5-multiply product; above it, the
//! 7-multiply Strassen schedule. Strassen's intermediate sums go negative,
//! so they run over signed integers and convert back at the end (entries of
//! Q-power products are always non-negative).

use num_bigint::{BigInt, BigUint, Sign};

use crate::matrix_types::SymMatrix;

/// Multiply two symmetric Q-powers, switching to Strassen when the larger
/// entry exceeds `strassen_threshold` bits.
#[must_use]
pub fn mat_multiply(a: &SymMatrix, b: &SymMatrix, strassen_threshold: usize) -> SymMatrix {
    if a.max_entry_bits().max(b.max_entry_bits()) > strassen_threshold {
        strassen_multiply(a, b)
    } else {
        a.multiply(b)
    }
}

/// Square a symmetric Q-power; squaring already exploits symmetry
/// (3 squarings + 1 multiply), which beats Strassen's 7 general products.
#[must_use]
pub fn mat_square(m: &SymMatrix) -> SymMatrix {
    m.square()
}

fn signed(x: &BigUint) -> BigInt {
    BigInt::from(x.clone())
}

fn unsigned(x: BigInt) -> BigUint {
    let (sign, magnitude) = x.into_parts();
    debug_assert_ne!(sign, Sign::Minus, "Q-power entries are non-negative");
    magnitude
}

/// The 7-multiplication Strassen schedule on [[a1,b1],[b1,d1]] × [[a2,b2],[b2,d2]].
#[must_use]
pub fn strassen_multiply(x: &SymMatrix, y: &SymMatrix) -> SymMatrix {
    let (a1, b1, d1) = (signed(&x.a), signed(&x.b), signed(&x.d));
    let (a2, b2, d2) = (signed(&y.a), signed(&y.b), signed(&y.d));

    let m1 = (&a1 + &d1) * (&a2 + &d2);
    let m2 = (&b1 + &d1) * &a2;
    let m3 = &a1 * (&b2 - &d2);
    let m4 = &d1 * (&b2 - &a2);
    let m5 = (&a1 + &b1) * &d2;
    let m6 = (&b1 - &a1) * (&a2 + &b2);
    let m7 = (&b1 - &d1) * (&b2 + &d2);

    let c_a = &m1 + &m4 - &m5 + m7;
    let c_b = &m3 + m5; // == c21 for commuting symmetric factors
    let c_d = m1 - m2 + m3 + m6;

    SymMatrix {
        a: unsigned(c_a),
        b: unsigned(c_b),
        d: unsigned(c_d),
    }
}
