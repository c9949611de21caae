//! Public multiplication facade.
//!
//! Routes between the native `BigUint` product (Karatsuba inside num-bigint)
//! and the NTT pipeline. The crate-level floor only protects genuinely small
//! operands; the engine's tunable threshold lives a layer up in the
//! multiplication strategy.

use num_bigint::BigUint;
use num_traits::Zero;

use crate::cache::TransformCache;
use crate::fermat::Fermat;
use crate::gate;
use crate::params::{fft_params, FftParams};
use crate::poly::{self, Poly};
use crate::transform;

/// Bit length floor below which the NTT pipeline never engages.
/// Equality stays on the schoolbook side.
const FFT_BIT_THRESHOLD: usize = 10_000;

/// Multiply, choosing NTT for large operands.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn mul(a: &BigUint, b: &BigUint) -> BigUint {
    let max_bits = a.bits().max(b.bits()) as usize;
    if max_bits > FFT_BIT_THRESHOLD {
        ntt_mul(a, b)
    } else {
        a * b
    }
}

/// Square, reusing the single forward transform for large operands.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn sqr(a: &BigUint) -> BigUint {
    let bits = a.bits() as usize;
    if bits > FFT_BIT_THRESHOLD {
        ntt_sqr(a)
    } else {
        a * a
    }
}

/// Multiply into `z`. `z` may alias `a` or `b`: the product is computed
/// into a fresh value before `z` is overwritten.
pub fn mul_to(z: &mut BigUint, a: &BigUint, b: &BigUint) {
    *z = mul(a, b);
}

/// Square into `z`. `z` may alias `a`.
pub fn sqr_to(z: &mut BigUint, a: &BigUint) {
    *z = sqr(a);
}

/// Full NTT multiplication: split, forward (cached), pointwise, inverse,
/// reassemble.
#[allow(clippy::cast_possible_truncation)]
fn ntt_mul(a: &BigUint, b: &BigUint) -> BigUint {
    if a.is_zero() || b.is_zero() {
        return BigUint::ZERO;
    }
    let _permit = gate::ntt_gate().acquire();

    let a_digits = a.to_u64_digits();
    let b_digits = b.to_u64_digits();
    let params = fft_params(a_digits.len() + b_digits.len() + 2);

    let values_a = forward_cached(&a_digits, a.bits() as usize, params);
    let values_b = forward_cached(&b_digits, b.bits() as usize, params);

    let mut product = poly::pointwise_mul(&values_a, &values_b);
    transform::inverse(&mut product, params.m);
    poly::reassemble(&product, params)
}

/// NTT squaring: one forward transform instead of two.
#[allow(clippy::cast_possible_truncation)]
fn ntt_sqr(a: &BigUint) -> BigUint {
    if a.is_zero() {
        return BigUint::ZERO;
    }
    let _permit = gate::ntt_gate().acquire();

    let a_digits = a.to_u64_digits();
    let params = fft_params(2 * a_digits.len() + 2);

    let mut values = forward_cached(&a_digits, a.bits() as usize, params);
    poly::pointwise_sqr(&mut values);
    transform::inverse(&mut values, params.m);
    poly::reassemble(&values, params)
}

/// Forward transform with content-addressed caching.
fn forward_cached(digits: &[u64], bits: usize, params: FftParams) -> Vec<Fermat> {
    let cache = TransformCache::global();
    if !cache.admits(bits) {
        let mut coeffs = Poly::from_digits(digits, params).coeffs;
        transform::forward(&mut coeffs, params.m);
        return coeffs;
    }

    let key = TransformCache::content_key(params, digits);
    if let Some(values) = cache.get(key, params) {
        return values;
    }
    let mut coeffs = Poly::from_digits(digits, params).coeffs;
    transform::forward(&mut coeffs, params.m);
    cache.put(key, params, coeffs.clone());
    coeffs
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_traits::One;

    #[test]
    fn mul_small_values() {
        let a = BigUint::from(12_345u64);
        let b = BigUint::from(67_890u64);
        assert_eq!(mul(&a, &b), BigUint::from(838_102_050u64));
    }

    #[test]
    fn sqr_small_value() {
        let a = BigUint::from(99_999u64);
        assert_eq!(sqr(&a), BigUint::from(9_999_800_001u64));
    }

    #[test]
    fn mul_with_zero() {
        let a = BigUint::from(12_345u64);
        assert_eq!(mul(&a, &BigUint::ZERO), BigUint::ZERO);
        assert_eq!(ntt_mul(&a, &BigUint::ZERO), BigUint::ZERO);
    }

    #[test]
    fn ntt_mul_matches_native() {
        for &bits in &[128u64, 256, 512, 1024, 4096] {
            let a = (BigUint::one() << bits) - BigUint::one();
            let b = (BigUint::one() << bits) - BigUint::from(3u64);
            assert_eq!(ntt_mul(&a, &b), &a * &b, "mismatch at {bits} bits");
        }
    }

    #[test]
    fn ntt_sqr_matches_native() {
        for &bits in &[128u64, 512, 2048, 8192] {
            let a = (BigUint::one() << bits) - BigUint::one();
            assert_eq!(ntt_sqr(&a), &a * &a, "mismatch at {bits} bits");
        }
    }

    #[test]
    fn ntt_mul_asymmetric_operands() {
        let a = (BigUint::one() << 4096) - BigUint::one();
        let b = BigUint::from(12_345u64);
        assert_eq!(ntt_mul(&a, &b), &a * &b);
    }

    #[test]
    fn ntt_mul_above_crate_threshold() {
        let a = (BigUint::one() << 16_384) - BigUint::one();
        let b = (BigUint::one() << 12_000) - BigUint::from(7u64);
        // Routed through the NTT path by the public entry point.
        assert_eq!(mul(&a, &b), &a * &b);
    }

    #[test]
    fn mul_to_handles_aliasing() {
        let a: BigUint = (BigUint::one() << 300) - BigUint::one();
        let b = BigUint::from(99u64);
        let expected = &a * &b;

        let mut z = a.clone();
        let a2 = z.clone();
        mul_to(&mut z, &a2, &b);
        assert_eq!(z, expected);

        // z aliases the logical operand by value reuse on both sides.
        let mut z = a.clone();
        let z_copy = z.clone();
        mul_to(&mut z, &z_copy, &z_copy);
        assert_eq!(z, &a * &a);
    }

    #[test]
    fn sqr_to_writes_destination() {
        let a = BigUint::from(1234u64);
        let mut z = BigUint::ZERO;
        sqr_to(&mut z, &a);
        assert_eq!(z, BigUint::from(1_522_756u64));
    }
}
