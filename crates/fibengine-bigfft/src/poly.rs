//! Splitting integers into ring polynomials and back.
//!
//! A polynomial is the signal fed to the transform: `signal_len` coefficients
//! of `chunk_words` source words each, promoted into the Fermat ring.
//! Reassembly evaluates at x = 2^(64·chunk_words) with limb-level carry
//! propagation.

use std::cell::RefCell;

use fibengine_memory::ScratchArena;
use num_bigint::BigUint;
use rayon::prelude::*;

use crate::arith;
use crate::fermat::Fermat;
use crate::gate;
use crate::params::FftParams;

thread_local! {
    // One reusable bump scope per thread for the reassembly accumulator; the
    // reset at entry invalidates the previous call's slice.
    static REASSEMBLY_SCRATCH: RefCell<ScratchArena> = RefCell::new(ScratchArena::new());
}

/// Minimum coefficient count before pointwise products fan out to rayon.
const PARALLEL_POINTWISE_MIN: usize = 64;

/// A polynomial over the Fermat ring, in either domain.
pub struct Poly {
    /// Ring coefficients, `signal_len` of them.
    pub coeffs: Vec<Fermat>,
    /// The transform geometry this polynomial was built with.
    pub params: FftParams,
}

impl Poly {
    /// Split little-endian `digits` into `signal_len` coefficients of
    /// `chunk_words` words each, zero-padded.
    #[must_use]
    pub fn from_digits(digits: &[u64], params: FftParams) -> Self {
        let n = params.signal_len();
        let chunk = params.chunk_words;
        let mut coeffs = Vec::with_capacity(n);
        for i in 0..n {
            let start = (i * chunk).min(digits.len());
            let end = ((i + 1) * chunk).min(digits.len());
            coeffs.push(Fermat::from_words(&digits[start..end], params.m));
        }
        Self { coeffs, params }
    }

    /// Split a `BigUint` (convenience over `from_digits`).
    #[must_use]
    pub fn from_biguint(value: &BigUint, params: FftParams) -> Self {
        Self::from_digits(&value.to_u64_digits(), params)
    }

    /// Evaluate at x = 2^(64·chunk_words), propagating carries across
    /// coefficient boundaries.
    #[must_use]
    pub fn to_biguint(&self) -> BigUint {
        reassemble(&self.coeffs, self.params)
    }

    /// Number of coefficients.
    #[must_use]
    pub fn len(&self) -> usize {
        self.coeffs.len()
    }

    /// Whether the polynomial has no coefficients.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.coeffs.is_empty()
    }
}

/// Pointwise product of two transformed signals.
///
/// Fans out to rayon for wide signals; total NTT concurrency is capped by
/// the crate gate, so pointwise work never oversubscribes memory bandwidth.
#[must_use]
pub fn pointwise_mul(a: &[Fermat], b: &[Fermat]) -> Vec<Fermat> {
    assert_eq!(a.len(), b.len());
    if a.len() >= PARALLEL_POINTWISE_MIN && gate::parallel_pointwise_allowed() {
        a.par_iter().zip(b.par_iter()).map(|(x, y)| x.mul(y)).collect()
    } else {
        a.iter().zip(b.iter()).map(|(x, y)| x.mul(y)).collect()
    }
}

/// Pointwise square of a transformed signal, in place.
pub fn pointwise_sqr(a: &mut [Fermat]) {
    if a.len() >= PARALLEL_POINTWISE_MIN && gate::parallel_pointwise_allowed() {
        a.par_iter_mut().for_each(|x| *x = x.sqr());
    } else {
        for x in a.iter_mut() {
            *x = x.sqr();
        }
    }
}

/// Accumulate coefficients at their word offsets into one digit string.
#[must_use]
pub fn reassemble(coeffs: &[Fermat], params: FftParams) -> BigUint {
    let chunk = params.chunk_words;
    let total_words = coeffs.len() * chunk + params.value_size() + 1;

    REASSEMBLY_SCRATCH.with(|cell| {
        let mut arena = cell.borrow_mut();
        arena.reset();
        let acc = arena.alloc_words(total_words);

        for (i, coeff) in coeffs.iter().enumerate() {
            let offset = i * chunk;
            let carry = arith::add_slices(&mut acc[offset..], coeff.limbs());
            debug_assert_eq!(carry, 0);
        }

        let bytes: Vec<u8> = acc.iter().flat_map(|w| w.to_le_bytes()).collect();
        BigUint::from_bytes_le(&bytes)
    })
}
