//! Arithmetic in the Fermat ring Z/(2^(64·m)+1).
//!
//! A residue is m+1 little-endian u64 limbs. Canonical form keeps the value
//! in [0, 2^(64m)]: the top limb is 0, or 1 with a zero low part (the
//! representative of −1). Addition and subtraction reduce with a single
//! fold of the top limb since 2^(64m) ≡ −1; cyclic shifts realize the
//! root-of-unity multiplications of the transform.

use num_bigint::BigUint;

use crate::arith;

/// Schoolbook multiplication cutoff: rings up to this many words multiply
/// with the in-place word-pair loops, larger ones delegate to `BigUint`.
const SMALL_MUL_WORDS: usize = 30;

/// A residue mod 2^(64·m)+1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fermat {
    limbs: Vec<u64>,
    m: usize,
}

impl Fermat {
    /// The zero residue with modulus 2^(64·m)+1.
    #[must_use]
    pub fn new(m: usize) -> Self {
        Self {
            limbs: vec![0; m + 1],
            m,
        }
    }

    /// Build a residue from at most `m` source words (value < 2^(64m)).
    #[must_use]
    pub fn from_words(words: &[u64], m: usize) -> Self {
        debug_assert!(words.len() <= m);
        let mut limbs = vec![0; m + 1];
        limbs[..words.len()].copy_from_slice(words);
        Self { limbs, m }
    }

    /// The Fermat exponent in words.
    #[must_use]
    pub fn exponent_words(&self) -> usize {
        self.m
    }

    /// Raw limb view, canonical form.
    #[must_use]
    pub fn limbs(&self) -> &[u64] {
        &self.limbs
    }

    /// Whether this residue is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.limbs.iter().all(|&w| w == 0)
    }

    /// The modulus 2^(64·m)+1.
    #[must_use]
    pub fn modulus(&self) -> BigUint {
        (BigUint::from(1u32) << (64 * self.m)) + 1u32
    }

    /// Canonical value as a `BigUint`.
    #[must_use]
    pub fn to_biguint(&self) -> BigUint {
        let bytes: Vec<u8> = self.limbs.iter().flat_map(|w| w.to_le_bytes()).collect();
        BigUint::from_bytes_le(&bytes)
    }

    /// Build from an arbitrary `BigUint`, reducing mod 2^(64·m)+1.
    #[must_use]
    pub fn from_biguint(value: &BigUint, m: usize) -> Self {
        Self::reduce_digits(&value.to_u64_digits(), m)
    }

    /// Fold the top limb back into the low part: 2^(64m) ≡ −1.
    ///
    /// Accepts any limb state with value `low + top·2^(64m)` and restores the
    /// canonical representative.
    fn normalize(&mut self) {
        let m = self.m;
        let top = self.limbs[m];
        if top == 0 {
            return;
        }
        if top == 1 && self.limbs[..m].iter().all(|&w| w == 0) {
            return; // canonical −1
        }
        self.limbs[m] = 0;
        let borrow = arith::sub_scalar(&mut self.limbs[..m], top);
        if borrow != 0 {
            // Wrapped below zero; −2^(64m) ≡ +1.
            let carry = arith::add_scalar(&mut self.limbs[..m], 1);
            self.limbs[m] = carry;
        }
    }

    /// `self += other`.
    pub fn add_assign(&mut self, other: &Self) {
        debug_assert_eq!(self.m, other.m);
        let carry = arith::add_slices(&mut self.limbs, &other.limbs);
        debug_assert_eq!(carry, 0);
        self.normalize();
    }

    /// `self -= other`.
    pub fn sub_assign(&mut self, other: &Self) {
        debug_assert_eq!(self.m, other.m);
        let borrow = arith::sub_slices(&mut self.limbs, &other.limbs);
        if borrow != 0 {
            // Add the modulus back: +1 at limb 0 and +1 at limb m, mod 2^(64(m+1)).
            let _ = arith::add_scalar(&mut self.limbs, 1);
            let top = self.m;
            self.limbs[top] = self.limbs[top].wrapping_add(1);
        }
        self.normalize();
    }

    /// `self = −self`.
    pub fn negate(&mut self) {
        if self.is_zero() {
            return;
        }
        // p − v, with p = [1, 0, …, 0, 1].
        let m = self.m;
        let mut modulus = vec![0u64; m + 1];
        modulus[0] = 1;
        modulus[m] = 1;
        let borrow = arith::sub_slices(&mut modulus, &self.limbs);
        debug_assert_eq!(borrow, 0);
        self.limbs = modulus;
        self.normalize();
    }

    /// `self · 2^s` with the cyclic wrap 2^(64m) ≡ −1.
    #[must_use]
    pub fn shifted(&self, s: usize) -> Self {
        let mb = 64 * self.m;
        let mut s = s % (2 * mb);
        let negate = s >= mb;
        if negate {
            s -= mb;
        }
        let mut out = self.shift_below_modulus(s);
        if negate {
            out.negate();
        }
        out
    }

    /// `self · 2^(s/2)`; odd `s` goes through √2 = 2^(3·mb/4) − 2^(mb/4).
    #[must_use]
    pub fn half_shifted(&self, s: usize) -> Self {
        if s % 2 == 0 {
            return self.shifted(s / 2);
        }
        let mb = 64 * self.m;
        let mut out = self.shifted(s / 2 + 3 * mb / 4);
        let low = self.shifted(s / 2 + mb / 4);
        out.sub_assign(&low);
        out
    }

    /// Shift by `s < 64m` bits: split `x·2^s` at bit 64m, result = lo − hi.
    fn shift_below_modulus(&self, s: usize) -> Self {
        if s == 0 {
            return self.clone();
        }
        let m = self.m;
        let words = s / 64;
        let bits = s % 64;

        let mut buf = vec![0u64; m + 2 + words];
        if bits == 0 {
            buf[words..words + m + 1].copy_from_slice(&self.limbs);
        } else {
            let mut carry = 0u64;
            for (i, &limb) in self.limbs.iter().enumerate() {
                buf[words + i] = (limb << bits) | carry;
                carry = limb >> (64 - bits);
            }
            buf[words + m + 1] = carry;
        }

        let mut out = Self::new(m);
        out.limbs[..m].copy_from_slice(&buf[..m]);
        let borrow = arith::sub_slices(&mut out.limbs, &buf[m..]);
        if borrow != 0 {
            let _ = arith::add_scalar(&mut out.limbs, 1);
            out.limbs[m] = out.limbs[m].wrapping_add(1);
        }
        out.normalize();
        out
    }

    /// `self · other` in the ring.
    #[must_use]
    pub fn mul(&self, other: &Self) -> Self {
        debug_assert_eq!(self.m, other.m);
        if self.m <= SMALL_MUL_WORDS {
            let product = mul_limbs(&self.limbs, &other.limbs);
            Self::reduce_digits(&product, self.m)
        } else {
            let product = self.to_biguint() * other.to_biguint();
            Self::reduce_digits(&product.to_u64_digits(), self.m)
        }
    }

    /// `self²` in the ring: symmetric schoolbook below the cutoff.
    #[must_use]
    pub fn sqr(&self) -> Self {
        if self.m <= SMALL_MUL_WORDS {
            let product = sqr_limbs(&self.limbs);
            Self::reduce_digits(&product, self.m)
        } else {
            let big = self.to_biguint();
            let product = &big * &big;
            Self::reduce_digits(&product.to_u64_digits(), self.m)
        }
    }

    /// Reduce an arbitrary digit string (≤ 2m+1 significant limbs for
    /// products of canonical residues): value = lo + hi·2^(64m) ≡ lo − hi.
    fn reduce_digits(digits: &[u64], m: usize) -> Self {
        let mut len = digits.len();
        while len > 0 && digits[len - 1] == 0 {
            len -= 1;
        }
        let digits = &digits[..len];

        let mut out = Self::new(m);
        let split = digits.len().min(m);
        out.limbs[..split].copy_from_slice(&digits[..split]);
        if digits.len() > m {
            let hi = &digits[m..];
            debug_assert!(hi.len() <= m + 1, "product exceeds double-width reduction");
            let borrow = arith::sub_slices(&mut out.limbs, hi);
            if borrow != 0 {
                let _ = arith::add_scalar(&mut out.limbs, 1);
                out.limbs[m] = out.limbs[m].wrapping_add(1);
            }
        }
        out.normalize();
        out
    }
}

/// Schoolbook product of two limb vectors.
fn mul_limbs(a: &[u64], b: &[u64]) -> Vec<u64> {
    let mut acc = vec![0u64; a.len() + b.len()];
    for (i, &ai) in a.iter().enumerate() {
        if ai == 0 {
            continue;
        }
        let mut carry: u128 = 0;
        for (j, &bj) in b.iter().enumerate() {
            let t = u128::from(ai) * u128::from(bj) + u128::from(acc[i + j]) + carry;
            acc[i + j] = t as u64;
            carry = t >> 64;
        }
        let mut idx = i + b.len();
        while carry > 0 && idx < acc.len() {
            let t = u128::from(acc[idx]) + carry;
            acc[idx] = t as u64;
            carry = t >> 64;
            idx += 1;
        }
    }
    acc
}

/// Schoolbook square: cross terms once, doubled, plus the diagonal.
fn sqr_limbs(a: &[u64]) -> Vec<u64> {
    let n = a.len();
    let mut acc = vec![0u64; 2 * n];

    for (i, &ai) in a.iter().enumerate() {
        if ai == 0 {
            continue;
        }
        let mut carry: u128 = 0;
        for (j, &aj) in a.iter().enumerate().skip(i + 1) {
            let t = u128::from(ai) * u128::from(aj) + u128::from(acc[i + j]) + carry;
            acc[i + j] = t as u64;
            carry = t >> 64;
        }
        let mut idx = i + n;
        while carry > 0 && idx < acc.len() {
            let t = u128::from(acc[idx]) + carry;
            acc[idx] = t as u64;
            carry = t >> 64;
            idx += 1;
        }
    }

    // Double the cross terms.
    let mut carry = 0u64;
    for limb in &mut acc {
        let out = *limb >> 63;
        *limb = (*limb << 1) | carry;
        carry = out;
    }

    // Add the diagonal a_i² terms.
    let mut carry = 0u64;
    for (i, &ai) in a.iter().enumerate() {
        let (lo, hi) = arith::mul_wide(ai, ai);
        let (s0, c0) = arith::add_with_carry(acc[2 * i], lo, carry);
        acc[2 * i] = s0;
        let (s1, c1) = arith::add_with_carry(acc[2 * i + 1], hi, c0);
        acc[2 * i + 1] = s1;
        carry = c1;
    }
    debug_assert_eq!(carry, 0);

    acc
}
