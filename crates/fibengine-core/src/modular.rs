//! Modular fast doubling: F(n) mod m in O(log n) time and O(log m) space.
//!
//! The self-contained path for last-K-decimal-digits queries (m = 10^K).
//! Bypasses the arena, the NTT facade, and the transform cache entirely;
//! every intermediate is reduced, so the working set never exceeds a few
//! copies of the modulus.

use num_bigint::BigUint;
use num_traits::{One, Zero};

use crate::calculator::CoreCalculator;
use crate::context::CalcContext;
use crate::error::FibError;
use crate::observer::ProgressObserver;
use crate::options::Options;
use crate::progress::ProgressUpdate;

/// Fast doubling over Z/m.
pub struct FastDoublingMod;

impl FastDoublingMod {
    /// The modular calculator.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Compute F(n) mod `modulus`.
    pub fn fibonacci_mod(
        n: u64,
        modulus: &BigUint,
        ctx: &CalcContext,
        observer: &dyn ProgressObserver,
        calc_index: usize,
    ) -> Result<BigUint, FibError> {
        if modulus.is_zero() {
            return Err(FibError::InvalidArgument("modulus must be positive".into()));
        }
        if modulus.is_one() {
            return Ok(BigUint::ZERO);
        }

        let num_bits = 64 - n.leading_zeros();
        let mut fk = BigUint::ZERO;
        let mut fk1 = BigUint::one();
        let frozen = observer.freeze();

        for i in (0..num_bits).rev() {
            ctx.check()?;

            let fk_sq = (&fk * &fk) % modulus;
            let fk1_sq = (&fk1 * &fk1) % modulus;
            let cross = (&fk * &fk1) % modulus;

            // F(2k) = 2·F(k)·F(k+1) − F(k)²; if the subtraction would go
            // negative after reduction, add the modulus once.
            let double_cross = (&cross << 1u32) % modulus;
            let f2k = if double_cross >= fk_sq {
                double_cross - &fk_sq
            } else {
                double_cross + modulus - &fk_sq
            };

            // F(2k+1) = F(k+1)² + F(k)²
            let f2k1 = (fk1_sq + &fk_sq) % modulus;

            fk = f2k;
            fk1 = f2k1;

            if (n >> i) & 1 == 1 {
                let sum = (&fk + &fk1) % modulus;
                fk = std::mem::replace(&mut fk1, sum);
            }

            let progress = 1.0 - (f64::from(i) / f64::from(num_bits));
            if frozen.should_report(progress) {
                frozen.update(progress);
                observer.on_progress(&ProgressUpdate::new(
                    calc_index,
                    "FastDoublingMod",
                    progress,
                    u64::from(num_bits - i),
                    u64::from(num_bits),
                ));
            }
        }

        Ok(fk)
    }
}

impl Default for FastDoublingMod {
    fn default() -> Self {
        Self::new()
    }
}

impl CoreCalculator for FastDoublingMod {
    fn calculate_core(
        &self,
        ctx: &CalcContext,
        observer: &dyn ProgressObserver,
        calc_index: usize,
        n: u64,
        opts: &Options,
    ) -> Result<BigUint, FibError> {
        if opts.last_digits == 0 {
            return Err(FibError::InvalidArgument(
                "FastDoublingMod requires last_digits > 0".into(),
            ));
        }

        let modulus = BigUint::from(10u32).pow(opts.last_digits);
        let result = Self::fibonacci_mod(n, &modulus, ctx, observer, calc_index)?;
        observer.on_progress(&ProgressUpdate::done(calc_index, self.name()));
        Ok(result)
    }

    fn name(&self) -> &'static str {
        "FastDoublingMod"
    }
}
