//! GMP-backed fast doubling (feature `gmp`).
//!
//! Delegates the big-integer arithmetic to `rug` for its assembly-optimized
//! limb kernels. Registered as `"gmp"`; without the feature, the registry
//! answers `Unavailable` instead.

use num_bigint::BigUint;
use rug::Integer;

use crate::calculator::CoreCalculator;
use crate::context::CalcContext;
use crate::error::FibError;
use crate::observer::ProgressObserver;
use crate::options::Options;
use crate::progress::ProgressUpdate;

/// Fast doubling over `rug::Integer`.
pub struct GmpFastDoubling;

impl GmpFastDoubling {
    /// The GMP-backed calculator.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for GmpFastDoubling {
    fn default() -> Self {
        Self::new()
    }
}

fn to_biguint(value: &Integer) -> Result<BigUint, FibError> {
    // Values in this loop are non-negative by construction.
    let digits = value.to_digits::<u8>(rug::integer::Order::Lsf);
    Ok(BigUint::from_bytes_le(&digits))
}

impl CoreCalculator for GmpFastDoubling {
    fn calculate_core(
        &self,
        ctx: &CalcContext,
        observer: &dyn ProgressObserver,
        calc_index: usize,
        n: u64,
        _opts: &Options,
    ) -> Result<BigUint, FibError> {
        let num_bits = 64 - n.leading_zeros();
        let mut fk = Integer::new();
        let mut fk1 = Integer::from(1);
        let frozen = observer.freeze();

        for i in (0..num_bits).rev() {
            ctx.check()?;

            // t = 2·F(k+1) − F(k)
            let t = Integer::from(&fk1 << 1u32) - &fk;
            let f2k = Integer::from(&fk * &t);
            let f2k1 = Integer::from(&fk * &fk) + Integer::from(&fk1 * &fk1);

            fk = f2k;
            fk1 = f2k1;

            if (n >> i) & 1 == 1 {
                std::mem::swap(&mut fk, &mut fk1);
                fk1 += &fk;
            }

            let progress = 1.0 - (f64::from(i) / f64::from(num_bits));
            if frozen.should_report(progress) {
                frozen.update(progress);
                observer.on_progress(&ProgressUpdate::new(
                    calc_index,
                    "GmpFastDoubling",
                    progress,
                    u64::from(num_bits - i),
                    u64::from(num_bits),
                ));
            }
        }

        let result = to_biguint(&fk)?;
        observer.on_progress(&ProgressUpdate::done(calc_index, self.name()));
        Ok(result)
    }

    fn name(&self) -> &'static str {
        "GmpFastDoubling"
    }
}
