//! NTT-forced Fast Doubling.
//!
//! Same driver as `FastDoubling`, but every multiplication routes through
//! the transform pipeline. Exists for very large n and for differential
//! testing of the NTT subsystem.

use num_bigint::BigUint;

use crate::calculator::CoreCalculator;
use crate::context::CalcContext;
use crate::doubling::execute_doubling_loop;
use crate::error::FibError;
use crate::observer::ProgressObserver;
use crate::options::Options;
use crate::progress::ProgressUpdate;
use crate::strategy::FftOnlyStrategy;

/// Fast Doubling with NTT on every step.
pub struct FftDoubling;

impl FftDoubling {
    /// The NTT-forced calculator.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for FftDoubling {
    fn default() -> Self {
        Self::new()
    }
}

impl CoreCalculator for FftDoubling {
    fn calculate_core(
        &self,
        ctx: &CalcContext,
        observer: &dyn ProgressObserver,
        calc_index: usize,
        n: u64,
        opts: &Options,
    ) -> Result<BigUint, FibError> {
        let strategy = FftOnlyStrategy::new();
        let result = execute_doubling_loop(
            n,
            &strategy,
            ctx,
            observer,
            calc_index,
            self.name(),
            opts,
        )?;
        observer.on_progress(&ProgressUpdate::done(calc_index, self.name()));
        Ok(result)
    }

    fn name(&self) -> &'static str {
        "FftDoubling"
    }
}
