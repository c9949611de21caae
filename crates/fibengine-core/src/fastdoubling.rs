//! Fast Doubling with adaptive multiplication.
//!
//! F(2k) = F(k)·(2·F(k+1) − F(k)), F(2k+1) = F(k+1)² + F(k)².

use num_bigint::BigUint;

use crate::calculator::CoreCalculator;
use crate::context::CalcContext;
use crate::doubling::execute_doubling_loop;
use crate::error::FibError;
use crate::observer::ProgressObserver;
use crate::options::Options;
use crate::progress::ProgressUpdate;
use crate::strategy::AdaptiveStrategy;

/// The default production algorithm.
pub struct FastDoubling;

impl FastDoubling {
    /// The Fast Doubling calculator.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for FastDoubling {
    fn default() -> Self {
        Self::new()
    }
}

impl CoreCalculator for FastDoubling {
    fn calculate_core(
        &self,
        ctx: &CalcContext,
        observer: &dyn ProgressObserver,
        calc_index: usize,
        n: u64,
        opts: &Options,
    ) -> Result<BigUint, FibError> {
        let strategy = AdaptiveStrategy::new(opts.fft_threshold);
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
        "FastDoubling"
    }
}
