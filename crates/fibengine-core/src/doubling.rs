//! Shared MSB-to-LSB doubling driver.
//!
//! Maintains `(fk, fk1) = (F(k), F(k+1))` where k is the prefix of n above
//! the current bit. Each iteration runs one step through the strategy,
//! rotates the state, optionally advances for a set bit, and emits progress.
//! The result is stolen from the final state, never copied.

use num_bigint::BigUint;

use crate::context::CalcContext;
use crate::dynamic_threshold::DynamicThresholdManager;
use crate::error::FibError;
use crate::observer::ProgressObserver;
use crate::options::Options;
use crate::progress::ProgressUpdate;
use crate::state::{acquire_state, release_state};
use crate::strategy::{DoublingStepExecutor, StepThresholds};

/// Run the doubling loop for F(n) with the given step executor.
pub fn execute_doubling_loop(
    n: u64,
    executor: &dyn DoublingStepExecutor,
    ctx: &CalcContext,
    observer: &dyn ProgressObserver,
    calc_index: usize,
    algorithm_name: &'static str,
    opts: &Options,
) -> Result<BigUint, FibError> {
    let num_bits = 64 - n.leading_zeros();
    let mut state = acquire_state();
    let frozen = observer.freeze();

    let mut thresholds = StepThresholds::from_options(opts);
    let mut manager = opts.enable_dynamic_thresholds.then(|| {
        DynamicThresholdManager::new(
            opts.parallel_threshold,
            opts.fft_threshold,
            opts.dynamic_adjustment_interval,
        )
    });

    let result = (|| {
        for i in (0..num_bits).rev() {
            ctx.check()?;

            state.prepare_doubling();
            let report = executor.execute_step(&mut state, ctx, &thresholds)?;
            state.commit_doubling();

            if (n >> i) & 1 == 1 {
                state.advance();
            }

            // Adjustments apply from the next step onward.
            if let Some(manager) = manager.as_mut() {
                manager.record(report.into());
                thresholds.parallel = manager.parallel_threshold();
                thresholds.fft = manager.fft_threshold();
            }

            let progress = 1.0 - (f64::from(i) / f64::from(num_bits));
            if frozen.should_report(progress) {
                frozen.update(progress);
                observer.on_progress(&ProgressUpdate::new(
                    calc_index,
                    algorithm_name,
                    progress,
                    u64::from(num_bits - i),
                    u64::from(num_bits),
                ));
            }
        }

        Ok(state.steal_result())
    })();

    // The state goes back to the pool on success and on failure alike.
    release_state(state);
    result
}
