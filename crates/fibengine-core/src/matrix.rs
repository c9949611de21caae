//! Matrix Exponentiation calculator.
//!
//! Binary exponentiation of the Q-matrix; F(n) is read from the
//! off-diagonal of Q^n. Exists as an independently derived algorithm for
//! cross-validation of the doubling path.

use fibengine_memory::LocalPool;
use num_bigint::BigUint;

use crate::calculator::CoreCalculator;
use crate::context::CalcContext;
use crate::error::FibError;
use crate::matrix_ops::{mat_multiply, mat_square};
use crate::matrix_types::MatrixState;
use crate::observer::ProgressObserver;
use crate::options::Options;
use crate::progress::ProgressUpdate;

const MATRIX_POOL_MAX: usize = 4;

thread_local! {
    static MATRIX_POOL: LocalPool<MatrixState> = const { LocalPool::new(MATRIX_POOL_MAX) };
}

fn acquire_matrix_state() -> MatrixState {
    MATRIX_POOL.with(|pool| pool.acquire(MatrixState::new, MatrixState::reset))
}

/// Overflow spills the six entry buffers into the process-wide pool.
fn release_matrix_state(state: MatrixState) {
    if let Some(state) = MATRIX_POOL.with(|pool| pool.release(state)) {
        let shared = fibengine_memory::global_pool();
        shared.release(state.result.a);
        shared.release(state.result.b);
        shared.release(state.result.d);
        shared.release(state.base.a);
        shared.release(state.base.b);
        shared.release(state.base.d);
    }
}

/// The matrix exponentiation algorithm.
pub struct MatrixExponentiation;

impl MatrixExponentiation {
    /// The matrix calculator.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn execute_matrix_loop(
        n: u64,
        ctx: &CalcContext,
        observer: &dyn ProgressObserver,
        calc_index: usize,
        opts: &Options,
    ) -> Result<BigUint, FibError> {
        let num_bits = 64 - n.leading_zeros();
        let mut state = acquire_matrix_state();
        let frozen = observer.freeze();
        let strassen = opts.strassen_threshold;

        let result = (|| {
            for i in (0..num_bits).rev() {
                ctx.check()?;

                state.result = mat_square(&state.result);
                if (n >> i) & 1 == 1 {
                    state.result = mat_multiply(&state.result, &state.base, strassen);
                }

                let progress = 1.0 - (f64::from(i) / f64::from(num_bits));
                if frozen.should_report(progress) {
                    frozen.update(progress);
                    observer.on_progress(&ProgressUpdate::new(
                        calc_index,
                        "MatrixExponentiation",
                        progress,
                        u64::from(num_bits - i),
                        u64::from(num_bits),
                    ));
                }
            }

            // F(n) sits on the off-diagonal of Q^n.
            Ok(std::mem::take(&mut state.result.b))
        })();

        release_matrix_state(state);
        result
    }
}

impl Default for MatrixExponentiation {
    fn default() -> Self {
        Self::new()
    }
}

impl CoreCalculator for MatrixExponentiation {
    fn calculate_core(
        &self,
        ctx: &CalcContext,
        observer: &dyn ProgressObserver,
        calc_index: usize,
        n: u64,
        opts: &Options,
    ) -> Result<BigUint, FibError> {
        let result = Self::execute_matrix_loop(n, ctx, observer, calc_index, opts)?;
        observer.on_progress(&ProgressUpdate::done(calc_index, self.name()));
        Ok(result)
    }

    fn name(&self) -> &'static str {
        "MatrixExponentiation"
    }
}
