//! Multiplication strategies.
//!
//! `Multiplier` is the narrow multiply/square interface; `DoublingStepExecutor`
//! extends it with the full doubling step over a `CalculationState`. The three
//! multiplications of a step are mutually independent and may run on the rayon
//! pool; each writes its own destination slot, so nothing aliases.

use std::time::{Duration, Instant};

use num_bigint::BigUint;

use crate::context::CalcContext;
use crate::error::FibError;
use crate::options::Options;
use crate::state::CalculationState;

/// Live threshold set for one step. The driver rebuilds this between steps,
/// so dynamic adjustments apply to subsequent steps only.
#[derive(Debug, Clone, Copy)]
pub struct StepThresholds {
    /// Operand bits above which the step runs its multiplications in parallel.
    pub parallel: usize,
    /// Operand bits strictly above which NTT multiplication is used.
    pub fft: usize,
    /// Operand bits above which the NTT path may also parallelize.
    pub parallel_fft: usize,
}

impl StepThresholds {
    /// Thresholds as configured in the options record.
    #[must_use]
    pub fn from_options(opts: &Options) -> Self {
        Self {
            parallel: opts.parallel_threshold,
            fft: opts.fft_threshold,
            parallel_fft: opts.parallel_fft_threshold,
        }
    }
}

/// What one executed step looked like, for the threshold manager.
#[derive(Debug, Clone, Copy)]
pub struct StepReport {
    /// Largest operand bit length in the step.
    pub bit_length: usize,
    /// Wall time of the three multiplications.
    pub duration: Duration,
    /// Whether the NTT path was taken.
    pub used_fft: bool,
    /// Whether the multiplications ran concurrently.
    pub used_parallel: bool,
}

/// Narrow interface for multiplication operations.
pub trait Multiplier: Send + Sync {
    /// Multiply two big unsigned integers.
    fn multiply(&self, a: &BigUint, b: &BigUint) -> BigUint;

    /// Square (may be cheaper than a general multiply).
    fn square(&self, a: &BigUint) -> BigUint {
        self.multiply(a, a)
    }

    /// Strategy name.
    fn name(&self) -> &'static str;
}

/// Wide interface: one full doubling step over the state.
pub trait DoublingStepExecutor: Multiplier {
    /// Execute the step's three multiplications, writing
    /// `t3 = fk·t2`, `t1 = fk1²`, `t2 = fk²`.
    ///
    /// `state.t2` must hold `2·fk1 − fk` on entry (see
    /// [`CalculationState::prepare_doubling`]). The context is consulted
    /// between the multiplications on the sequential path.
    fn execute_step(
        &self,
        state: &mut CalculationState,
        ctx: &CalcContext,
        thresholds: &StepThresholds,
    ) -> Result<StepReport, FibError>;
}

#[allow(clippy::cast_possible_truncation)]
fn step_bit_length(state: &CalculationState) -> usize {
    state
        .fk
        .bits()
        .max(state.fk1.bits())
        .max(state.t2.bits()) as usize
}

/// Shared step body: `force_fft` pins the multiplication route,
/// `None` decides from the thresholds.
fn run_step(
    state: &mut CalculationState,
    ctx: &CalcContext,
    thresholds: &StepThresholds,
    force_fft: Option<bool>,
) -> Result<StepReport, FibError> {
    ctx.check()?;

    let bit_length = step_bit_length(state);
    #[allow(clippy::cast_possible_truncation)]
    let fk_bits = state.fk.bits() as usize;

    let use_fft = force_fft.unwrap_or(bit_length > thresholds.fft);
    let use_parallel =
        fk_bits > thresholds.parallel && (!use_fft || fk_bits > thresholds.parallel_fft);

    let started = Instant::now();

    if use_parallel {
        let fk = &state.fk;
        let fk1 = &state.fk1;
        let t2 = &state.t2;
        let (t3, (t1, fk_sq)) = rayon::join(
            || route_mul(fk, t2, use_fft),
            || {
                rayon::join(
                    || route_sqr(fk1, use_fft),
                    || route_sqr(fk, use_fft),
                )
            },
        );
        state.t3 = t3;
        state.t1 = t1;
        state.t2 = fk_sq;
    } else {
        state.t3 = route_mul(&state.fk, &state.t2, use_fft);
        ctx.check()?;
        state.t1 = route_sqr(&state.fk1, use_fft);
        ctx.check()?;
        state.t2 = route_sqr(&state.fk, use_fft);
    }

    Ok(StepReport {
        bit_length,
        duration: started.elapsed(),
        used_fft: use_fft,
        used_parallel: use_parallel,
    })
}

fn route_mul(a: &BigUint, b: &BigUint, use_fft: bool) -> BigUint {
    if use_fft {
        fibengine_bigfft::mul(a, b)
    } else {
        a * b
    }
}

fn route_sqr(a: &BigUint, use_fft: bool) -> BigUint {
    if use_fft {
        fibengine_bigfft::sqr(a)
    } else {
        a * a
    }
}

/// Schoolbook/Karatsuba only (num-bigint's native multiply); the
/// differential-testing baseline.
pub struct KaratsubaStrategy;

impl KaratsubaStrategy {
    /// The baseline strategy.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for KaratsubaStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl Multiplier for KaratsubaStrategy {
    fn multiply(&self, a: &BigUint, b: &BigUint) -> BigUint {
        a * b
    }

    fn square(&self, a: &BigUint) -> BigUint {
        a * a
    }

    fn name(&self) -> &'static str {
        "Karatsuba"
    }
}

impl DoublingStepExecutor for KaratsubaStrategy {
    fn execute_step(
        &self,
        state: &mut CalculationState,
        ctx: &CalcContext,
        thresholds: &StepThresholds,
    ) -> Result<StepReport, FibError> {
        run_step(state, ctx, thresholds, Some(false))
    }
}

/// NTT on every multiplication, regardless of operand size.
pub struct FftOnlyStrategy;

impl FftOnlyStrategy {
    /// The NTT-forced strategy.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for FftOnlyStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl Multiplier for FftOnlyStrategy {
    fn multiply(&self, a: &BigUint, b: &BigUint) -> BigUint {
        fibengine_bigfft::mul(a, b)
    }

    fn square(&self, a: &BigUint) -> BigUint {
        fibengine_bigfft::sqr(a)
    }

    fn name(&self) -> &'static str {
        "FftOnly"
    }
}

impl DoublingStepExecutor for FftOnlyStrategy {
    fn execute_step(
        &self,
        state: &mut CalculationState,
        ctx: &CalcContext,
        thresholds: &StepThresholds,
    ) -> Result<StepReport, FibError> {
        run_step(state, ctx, thresholds, Some(true))
    }
}

/// Per-step dispatch between schoolbook and NTT from the live thresholds.
pub struct AdaptiveStrategy {
    fft_threshold: usize,
}

impl AdaptiveStrategy {
    /// Adaptive strategy; `fft_threshold` serves the narrow interface, the
    /// step path reads the live thresholds instead.
    #[must_use]
    pub fn new(fft_threshold: usize) -> Self {
        Self { fft_threshold }
    }
}

impl Multiplier for AdaptiveStrategy {
    #[allow(clippy::cast_possible_truncation)]
    fn multiply(&self, a: &BigUint, b: &BigUint) -> BigUint {
        let max_bits = a.bits().max(b.bits()) as usize;
        route_mul(a, b, max_bits > self.fft_threshold)
    }

    #[allow(clippy::cast_possible_truncation)]
    fn square(&self, a: &BigUint) -> BigUint {
        route_sqr(a, a.bits() as usize > self.fft_threshold)
    }

    fn name(&self) -> &'static str {
        "Adaptive"
    }
}

impl DoublingStepExecutor for AdaptiveStrategy {
    fn execute_step(
        &self,
        state: &mut CalculationState,
        ctx: &CalcContext,
        thresholds: &StepThresholds,
    ) -> Result<StepReport, FibError> {
        run_step(state, ctx, thresholds, None)
    }
}
