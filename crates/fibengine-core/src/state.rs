//! The doubling loop's working set.
//!
//! Exactly five integers: the running pair and three scratch slots. The
//! pre-doubling value 2·F(k+1)−F(k) lives in `t2` and is consumed by the
//! step's first multiplication before `t2` is overwritten with F(k)², so no
//! sixth temporary exists. All movement between slots is `mem::swap`; a
//! value is never copied limb-by-limb.

use fibengine_memory::LocalPool;
use num_bigint::BigUint;
use num_traits::{One, Zero};

/// State of one Fast Doubling run.
pub struct CalculationState {
    /// F(k) for the reconstructed prefix k of n.
    pub fk: BigUint,
    /// F(k+1).
    pub fk1: BigUint,
    /// Scratch: receives F(k+1)² during a step.
    pub t1: BigUint,
    /// Scratch: carries 2·F(k+1)−F(k) into the step, leaves as F(k)².
    pub t2: BigUint,
    /// Scratch: receives F(k)·(2·F(k+1)−F(k)) during a step.
    pub t3: BigUint,
}

impl CalculationState {
    /// State initialized to (F(0), F(1)) = (0, 1).
    #[must_use]
    pub fn new() -> Self {
        Self {
            fk: BigUint::ZERO,
            fk1: BigUint::one(),
            t1: BigUint::ZERO,
            t2: BigUint::ZERO,
            t3: BigUint::ZERO,
        }
    }

    /// Restore the initial pair for reuse; buffers keep their capacity.
    pub fn reset(&mut self) {
        self.fk.set_zero();
        self.fk1.set_one();
        self.t1.set_zero();
        self.t2.set_zero();
        self.t3.set_zero();
    }

    /// Compute `t2 = 2·fk1 − fk` in place, reusing `t2`'s buffer.
    pub fn prepare_doubling(&mut self) {
        self.t2.clone_from(&self.fk1);
        self.t2 <<= 1u32;
        self.t2 -= &self.fk;
    }

    /// Rotate the freshly computed pair into place.
    ///
    /// Expects `t3 = F(2k)`, `t1 = F(k+1)²`, `t2 = F(k)²` as written by the
    /// step executor. Afterwards `(fk, fk1) = (F(2k), F(2k+1))` and the old
    /// pair's buffers sit in the scratch slots.
    pub fn commit_doubling(&mut self) {
        self.t1 += &self.t2; // F(2k+1) = F(k+1)² + F(k)²
        std::mem::swap(&mut self.fk, &mut self.t3);
        std::mem::swap(&mut self.fk1, &mut self.t1);
    }

    /// Advance by one index: `(fk, fk1) ← (fk1, fk + fk1)`.
    pub fn advance(&mut self) {
        std::mem::swap(&mut self.fk, &mut self.fk1);
        self.fk1 += &self.fk;
    }

    /// Move the result out, leaving a fresh zero in its slot.
    #[must_use]
    pub fn steal_result(&mut self) -> BigUint {
        std::mem::take(&mut self.fk)
    }
}

impl Default for CalculationState {
    fn default() -> Self {
        Self::new()
    }
}

const STATE_POOL_MAX: usize = 4;

thread_local! {
    static STATE_POOL: LocalPool<CalculationState> = const { LocalPool::new(STATE_POOL_MAX) };
}

/// Take a reset state from the thread-local pool.
pub fn acquire_state() -> CalculationState {
    STATE_POOL.with(|pool| pool.acquire(CalculationState::new, CalculationState::reset))
}

/// Return a state for reuse. When the thread-local pool is full, the five
/// buffers go to the process-wide pool instead of the heap, so other
/// calculators can recycle the grown magnitudes.
pub fn release_state(state: CalculationState) {
    if let Some(state) = STATE_POOL.with(|pool| pool.release(state)) {
        let shared = fibengine_memory::global_pool();
        shared.release(state.fk);
        shared.release(state.fk1);
        shared.release(state.t1);
        shared.release(state.t2);
        shared.release(state.t3);
    }
}
