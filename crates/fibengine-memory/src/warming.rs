//! Pool warming for upcoming calculations.
//!
//! Warming trades a little idle-time allocation for allocation-free first
//! steps of a big run: the size classes a calculation of F(n) will touch are
//! pre-populated before the loop starts.

use crate::calc_arena::fib_bits;
use crate::pool::BigIntPool;

/// Pre-populate the classes a calculation of F(n) draws from: the result
/// class and the product class one size up, `count` objects each.
pub fn warm_for_index(pool: &BigIntPool, n: u64, count: usize) {
    let result_bits = fib_bits(n);
    if result_bits == 0 {
        return;
    }
    pool.warm(result_bits, count);
    // Step products are up to twice the running pair's width.
    pool.warm(result_bits * 2, count);
}
