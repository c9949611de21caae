//! # fibengine-memory
//!
//! Memory management primitives shared by the FibEngine workspace:
//! bump arenas for transform scratch, a pre-sized calculation arena for the
//! doubling state, size-classed `BigUint` recycling, and bounded per-thread
//! state pools that spill into the shared pool when full.
#![warn(missing_docs)]

pub mod arena;
pub mod calc_arena;
pub mod local_pool;
pub mod pool;
pub mod stats;
pub mod warming;

pub use arena::ScratchArena;
pub use calc_arena::{fib_bits, CalculationArena};
pub use local_pool::LocalPool;
pub use pool::{global_pool, BigIntPool, MAX_POOLED_BIT_LEN};
pub use stats::{AtomicPoolStats, PoolStats};
