//! # fibengine-bigfft
//!
//! Number-theoretic-transform multiplication for arbitrary-precision
//! integers. Operands are split into polynomial coefficients over the Fermat
//! ring Z/(2^(64·M)+1), transformed with shift-only butterflies, multiplied
//! pointwise, and reassembled with carry propagation. Forward transforms of
//! recently seen operands are served from a content-addressed cache.

pub mod arith;
pub mod cache;
pub mod fermat;
pub mod fft;
pub mod gate;
pub mod mem_est;
pub mod params;
pub mod poly;
pub mod transform;

// Re-exports
pub use cache::{CachePolicy, TransformCache};
pub use fft::{mul, mul_to, sqr, sqr_to};
pub use mem_est::estimate_fft_memory;
pub use params::{fft_params, FftParams};
