//! # fibengine-core
//!
//! Logarithmic-time Fibonacci calculators for n up to ~10^9: Fast Doubling,
//! Matrix Exponentiation, and an NTT-forced variant, sharing one iteration
//! driver and a pluggable multiplication strategy. Memory behavior is bounded
//! by per-call arenas, size-classed object recycling, and a process-wide
//! reclaim controller.

pub mod calculator;
pub mod collector;
pub mod common;
pub mod comparison;
pub mod constants;
pub mod context;
pub mod doubling;
pub mod dynamic_threshold;
pub mod error;
pub mod fastdoubling;
pub mod fft_based;
pub mod iterator;
pub mod matrix;
pub mod matrix_ops;
pub mod matrix_types;
pub mod memory_budget;
pub mod modular;
pub mod observer;
pub mod observers;
pub mod options;
pub mod progress;
pub mod registry;
pub mod state;
pub mod strategy;
pub mod threshold_types;

#[cfg(feature = "gmp")]
pub mod calculator_gmp;

// Re-exports
pub use calculator::{Calculator, CoreCalculator, FibCalculator};
pub use constants::*;
pub use context::CalcContext;
pub use error::FibError;
pub use observer::{ProgressObserver, SequenceProgress};
pub use options::{GcMode, Options};
pub use progress::ProgressUpdate;
pub use registry::{CalculatorFactory, DefaultFactory};
pub use strategy::{DoublingStepExecutor, Multiplier};
