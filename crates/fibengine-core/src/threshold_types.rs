//! Types for runtime threshold adjustment.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::strategy::StepReport;

/// One step's measurement, as kept in the ring buffer.
#[derive(Debug, Clone, Copy)]
pub struct IterationMetric {
    /// Largest operand bit length of the step.
    pub bit_length: usize,
    /// Wall time of the step's multiplications.
    pub duration: Duration,
    /// Whether the NTT path was taken.
    pub used_fft: bool,
    /// Whether the multiplications ran concurrently.
    pub used_parallel: bool,
}

impl IterationMetric {
    /// Normalized cost: nanoseconds per operand bit.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn cost_per_bit(&self) -> f64 {
        if self.bit_length == 0 {
            return 0.0;
        }
        self.duration.as_nanos() as f64 / self.bit_length as f64
    }
}

impl From<StepReport> for IterationMetric {
    fn from(report: StepReport) -> Self {
        Self {
            bit_length: report.bit_length,
            duration: report.duration,
            used_fft: report.used_fft,
            used_parallel: report.used_parallel,
        }
    }
}

/// Record of one threshold change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThresholdAdjustment {
    /// Which threshold moved (`"fft"` or `"parallel"`).
    pub threshold_name: String,
    /// Value before.
    pub old_value: usize,
    /// Value after.
    pub new_value: usize,
    /// The cost ratio that triggered the move.
    pub trigger_ratio: f64,
}

/// Serializable view of the manager, for an outer calibration layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThresholdSnapshot {
    /// Current parallel threshold in bits.
    pub parallel_threshold: usize,
    /// Current FFT threshold in bits.
    pub fft_threshold: usize,
    /// Total adjustments so far.
    pub adjustment_count: usize,
    /// Recent adjustments, oldest first (bounded).
    pub adjustment_history: Vec<ThresholdAdjustment>,
}
