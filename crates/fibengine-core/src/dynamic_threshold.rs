//! Runtime threshold adjustment.
//!
//! A 20-entry ring of step measurements, recomputed every 5 recorded steps.
//! When, at operand sizes near the current crossover, one route is
//! consistently cheaper per bit than the other by more than the 15 %
//! hysteresis band, the threshold moves 15 % toward it. In-flight steps keep
//! the thresholds they started with.

use tracing::debug;

use crate::constants::{DEFAULT_FFT_THRESHOLD, DEFAULT_PARALLEL_THRESHOLD};
use crate::threshold_types::{IterationMetric, ThresholdAdjustment, ThresholdSnapshot};

/// Measurements retained in the ring.
const RING_SIZE: usize = 20;

/// Relative move per adjustment, and the band a cost ratio must leave
/// before anything moves.
const ADJUSTMENT_FACTOR: f64 = 0.15;
const HYSTERESIS: f64 = 0.15;

/// Floors keep a runaway feedback loop from disabling a route entirely.
const FFT_THRESHOLD_FLOOR: usize = 1024;
const PARALLEL_THRESHOLD_FLOOR: usize = 512;

/// Bounded history kept for snapshots.
const HISTORY_LIMIT: usize = 64;

/// Sliding-window threshold manager.
pub struct DynamicThresholdManager {
    ring: Vec<IterationMetric>,
    ring_pos: usize,
    interval: usize,
    steps_since_adjust: usize,
    current_parallel: usize,
    current_fft: usize,
    adjustment_count: usize,
    adjustment_history: Vec<ThresholdAdjustment>,
}

impl DynamicThresholdManager {
    /// A manager starting from the given thresholds, adjusting every
    /// `interval` recorded steps.
    #[must_use]
    pub fn new(parallel_threshold: usize, fft_threshold: usize, interval: usize) -> Self {
        Self {
            ring: Vec::with_capacity(RING_SIZE),
            ring_pos: 0,
            interval: interval.max(1),
            steps_since_adjust: 0,
            current_parallel: parallel_threshold,
            current_fft: fft_threshold,
            adjustment_count: 0,
            adjustment_history: Vec::new(),
        }
    }

    /// Record one step; every `interval` records triggers a recomputation.
    pub fn record(&mut self, metric: IterationMetric) {
        if self.ring.len() < RING_SIZE {
            self.ring.push(metric);
        } else {
            self.ring[self.ring_pos] = metric;
        }
        self.ring_pos = (self.ring_pos + 1) % RING_SIZE;

        self.steps_since_adjust += 1;
        if self.steps_since_adjust >= self.interval {
            self.steps_since_adjust = 0;
            self.adjust();
        }
    }

    /// Current parallel threshold in bits.
    #[must_use]
    pub fn parallel_threshold(&self) -> usize {
        self.current_parallel
    }

    /// Current FFT threshold in bits.
    #[must_use]
    pub fn fft_threshold(&self) -> usize {
        self.current_fft
    }

    /// Recorded metric count (bounded by the ring size).
    #[must_use]
    pub fn metric_count(&self) -> usize {
        self.ring.len()
    }

    /// Total adjustments so far.
    #[must_use]
    pub fn adjustment_count(&self) -> usize {
        self.adjustment_count
    }

    /// Serializable view of the current state.
    #[must_use]
    pub fn snapshot(&self) -> ThresholdSnapshot {
        ThresholdSnapshot {
            parallel_threshold: self.current_parallel,
            fft_threshold: self.current_fft,
            adjustment_count: self.adjustment_count,
            adjustment_history: self.adjustment_history.clone(),
        }
    }

    /// Set thresholds directly (e.g., from a persisted profile).
    pub fn set_thresholds(&mut self, parallel: usize, fft: usize) {
        self.current_parallel = parallel;
        self.current_fft = fft;
    }

    fn adjust(&mut self) {
        if let Some(ratio) = self.route_cost_ratio(self.current_fft, |m| m.used_fft) {
            // ratio = fft cost / schoolbook cost near the crossover.
            if ratio > 1.0 + HYSTERESIS {
                self.move_threshold("fft", ratio, true);
            } else if ratio < 1.0 - HYSTERESIS {
                self.move_threshold("fft", ratio, false);
            }
        }

        if let Some(ratio) = self.route_cost_ratio(self.current_parallel, |m| m.used_parallel) {
            if ratio > 1.0 + HYSTERESIS {
                self.move_threshold("parallel", ratio, true);
            } else if ratio < 1.0 - HYSTERESIS {
                self.move_threshold("parallel", ratio, false);
            }
        }
    }

    /// Mean cost-per-bit of the flagged route over the unflagged route,
    /// restricted to samples within a factor of two of `threshold`.
    fn route_cost_ratio(
        &self,
        threshold: usize,
        flagged: impl Fn(&IterationMetric) -> bool,
    ) -> Option<f64> {
        let near = |m: &&IterationMetric| {
            m.bit_length >= threshold / 2 && m.bit_length <= threshold.saturating_mul(2)
        };

        let mean = |want: bool| -> Option<f64> {
            let costs: Vec<f64> = self
                .ring
                .iter()
                .filter(near)
                .filter(|m| flagged(m) == want)
                .map(IterationMetric::cost_per_bit)
                .collect();
            if costs.is_empty() {
                return None;
            }
            #[allow(clippy::cast_precision_loss)]
            Some(costs.iter().sum::<f64>() / costs.len() as f64)
        };

        let flagged_cost = mean(true)?;
        let baseline_cost = mean(false)?;
        if baseline_cost <= 0.0 {
            return None;
        }
        Some(flagged_cost / baseline_cost)
    }

    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    fn move_threshold(&mut self, name: &str, ratio: f64, raise: bool) {
        let (current, floor) = match name {
            "fft" => (self.current_fft, FFT_THRESHOLD_FLOOR),
            _ => (self.current_parallel, PARALLEL_THRESHOLD_FLOOR),
        };
        let factor = if raise {
            1.0 + ADJUSTMENT_FACTOR
        } else {
            1.0 - ADJUSTMENT_FACTOR
        };
        let new_value = ((current as f64 * factor) as usize).max(floor);
        if new_value == current {
            return;
        }

        debug!(threshold = name, old = current, new = new_value, ratio, "threshold adjusted");
        match name {
            "fft" => self.current_fft = new_value,
            _ => self.current_parallel = new_value,
        }
        self.adjustment_count += 1;
        self.adjustment_history.push(ThresholdAdjustment {
            threshold_name: name.to_string(),
            old_value: current,
            new_value,
            trigger_ratio: ratio,
        });
        if self.adjustment_history.len() > HISTORY_LIMIT {
            self.adjustment_history.remove(0);
        }
    }
}

impl Default for DynamicThresholdManager {
    fn default() -> Self {
        Self::new(DEFAULT_PARALLEL_THRESHOLD, DEFAULT_FFT_THRESHOLD, 5)
    }
}
