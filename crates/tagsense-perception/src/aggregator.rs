//! [`SampleAggregator`] – batch averaging of marker pose samples.
//!
//! Each accepted pose contributes its lateral (`x`) and forward (`z`)
//! offsets to a running batch. When the batch holds `batch_size` samples the
//! aggregator emits a [`BatchAverage`] and arms a reset: the next call starts
//! a fresh batch, so no partial sum leaks from one batch into the next.
//!
//! # Scaling
//!
//! Published averages are in centimeters, truncated (floored) to one decimal
//! place:
//!
//! ```text
//! scaled = floor(sum / count * 100 * 10) / 10
//! ```
//!
//! # Example
//!
//! ```rust
//! use tagsense_perception::aggregator::SampleAggregator;
//!
//! let mut agg = SampleAggregator::new(5);
//! for _ in 0..4 {
//!     assert!(agg.accumulate(0.1, 0.1).is_none());
//! }
//! let avg = agg.accumulate(0.1, 0.1).unwrap();
//! assert_eq!(avg.x, 10.0);
//! assert_eq!(avg.z, 10.0);
//! ```

use serde::{Deserialize, Serialize};

/// Samples per batch unless configured otherwise.
pub const DEFAULT_BATCH_SIZE: usize = 5;

/// What happens to the first sample after a completed batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchResetPolicy {
    /// Reset, then count the sample as the first of the next batch.
    #[default]
    ResetThenAdd,
    /// Reset and drop the sample; the next batch starts one call later.
    DiscardOverflow,
}

/// Average of one completed batch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatchAverage {
    /// Lateral average, scaled and truncated.
    pub x: f64,
    /// Forward average, scaled and truncated.
    pub z: f64,
    /// Unscaled lateral mean in meters.
    pub mean_x_m: f64,
    /// Unscaled forward mean in meters. Thresholds compare against this.
    pub mean_z_m: f64,
}

/// Convert a mean in meters to centimeters floored to one decimal place.
pub fn scale_truncate(mean_m: f64) -> f64 {
    (mean_m * 100.0 * 10.0).floor() / 10.0
}

/// Fixed-size batch accumulator. Holds `0..=batch_size` samples.
#[derive(Debug, Clone)]
pub struct SampleAggregator {
    batch_size: usize,
    policy: BatchResetPolicy,
    x_sum: f64,
    z_sum: f64,
    count: usize,
    reset_armed: bool,
}

impl SampleAggregator {
    /// Create an aggregator with the default [`BatchResetPolicy`].
    ///
    /// A `batch_size` of zero is treated as one.
    pub fn new(batch_size: usize) -> Self {
        Self::with_policy(batch_size, BatchResetPolicy::default())
    }

    pub fn with_policy(batch_size: usize, policy: BatchResetPolicy) -> Self {
        Self {
            batch_size: batch_size.max(1),
            policy,
            x_sum: 0.0,
            z_sum: 0.0,
            count: 0,
            reset_armed: false,
        }
    }

    /// Add one pose sample.
    ///
    /// Returns the batch average when this sample completes a batch.
    pub fn accumulate(&mut self, x: f64, z: f64) -> Option<BatchAverage> {
        if self.reset_armed {
            self.reset();
            if self.policy == BatchResetPolicy::DiscardOverflow {
                return None;
            }
        }

        self.x_sum += x;
        self.z_sum += z;
        self.count += 1;

        if self.count < self.batch_size {
            return None;
        }

        self.reset_armed = true;
        let n = self.count as f64;
        let mean_x_m = self.x_sum / n;
        let mean_z_m = self.z_sum / n;
        Some(BatchAverage {
            x: scale_truncate(mean_x_m),
            z: scale_truncate(mean_z_m),
            mean_x_m,
            mean_z_m,
        })
    }

    /// Samples in the current batch.
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Drop the current batch.
    pub fn reset(&mut self) {
        self.x_sum = 0.0;
        self.z_sum = 0.0;
        self.count = 0;
        self.reset_armed = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(agg: &mut SampleAggregator, samples: &[(f64, f64)]) -> Vec<BatchAverage> {
        samples
            .iter()
            .filter_map(|&(x, z)| agg.accumulate(x, z))
            .collect()
    }

    #[test]
    fn emits_after_exactly_batch_size_samples() {
        let mut agg = SampleAggregator::new(5);
        for i in 0..4 {
            assert!(agg.accumulate(0.1, 0.5).is_none());
            assert_eq!(agg.count(), i + 1);
        }
        let avg = agg.accumulate(0.1, 0.5).expect("fifth sample completes batch");
        assert_eq!(avg.x, 10.0);
        assert_eq!(avg.z, 50.0);
        assert!((avg.mean_z_m - 0.5).abs() < 1e-12);
    }

    #[test]
    fn axes_are_averaged_independently() {
        let mut agg = SampleAggregator::new(5);
        let out = feed(
            &mut agg,
            &[(0.0, 1.0), (0.1, 1.0), (0.2, 1.0), (0.3, 1.0), (0.4, 1.0)],
        );
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].x, 20.0);
        assert_eq!(out[0].z, 100.0);
    }

    #[test]
    fn truncation_floors_instead_of_rounding() {
        // 0.12345 m -> 123.45 -> floor 123 -> 12.3
        assert_eq!(scale_truncate(0.12345), 12.3);
        assert_eq!(scale_truncate(0.12399), 12.3);
        // Negative values floor toward negative infinity.
        assert_eq!(scale_truncate(-0.12345), -12.4);
    }

    #[test]
    fn next_batch_starts_from_zero() {
        let mut agg = SampleAggregator::new(5);
        feed(&mut agg, &[(1.0, 1.0); 5]);
        assert_eq!(agg.count(), 5);

        // The sixth sample starts a fresh batch.
        assert!(agg.accumulate(0.2, 0.3).is_none());
        assert_eq!(agg.count(), 1);

        let out = feed(&mut agg, &[(0.2, 0.3); 4]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].x, 20.0);
        assert_eq!(out[0].z, 30.0);
    }

    #[test]
    fn publishes_every_batch_size_samples() {
        let mut agg = SampleAggregator::new(5);
        let out = feed(&mut agg, &[(0.0, 0.6); 15]);
        assert_eq!(out.len(), 3);
    }

    #[test]
    fn discard_overflow_drops_first_sample_after_batch() {
        let mut agg = SampleAggregator::with_policy(5, BatchResetPolicy::DiscardOverflow);
        feed(&mut agg, &[(0.0, 0.6); 5]);

        // Dropped: the batch stays empty.
        assert!(agg.accumulate(9.0, 9.0).is_none());
        assert_eq!(agg.count(), 0);

        let out = feed(&mut agg, &[(0.0, 0.8); 5]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].z, 80.0);

        // One average per six samples under this policy.
        let mut agg = SampleAggregator::with_policy(5, BatchResetPolicy::DiscardOverflow);
        assert_eq!(feed(&mut agg, &[(0.0, 0.6); 18]).len(), 3);
    }

    #[test]
    fn sparse_samples_never_emit() {
        let mut agg = SampleAggregator::new(5);
        assert!(feed(&mut agg, &[(0.0, 0.6); 4]).is_empty());
        assert_eq!(agg.count(), 4);
        agg.reset();
        assert_eq!(agg.count(), 0);
    }

    #[test]
    fn zero_batch_size_behaves_as_one() {
        let mut agg = SampleAggregator::new(0);
        assert_eq!(agg.batch_size(), 1);
        assert!(agg.accumulate(0.1, 0.2).is_some());
        assert!(agg.accumulate(0.1, 0.2).is_some());
    }
}
