//! Batch emission
//!
//! Every accepted vector is an arrival for the [`RateTracker`] and a value for
//! the [`WindowedAccumulator`]. Once the batch is full both are summarized into
//! one [`SummaryRow`] and reset, so reporting cadence follows data volume
//! rather than wall-clock time.

use crate::accumulator::{ContractViolation, WindowedAccumulator};
use crate::config::ClientConfig;
use crate::rate::RateTracker;
use ratebench_shared::types::vector::SummaryRow;
use std::time::Instant;
use tracing::debug;

pub struct BatchPipeline {
    rate: RateTracker,
    accumulator: WindowedAccumulator,
    batch_size: usize,
}

impl BatchPipeline {
    pub fn new(rate: RateTracker, accumulator: WindowedAccumulator, batch_size: usize) -> Self {
        Self {
            rate,
            accumulator,
            batch_size,
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(
            RateTracker::new(config.rate_window, config.batch_size),
            WindowedAccumulator::new(config.vector_len, config.batch_size),
            config.batch_size,
        )
    }

    /// Vectors buffered towards the next row.
    pub fn pending(&self) -> usize {
        self.accumulator.size()
    }

    /// Accept a vector that arrived now.
    pub fn push(&mut self, vector: &[f64]) -> Result<Option<SummaryRow>, ContractViolation> {
        self.push_at(vector, Instant::now())
    }

    /// Accept a vector that arrived at `now`, returning a row when it
    /// completes a batch.
    pub fn push_at(
        &mut self,
        vector: &[f64],
        now: Instant,
    ) -> Result<Option<SummaryRow>, ContractViolation> {
        let count = self.accumulator.add(vector)?;
        self.rate.got_packet_at(now);
        if count < self.batch_size {
            return Ok(None);
        }

        let (rate_mean, rate_std) = self.rate.stats();
        debug!(
            "data rate of last {}: {:.2} Hz  std:{:.2} Hz",
            self.rate.size(),
            rate_mean,
            rate_std
        );

        let (means, stds) = self.accumulator.stats();
        let row = SummaryRow {
            rate_mean,
            rate_std,
            vector_mean: means.to_vec(),
            vector_std: stds.to_vec(),
        };

        self.rate.reset();
        self.accumulator.reset();
        Ok(Some(row))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rate::RateWindowKind;
    use std::time::Duration;

    fn pipeline(vector_len: usize, batch_size: usize) -> BatchPipeline {
        BatchPipeline::new(
            RateTracker::new(RateWindowKind::Rolling, batch_size),
            WindowedAccumulator::new(vector_len, batch_size),
            batch_size,
        )
    }

    #[test]
    fn test_row_emitted_exactly_at_batch_size() {
        let mut pipeline = pipeline(2, 3);
        let start = Instant::now();
        let step = Duration::from_millis(10);

        assert!(pipeline.push_at(&[1.0, 4.0], start).unwrap().is_none());
        assert!(pipeline.push_at(&[2.0, 4.0], start + step).unwrap().is_none());
        let row = pipeline
            .push_at(&[3.0, 4.0], start + step * 2)
            .unwrap()
            .expect("batch complete");

        // First arrival ever is skipped: two 100 Hz samples.
        assert!((row.rate_mean - 100.0).abs() < 1e-9);
        assert!(row.rate_std.abs() < 1e-9);
        assert_eq!(row.vector_mean, vec![2.0, 4.0]);
        assert_eq!(row.vector_std[1], 0.0);
        assert!((row.vector_std[0] - (2.0f64 / 3.0).sqrt()).abs() < 1e-12);
        assert_eq!(pipeline.pending(), 0);
    }

    #[test]
    fn test_rate_continues_across_batches() {
        let mut pipeline = pipeline(1, 2);
        let start = Instant::now();
        let step = Duration::from_millis(4);

        pipeline.push_at(&[0.0], start).unwrap();
        pipeline.push_at(&[0.0], start + step).unwrap().unwrap();

        // Second batch: both arrivals produce samples at 250 Hz.
        pipeline.push_at(&[1.0], start + step * 2).unwrap();
        let row = pipeline.push_at(&[1.0], start + step * 3).unwrap().unwrap();
        assert!((row.rate_mean - 250.0).abs() < 1e-9);
        assert_eq!(row.vector_mean, vec![1.0]);
        assert_eq!(row.values().count(), 4);
    }

    #[test]
    fn test_mismatched_vector_fails_fast() {
        let mut pipeline = pipeline(3, 10);
        let err = pipeline.push(&[1.0]).unwrap_err();
        assert!(matches!(err, ContractViolation::LengthMismatch { expected: 3, got: 1 }));
        assert_eq!(pipeline.pending(), 0);
    }
}
