//! Windowed vector accumulator
//!
//! Buffers the vectors of one batch in a single contiguous row-major buffer
//! (one row per vector) and computes per-component mean and standard
//! deviation along the time axis.

use ratebench_shared::stats::RunningStat;
use thiserror::Error;

/// A caller broke the accumulator's contract. This is a configuration or
/// programming bug, not a runtime condition to recover from.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ContractViolation {
    #[error("vector length mismatch: expected {expected}, got {got}")]
    LengthMismatch { expected: usize, got: usize },
}

#[derive(Debug)]
pub struct WindowedAccumulator {
    vector_len: usize,
    /// invariant: `data.len() == vector_len * count`
    data: Vec<f64>,
    count: usize,
    // scratch buffers returned by `stats`
    means: Vec<f64>,
    stds: Vec<f64>,
}

impl WindowedAccumulator {
    /// Create an accumulator for vectors of `vector_len` values, with room
    /// for `batch_hint` vectors before reallocating.
    pub fn new(vector_len: usize, batch_hint: usize) -> Self {
        Self {
            vector_len,
            data: Vec::with_capacity(vector_len * batch_hint),
            count: 0,
            means: Vec::with_capacity(vector_len),
            stds: Vec::with_capacity(vector_len),
        }
    }

    /// Append a vector to the batch and return the batch size.
    pub fn add(&mut self, vector: &[f64]) -> Result<usize, ContractViolation> {
        if vector.len() != self.vector_len {
            return Err(ContractViolation::LengthMismatch {
                expected: self.vector_len,
                got: vector.len(),
            });
        }
        self.data.extend_from_slice(vector);
        self.count += 1;
        Ok(self.count)
    }

    pub fn size(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Per-component `(means, stds)` over the vectors currently buffered.
    ///
    /// The slices borrow internal scratch space and are overwritten by the
    /// next call.
    pub fn stats(&mut self) -> (&[f64], &[f64]) {
        self.means.clear();
        self.stds.clear();
        for component in 0..self.vector_len {
            let stat: RunningStat = self
                .data
                .iter()
                .skip(component)
                .step_by(self.vector_len)
                .copied()
                .collect();
            self.means.push(stat.mean());
            self.stds.push(stat.std_dev());
        }
        (&self.means, &self.stds)
    }

    /// Empty the batch, keeping the allocation for the next one.
    pub fn reset(&mut self) {
        self.data.clear();
        self.count = 0;
    }
}
