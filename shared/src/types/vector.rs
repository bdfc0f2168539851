//! Vector and summary-row types

use serde::{Deserialize, Serialize};
use std::iter;

/// One fixed-length sample of `N` doubles. `N` is agreed by configuration.
pub type Vector = Vec<f64>;

/// Statistics for one batch of received vectors: the only artifact the
/// client persists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRow {
    /// Mean inter-arrival frequency over the batch, in Hz
    pub rate_mean: f64,

    /// Standard deviation of the inter-arrival frequency, in Hz
    pub rate_std: f64,

    /// Per-component mean across the batch
    pub vector_mean: Vec<f64>,

    /// Per-component standard deviation across the batch
    pub vector_std: Vec<f64>,
}

impl SummaryRow {
    /// Row values in output order: rate mean, rate std, every component mean,
    /// then every component std.
    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        iter::once(self.rate_mean)
            .chain(iter::once(self.rate_std))
            .chain(self.vector_mean.iter().copied())
            .chain(self.vector_std.iter().copied())
    }

    /// Number of values in the row.
    pub fn width(&self) -> usize {
        2 + self.vector_mean.len() + self.vector_std.len()
    }
}
