//! Streaming statistics
//!
//! [`RunningStat`] keeps the sufficient statistics for mean and variance in
//! O(1) memory, updated one value at a time with the single-pass algorithm
//! (count, mean, sum of squared deviations). Its results agree with the
//! two-pass [`mean_std`] to floating-point tolerance.

/// Online mean / population variance accumulator.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunningStat {
    count: u64,
    mean: f64,
    sum_sq_dev: f64,
}

impl RunningStat {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one value into the running aggregates.
    pub fn push(&mut self, value: f64) {
        self.count += 1;
        let mean_diff = (value - self.mean) / self.count as f64;
        let new_mean = self.mean + mean_diff;
        self.sum_sq_dev += (value - new_mean) * (value - self.mean);
        self.mean = new_mean;
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    /// Mean of the values seen so far, 0 when empty.
    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Population variance, 0 when empty.
    pub fn variance(&self) -> f64 {
        if self.count > 0 {
            self.sum_sq_dev / self.count as f64
        } else {
            0.0
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    /// `(mean, standard deviation)`
    pub fn stats(&self) -> (f64, f64) {
        (self.mean, self.std_dev())
    }

    /// Return to the empty state.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

impl Extend<f64> for RunningStat {
    fn extend<I: IntoIterator<Item = f64>>(&mut self, iter: I) {
        for value in iter {
            self.push(value);
        }
    }
}

impl FromIterator<f64> for RunningStat {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        let mut stat = Self::new();
        stat.extend(iter);
        stat
    }
}

/// Two-pass `(mean, population standard deviation)` over a slice.
///
/// Returns `(0.0, 0.0)` for an empty slice, matching [`RunningStat`].
pub fn mean_std(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
    (mean, variance.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: f64, b: f64) {
        let tol = 1e-9 * a.abs().max(b.abs()).max(1.0);
        assert!((a - b).abs() <= tol, "{a} != {b}");
    }

    fn check_same_result(values: &[f64]) {
        let rolling: RunningStat = values.iter().copied().collect();
        let (mean, std) = mean_std(values);
        assert_eq!(rolling.count(), values.len() as u64);
        assert_close(rolling.mean(), mean);
        assert_close(rolling.std_dev(), std);
    }

    #[test]
    fn test_matches_two_pass_simple() {
        check_same_result(&[1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_matches_two_pass_harder() {
        check_same_result(&[
            1.1,
            2.2,
            3.3,
            4.4,
            std::f64::consts::PI,
            std::f64::consts::E,
            42.0,
        ]);
    }

    #[test]
    fn test_matches_two_pass_large_offset() {
        let values: Vec<f64> = (0..1000).map(|i| 1e6 + (i % 7) as f64 * 0.25).collect();
        check_same_result(&values);
    }

    #[test]
    fn test_constant_values_have_zero_std() {
        let stat: RunningStat = [1.0; 4].into_iter().collect();
        assert_eq!(stat.stats(), (1.0, 0.0));
    }

    #[test]
    fn test_empty_reports_zero() {
        let stat = RunningStat::new();
        assert_eq!(stat.count(), 0);
        assert_eq!(stat.stats(), (0.0, 0.0));
        assert_eq!(mean_std(&[]), (0.0, 0.0));
    }

    #[test]
    fn test_reset_forgets_everything() {
        let mut stat: RunningStat = [5.0, 9.0].into_iter().collect();
        stat.reset();
        assert_eq!(stat, RunningStat::default());
        stat.push(3.0);
        assert_eq!(stat.stats(), (3.0, 0.0));
    }
}
