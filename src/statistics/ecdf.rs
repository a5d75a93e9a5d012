//! Step empirical cumulative distribution functions.
//!
//! The empirical CDF at time `t` is the fraction of samples less than or
//! equal to `t` (ties at `t` included):
//!
//! ```text
//! F_n(t) = #{ x_i <= t } / n
//! ```
//!
//! This is the right-continuous step estimator. Outside the sample range the
//! CDF extrapolates flat to 0 (below the minimum) and 1 (at or above the
//! maximum), so evaluating at arbitrary grid points never errors.

/// Empirical CDF over an owned, sorted copy of a sample.
#[derive(Debug, Clone)]
pub struct Ecdf {
    sorted: Vec<f64>,
}

impl Ecdf {
    /// Build an ECDF from a sample.
    ///
    /// # Panics
    ///
    /// Panics if `sample` is empty. Callers guard sample sizes before
    /// constructing curves (see `RaceModelEvaluator`).
    pub fn new(sample: &[f64]) -> Ecdf {
        assert!(!sample.is_empty(), "Cannot build ECDF from empty sample");
        let mut sorted = sample.to_vec();
        sorted.sort_unstable_by(|a, b| a.total_cmp(b));
        Ecdf { sorted }
    }

    /// Number of samples backing the curve.
    pub fn len(&self) -> usize {
        self.sorted.len()
    }

    /// Always false; empty samples are rejected at construction.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Smallest sample value.
    pub fn min(&self) -> f64 {
        self.sorted[0]
    }

    /// Largest sample value.
    pub fn max(&self) -> f64 {
        self.sorted[self.sorted.len() - 1]
    }

    /// Evaluate the ECDF at a single point.
    ///
    /// Counts samples `<= t` by binary search, so evaluation is O(log n).
    pub fn value(&self, t: f64) -> f64 {
        let count = self.sorted.partition_point(|&x| x <= t);
        count as f64 / self.sorted.len() as f64
    }

    /// Evaluate the ECDF at every point of a grid.
    ///
    /// The result is non-decreasing whenever `grid` is non-decreasing and is
    /// always bounded in [0, 1].
    pub fn evaluate(&self, grid: &[f64]) -> Vec<f64> {
        grid.iter().map(|&t| self.value(t)).collect()
    }
}
