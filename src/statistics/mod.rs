//! Descriptive and inferential statistics for reaction-time samples.
//!
//! This module provides the statistical machinery behind the analysis
//! surface:
//!
//! 1. **Descriptives**: mean, median, variance, z-scores, IQR
//! 2. **Empirical CDFs** ([`ecdf`]): step ECDF evaluation on a shared grid
//! 3. **Inference** ([`inference`]): t-tests, effect sizes, permutation tests
//! 4. **Bayes factors** ([`bayes`]): JZS Bayes factors for t-tests
//! 5. **ANOVA** ([`anova`]): one-way and two-way factorial designs

pub mod anova;
pub mod bayes;
pub mod ecdf;
pub mod inference;

pub use anova::{anova_one_way, anova_two_way, AnovaRow, AnovaTable, EffectMagnitude};
pub use bayes::{bayes_factor_ttest, interpret_bayes_factor, Evidence};
pub use ecdf::Ecdf;
pub use inference::{
    cohen_d, holm_correction, paired_t_test, permutation_test, significance_symbol, t_test,
    welch_t_test, TestOutcome,
};

/// Arithmetic mean.
///
/// # Panics
///
/// Panics if `data` is empty.
pub fn mean(data: &[f64]) -> f64 {
    assert!(!data.is_empty(), "Cannot compute mean of empty slice");
    data.iter().sum::<f64>() / data.len() as f64
}

/// Median via sorting a copy.
///
/// Averages the two middle order statistics for even-length samples.
///
/// # Panics
///
/// Panics if `data` is empty.
pub fn median(data: &[f64]) -> f64 {
    assert!(!data.is_empty(), "Cannot compute median of empty slice");
    let mut sorted = data.to_vec();
    sorted.sort_unstable_by(|a, b| a.total_cmp(b));
    let n = sorted.len();
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    }
}

/// Sample variance (n − 1 denominator).
///
/// Returns 0.0 for samples of size 1.
///
/// # Panics
///
/// Panics if `data` is empty.
pub fn variance(data: &[f64]) -> f64 {
    assert!(!data.is_empty(), "Cannot compute variance of empty slice");
    let n = data.len();
    if n == 1 {
        return 0.0;
    }
    let m = mean(data);
    data.iter().map(|x| (x - m) * (x - m)).sum::<f64>() / (n - 1) as f64
}

/// Sample standard deviation (n − 1 denominator).
pub fn std_dev(data: &[f64]) -> f64 {
    variance(data).sqrt()
}

/// Z-scores of each value relative to the sample mean and standard deviation.
///
/// Returns all zeros when the sample has no spread, so callers filtering on
/// |z| never exclude constant samples.
pub fn z_scores(data: &[f64]) -> Vec<f64> {
    assert!(!data.is_empty(), "Cannot compute z-scores of empty slice");
    let m = mean(data);
    let sd = std_dev(data);
    if sd == 0.0 {
        return vec![0.0; data.len()];
    }
    data.iter().map(|x| (x - m) / sd).collect()
}

/// Quantile of a sample by linear interpolation between order statistics
/// (the R-7 estimator), for `p` in [0, 1].
///
/// # Panics
///
/// Panics if `data` is empty or `p` is outside [0, 1].
pub fn quantile(data: &[f64], p: f64) -> f64 {
    assert!(!data.is_empty(), "Cannot compute quantile of empty slice");
    assert!(
        (0.0..=1.0).contains(&p),
        "Quantile probability must be in [0, 1]"
    );
    let mut sorted = data.to_vec();
    sorted.sort_unstable_by(|a, b| a.total_cmp(b));
    let n = sorted.len();
    if n == 1 {
        return sorted[0];
    }
    let h = (n - 1) as f64 * p;
    let lo = h.floor() as usize;
    let hi = h.ceil() as usize;
    if lo == hi {
        sorted[lo]
    } else {
        sorted[lo] + (h - lo as f64) * (sorted[hi] - sorted[lo])
    }
}

/// Interquartile range (Q3 − Q1).
pub fn iqr(data: &[f64]) -> f64 {
    quantile(data, 0.75) - quantile(data, 0.25)
}
