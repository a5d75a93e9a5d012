//! Frequentist tests for reaction-time comparisons.
//!
//! Implements the pairwise comparison machinery: Student and Welch two-sample
//! t-tests, the paired t-test used for group-level race-model testing, pooled
//! Cohen's d, a seeded permutation test on the mean difference, and
//! multiple-comparison corrections.

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, StudentsT};

use crate::config::Correction;
use crate::statistics::{mean, std_dev, variance};

/// Which tail of the null distribution the p-value covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tail {
    /// Two-sided alternative.
    TwoSided,
    /// Alternative: the first sample's mean is greater.
    Greater,
    /// Alternative: the first sample's mean is smaller.
    Less,
}

/// Outcome of a single hypothesis test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestOutcome {
    /// Test statistic (t, or the observed mean difference for permutation
    /// tests).
    pub statistic: f64,
    /// Degrees of freedom, when the test has them.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub df: Option<f64>,
    /// p-value under the null hypothesis.
    pub p_value: f64,
    /// Standardized effect size (Cohen's d), when defined.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effect_size: Option<f64>,
}

/// p-value for a t statistic with `df` degrees of freedom.
fn t_p_value(t: f64, df: f64, tail: Tail) -> f64 {
    if !t.is_finite() {
        // Infinite t arises from zero-spread samples with different means.
        return match tail {
            Tail::TwoSided => 0.0,
            Tail::Greater => {
                if t > 0.0 {
                    0.0
                } else {
                    1.0
                }
            }
            Tail::Less => {
                if t < 0.0 {
                    0.0
                } else {
                    1.0
                }
            }
        };
    }
    let dist = StudentsT::new(0.0, 1.0, df)
        .unwrap_or_else(|_| panic!("invalid degrees of freedom: {}", df));
    match tail {
        Tail::TwoSided => 2.0 * (1.0 - dist.cdf(t.abs())),
        Tail::Greater => 1.0 - dist.cdf(t),
        Tail::Less => dist.cdf(t),
    }
}

/// Student's two-sample t-test (pooled variance, two-sided).
///
/// Returns the t statistic, degrees of freedom `n_a + n_b - 2`, the
/// two-sided p-value, and pooled Cohen's d as the effect size.
///
/// # Panics
///
/// Panics if either sample has fewer than 2 values.
pub fn t_test(a: &[f64], b: &[f64]) -> TestOutcome {
    assert!(a.len() >= 2 && b.len() >= 2, "t-test needs >= 2 values per sample");

    let (na, nb) = (a.len() as f64, b.len() as f64);
    let df = na + nb - 2.0;
    let pooled_var = ((na - 1.0) * variance(a) + (nb - 1.0) * variance(b)) / df;
    let se = (pooled_var * (1.0 / na + 1.0 / nb)).sqrt();
    let diff = mean(a) - mean(b);

    let t = if se == 0.0 {
        if diff == 0.0 {
            0.0
        } else {
            diff.signum() * f64::INFINITY
        }
    } else {
        diff / se
    };

    TestOutcome {
        statistic: t,
        df: Some(df),
        p_value: t_p_value(t, df, Tail::TwoSided),
        effect_size: Some(cohen_d(a, b)),
    }
}

/// Welch's two-sample t-test (unequal variances, two-sided).
///
/// Degrees of freedom use the Welch–Satterthwaite approximation.
///
/// # Panics
///
/// Panics if either sample has fewer than 2 values.
pub fn welch_t_test(a: &[f64], b: &[f64]) -> TestOutcome {
    assert!(a.len() >= 2 && b.len() >= 2, "t-test needs >= 2 values per sample");

    let (na, nb) = (a.len() as f64, b.len() as f64);
    let (va, vb) = (variance(a) / na, variance(b) / nb);
    let se = (va + vb).sqrt();
    let diff = mean(a) - mean(b);

    let (t, df) = if se == 0.0 {
        let t = if diff == 0.0 {
            0.0
        } else {
            diff.signum() * f64::INFINITY
        };
        (t, na + nb - 2.0)
    } else {
        let df = (va + vb) * (va + vb)
            / (va * va / (na - 1.0) + vb * vb / (nb - 1.0));
        (diff / se, df)
    };

    TestOutcome {
        statistic: t,
        df: Some(df),
        p_value: t_p_value(t, df, Tail::TwoSided),
        effect_size: Some(cohen_d(a, b)),
    }
}

/// Paired t-test on the elementwise differences `x[i] - y[i]`.
///
/// # Panics
///
/// Panics if the samples differ in length or have fewer than 2 pairs.
pub fn paired_t_test(x: &[f64], y: &[f64], tail: Tail) -> TestOutcome {
    assert_eq!(x.len(), y.len(), "paired t-test needs equal-length samples");
    assert!(x.len() >= 2, "paired t-test needs >= 2 pairs");

    let diffs: Vec<f64> = x.iter().zip(y).map(|(a, b)| a - b).collect();
    let n = diffs.len() as f64;
    let df = n - 1.0;
    let d_mean = mean(&diffs);
    let se = std_dev(&diffs) / n.sqrt();

    let t = if se == 0.0 {
        if d_mean == 0.0 {
            0.0
        } else {
            d_mean.signum() * f64::INFINITY
        }
    } else {
        d_mean / se
    };

    let sd = std_dev(&diffs);
    let effect = if sd == 0.0 { None } else { Some(d_mean / sd) };

    TestOutcome {
        statistic: t,
        df: Some(df),
        p_value: t_p_value(t, df, tail),
        effect_size: effect,
    }
}

/// Pooled Cohen's d for two independent samples.
///
/// Returns 0.0 when both samples have no spread.
pub fn cohen_d(a: &[f64], b: &[f64]) -> f64 {
    let (na, nb) = (a.len() as f64, b.len() as f64);
    let pooled_var = ((na - 1.0) * variance(a) + (nb - 1.0) * variance(b)) / (na + nb - 2.0);
    let pooled_sd = pooled_var.sqrt();
    if pooled_sd == 0.0 {
        return 0.0;
    }
    (mean(a) - mean(b)) / pooled_sd
}

/// Permutation test on the difference of means (two-sided).
///
/// Pools the two samples, reshuffles group labels `permutations` times with a
/// seeded xoshiro generator, and reports the add-one-smoothed proportion of
/// permuted |mean differences| at least as large as the observed one.
///
/// # Panics
///
/// Panics if either sample is empty or `permutations` is zero.
pub fn permutation_test(
    a: &[f64],
    b: &[f64],
    permutations: usize,
    seed: Option<u64>,
) -> TestOutcome {
    assert!(!a.is_empty() && !b.is_empty(), "permutation test needs non-empty samples");
    assert!(permutations > 0, "permutations must be positive");

    let observed = mean(a) - mean(b);

    let mut pooled: Vec<f64> = a.iter().chain(b.iter()).copied().collect();
    let mut rng = match seed {
        Some(s) => Xoshiro256PlusPlus::seed_from_u64(s),
        None => Xoshiro256PlusPlus::from_entropy(),
    };

    let n_a = a.len();
    let mut at_least_as_extreme = 0usize;
    for _ in 0..permutations {
        pooled.shuffle(&mut rng);
        let (pa, pb) = pooled.split_at(n_a);
        let diff = mean(pa) - mean(pb);
        if diff.abs() >= observed.abs() {
            at_least_as_extreme += 1;
        }
    }

    TestOutcome {
        statistic: observed,
        df: None,
        p_value: (at_least_as_extreme + 1) as f64 / (permutations + 1) as f64,
        effect_size: Some(cohen_d(a, b)),
    }
}

/// Apply a multiple-comparison correction to a family of p-values.
///
/// Corrected values are capped at 1.0.
pub fn correct_p_values(p_values: &[f64], correction: Correction) -> Vec<f64> {
    match correction {
        Correction::None => p_values.to_vec(),
        Correction::Bonferroni => {
            let m = p_values.len() as f64;
            p_values.iter().map(|p| (p * m).min(1.0)).collect()
        }
        Correction::Holm => holm_correction(p_values),
    }
}

/// Holm step-down correction.
///
/// Sorts p-values ascending, multiplies the i-th smallest by `m - i`, and
/// enforces monotonicity over the sorted order before mapping back.
pub fn holm_correction(p_values: &[f64]) -> Vec<f64> {
    let m = p_values.len();
    let mut order: Vec<usize> = (0..m).collect();
    order.sort_by(|&i, &j| p_values[i].total_cmp(&p_values[j]));

    let mut corrected = vec![0.0; m];
    let mut running_max: f64 = 0.0;
    for (rank, &idx) in order.iter().enumerate() {
        let adjusted = (p_values[idx] * (m - rank) as f64).min(1.0);
        running_max = running_max.max(adjusted);
        corrected[idx] = running_max;
    }
    corrected
}

/// Conventional significance stars for a p-value.
pub fn significance_symbol(p: f64) -> &'static str {
    if p < 0.001 {
        "***"
    } else if p < 0.01 {
        "**"
    } else if p < 0.05 {
        "*"
    } else {
        ""
    }
}
