//! One-way and two-way factorial ANOVA.
//!
//! Sums of squares use the factorial decomposition over weighted cell means.
//! For unbalanced designs this matches Type I ordering rather than a
//! regression-based Type II/III decomposition; the difference is negligible
//! for the near-balanced designs SRT experiments produce.
//!
//! Partial eta squared is reported per effect with the conventional
//! small/medium/large thresholds (0.01 / 0.06 / 0.14).

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, FisherSnedecor};

/// One row of an ANOVA table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnovaRow {
    /// Effect name (factor, interaction, or "Residual").
    pub source: String,
    /// Sum of squares.
    pub ss: f64,
    /// Degrees of freedom.
    pub df: f64,
    /// F statistic; absent for the residual row.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub f: Option<f64>,
    /// p-value; absent for the residual row.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub p: Option<f64>,
    /// Partial eta squared; absent for the residual row.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partial_eta_sq: Option<f64>,
}

/// A complete ANOVA table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnovaTable {
    /// Effect rows followed by the residual row.
    pub rows: Vec<AnovaRow>,
}

impl AnovaTable {
    /// Look up an effect row by source name.
    pub fn effect(&self, source: &str) -> Option<&AnovaRow> {
        self.rows.iter().find(|r| r.source == source)
    }
}

/// Magnitude category for partial eta squared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EffectMagnitude {
    /// Partial eta squared below 0.01.
    Minimal,
    /// At least 0.01.
    Small,
    /// At least 0.06.
    Medium,
    /// At least 0.14.
    Large,
}

impl EffectMagnitude {
    /// Classify a partial eta squared value.
    pub fn from_partial_eta_sq(np2: f64) -> EffectMagnitude {
        if np2 < 0.01 {
            EffectMagnitude::Minimal
        } else if np2 < 0.06 {
            EffectMagnitude::Small
        } else if np2 < 0.14 {
            EffectMagnitude::Medium
        } else {
            EffectMagnitude::Large
        }
    }
}

impl fmt::Display for EffectMagnitude {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            EffectMagnitude::Minimal => "minimal",
            EffectMagnitude::Small => "small",
            EffectMagnitude::Medium => "medium",
            EffectMagnitude::Large => "large",
        };
        write!(f, "{}", text)
    }
}

/// One-way ANOVA across `groups`.
///
/// Returns a table with one effect row named `factor` and a residual row.
///
/// # Panics
///
/// Panics if fewer than 2 groups are given or any group has fewer than 2
/// values.
pub fn anova_one_way(groups: &[Vec<f64>], factor: &str) -> AnovaTable {
    assert!(groups.len() >= 2, "one-way ANOVA needs at least 2 groups");
    assert!(
        groups.iter().all(|g| g.len() >= 2),
        "each group needs at least 2 values"
    );

    let n_total: usize = groups.iter().map(Vec::len).sum();
    let grand_mean =
        groups.iter().flatten().sum::<f64>() / n_total as f64;

    let mut ss_between = 0.0;
    let mut ss_within = 0.0;
    for group in groups {
        let n = group.len() as f64;
        let m = group.iter().sum::<f64>() / n;
        ss_between += n * (m - grand_mean) * (m - grand_mean);
        ss_within += group.iter().map(|x| (x - m) * (x - m)).sum::<f64>();
    }

    let df_between = (groups.len() - 1) as f64;
    let df_within = (n_total - groups.len()) as f64;

    let effect = effect_row(factor, ss_between, df_between, ss_within, df_within);
    AnovaTable {
        rows: vec![
            effect,
            AnovaRow {
                source: "Residual".to_string(),
                ss: ss_within,
                df: df_within,
                f: None,
                p: None,
                partial_eta_sq: None,
            },
        ],
    }
}

/// Two-way factorial ANOVA with interaction.
///
/// `observations` are `(level_a, level_b, value)` triples; levels are opaque
/// indices. Effect rows are named `factor_a`, `factor_b`, and
/// `"{factor_a} * {factor_b}"`.
///
/// # Panics
///
/// Panics if either factor has fewer than 2 observed levels.
pub fn anova_two_way(
    observations: &[(usize, usize, f64)],
    factor_a: &str,
    factor_b: &str,
) -> AnovaTable {
    let mut cells: BTreeMap<(usize, usize), Vec<f64>> = BTreeMap::new();
    let mut levels_a: BTreeMap<usize, Vec<f64>> = BTreeMap::new();
    let mut levels_b: BTreeMap<usize, Vec<f64>> = BTreeMap::new();
    for &(a, b, x) in observations {
        cells.entry((a, b)).or_default().push(x);
        levels_a.entry(a).or_default().push(x);
        levels_b.entry(b).or_default().push(x);
    }
    assert!(levels_a.len() >= 2, "factor '{}' needs at least 2 levels", factor_a);
    assert!(levels_b.len() >= 2, "factor '{}' needs at least 2 levels", factor_b);

    let n_total = observations.len() as f64;
    let grand_mean = observations.iter().map(|&(_, _, x)| x).sum::<f64>() / n_total;

    let weighted_ss = |groups: &BTreeMap<usize, Vec<f64>>| -> f64 {
        groups
            .values()
            .map(|g| {
                let n = g.len() as f64;
                let m = g.iter().sum::<f64>() / n;
                n * (m - grand_mean) * (m - grand_mean)
            })
            .sum()
    };

    let ss_a = weighted_ss(&levels_a);
    let ss_b = weighted_ss(&levels_b);

    let mut ss_cells = 0.0;
    let mut ss_within = 0.0;
    for group in cells.values() {
        let n = group.len() as f64;
        let m = group.iter().sum::<f64>() / n;
        ss_cells += n * (m - grand_mean) * (m - grand_mean);
        ss_within += group.iter().map(|x| (x - m) * (x - m)).sum::<f64>();
    }
    // Interaction SS can dip below zero by floating-point cancellation when
    // the interaction is null.
    let ss_interaction = (ss_cells - ss_a - ss_b).max(0.0);

    let df_a = (levels_a.len() - 1) as f64;
    let df_b = (levels_b.len() - 1) as f64;
    let df_interaction = ((cells.len() - 1) as f64 - df_a - df_b).max(0.0);
    let df_within = n_total - cells.len() as f64;

    let interaction_name = format!("{} * {}", factor_a, factor_b);
    AnovaTable {
        rows: vec![
            effect_row(factor_a, ss_a, df_a, ss_within, df_within),
            effect_row(factor_b, ss_b, df_b, ss_within, df_within),
            effect_row(&interaction_name, ss_interaction, df_interaction, ss_within, df_within),
            AnovaRow {
                source: "Residual".to_string(),
                ss: ss_within,
                df: df_within,
                f: None,
                p: None,
                partial_eta_sq: None,
            },
        ],
    }
}

/// Build an effect row with F, p, and partial eta squared against the
/// residual term. F and p are omitted when degrees of freedom run out or the
/// residual mean square is zero.
fn effect_row(source: &str, ss: f64, df: f64, ss_within: f64, df_within: f64) -> AnovaRow {
    let (f, p, np2) = if df > 0.0 && df_within > 0.0 && ss_within > 0.0 {
        let ms_effect = ss / df;
        let ms_within = ss_within / df_within;
        let f_stat = ms_effect / ms_within;
        let dist = FisherSnedecor::new(df, df_within)
            .unwrap_or_else(|_| panic!("invalid F degrees of freedom: {}, {}", df, df_within));
        let p = 1.0 - dist.cdf(f_stat);
        let np2 = ss / (ss + ss_within);
        (Some(f_stat), Some(p), Some(np2))
    } else {
        (None, None, None)
    };

    AnovaRow {
        source: source.to_string(),
        ss,
        df,
        f,
        p,
        partial_eta_sq: np2,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_way_detects_group_separation() {
        let groups = vec![
            vec![200.0, 205.0, 210.0, 195.0, 202.0],
            vec![250.0, 255.0, 260.0, 245.0, 252.0],
            vec![300.0, 305.0, 310.0, 295.0, 302.0],
        ];
        let table = anova_one_way(&groups, "modality");
        let effect = table.effect("modality").unwrap();
        assert!(effect.f.unwrap() > 100.0);
        assert!(effect.p.unwrap() < 0.001);
        assert!(effect.partial_eta_sq.unwrap() > 0.9);
        assert_eq!(effect.df, 2.0);
        assert_eq!(table.effect("Residual").unwrap().df, 12.0);
    }

    #[test]
    fn one_way_null_case() {
        let groups = vec![
            vec![200.0, 210.0, 190.0, 205.0, 195.0],
            vec![201.0, 209.0, 191.0, 204.0, 196.0],
        ];
        let table = anova_one_way(&groups, "modality");
        let effect = table.effect("modality").unwrap();
        assert!(effect.p.unwrap() > 0.5);
        assert_eq!(
            EffectMagnitude::from_partial_eta_sq(effect.partial_eta_sq.unwrap()),
            EffectMagnitude::Minimal
        );
    }

    #[test]
    fn two_way_main_effects() {
        // Factor A shifts by 50, factor B by 10, no interaction.
        let mut obs = Vec::new();
        for a in 0..2usize {
            for b in 0..2usize {
                let base = 200.0 + a as f64 * 50.0 + b as f64 * 10.0;
                for i in 0..6 {
                    obs.push((a, b, base + (i as f64 - 2.5)));
                }
            }
        }
        let table = anova_two_way(&obs, "modality", "dataset");
        assert!(table.effect("modality").unwrap().p.unwrap() < 0.001);
        assert!(table.effect("dataset").unwrap().p.unwrap() < 0.001);
        assert!(table.effect("modality * dataset").unwrap().p.unwrap() > 0.5);
        assert_eq!(table.effect("Residual").unwrap().df, 20.0);
    }

    #[test]
    fn two_way_sums_of_squares_partition() {
        let mut obs = Vec::new();
        for a in 0..3usize {
            for b in 0..2usize {
                for i in 0..4 {
                    obs.push((a, b, 100.0 + (a * 7 + b * 3 + i) as f64));
                }
            }
        }
        let table = anova_two_way(&obs, "A", "B");
        let total_from_rows: f64 = table.rows.iter().map(|r| r.ss).sum();

        let grand = obs.iter().map(|&(_, _, x)| x).sum::<f64>() / obs.len() as f64;
        let ss_total: f64 = obs.iter().map(|&(_, _, x)| (x - grand) * (x - grand)).sum();
        assert!(
            (total_from_rows - ss_total).abs() < 1e-8,
            "SS must partition: {} vs {}",
            total_from_rows,
            ss_total
        );
    }

    #[test]
    fn magnitude_thresholds() {
        assert_eq!(EffectMagnitude::from_partial_eta_sq(0.005), EffectMagnitude::Minimal);
        assert_eq!(EffectMagnitude::from_partial_eta_sq(0.03), EffectMagnitude::Small);
        assert_eq!(EffectMagnitude::from_partial_eta_sq(0.1), EffectMagnitude::Medium);
        assert_eq!(EffectMagnitude::from_partial_eta_sq(0.2), EffectMagnitude::Large);
    }

    #[test]
    #[should_panic(expected = "at least 2 groups")]
    fn one_way_rejects_single_group() {
        anova_one_way(&[vec![1.0, 2.0]], "modality");
    }
}
