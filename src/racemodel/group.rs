//! Group-level race-model testing across participants.
//!
//! Every participant's CDFs are evaluated on one shared grid spanning the
//! pooled reaction-time range, so curves are pointwise comparable. The
//! group-level significance test is a paired one-sided t-test of
//! `F_AV(t) - bound(t)` across participants at each grid point, with the
//! configured multiple-comparison correction (Bonferroni by default) applied
//! across grid points.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::AnalysisError;
use crate::statistics::inference::{correct_p_values, paired_t_test, Tail};
use crate::types::PercentileRange;

use super::{CdfCurve, ParticipantSamples, QuantileGrid, RaceModelEvaluator, ViolationResult};

/// Pointwise paired test at one grid point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridPointTest {
    /// Paired t statistic of `F_AV - bound` across participants.
    pub t: f64,
    /// Raw one-sided p-value.
    pub p: f64,
    /// p-value after correction across grid points.
    pub p_corrected: f64,
    /// Whether the corrected p-value clears the configured alpha.
    pub significant: bool,
}

/// Group-level violation result across participants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupViolationResult {
    /// Shared quantile grid.
    pub grid: QuantileGrid,
    /// Audio CDF averaged across participants.
    pub mean_cdf_audio: CdfCurve,
    /// Visual CDF averaged across participants.
    pub mean_cdf_visual: CdfCurve,
    /// Audiovisual CDF averaged across participants.
    pub mean_cdf_audiovisual: CdfCurve,
    /// Bound curve averaged across participants.
    pub mean_bound: CdfCurve,
    /// Mean signed difference `bound - F_AV` at each grid point.
    pub mean_violation: Vec<f64>,
    /// Pointwise paired tests; empty when fewer than 2 participants are
    /// valid.
    pub tests: Vec<GridPointTest>,
    /// Grid range over which the corrected test is significant, if any.
    pub significant_range: Option<(f64, f64)>,
    /// Participants included in the group statistics.
    pub participants: Vec<u32>,
    /// Participants skipped for missing or insufficient data.
    pub n_skipped: usize,
    /// Per-participant cumulative positive exceedance over the configured
    /// percentile window, for filtering and cross-dataset comparison.
    pub participant_scores: Vec<(u32, f64)>,
}

/// Evaluate a group of participants against the configured race model.
///
/// Participants with fewer than `config.min_trials` trials in any condition
/// are skipped and counted in `n_skipped`.
///
/// # Errors
///
/// - `NoValidParticipants` when every participant is skipped.
/// - `DegenerateRange` when the pooled range of the valid participants
///   collapses to a single value.
pub fn evaluate_group(
    participants: &[ParticipantSamples],
    config: &Config,
) -> Result<GroupViolationResult, AnalysisError> {
    let evaluator = RaceModelEvaluator::new(config.clone());

    let (valid, skipped): (Vec<&ParticipantSamples>, Vec<&ParticipantSamples>) =
        participants.iter().partition(|p| {
            p.audio.len() >= config.min_trials
                && p.visual.len() >= config.min_trials
                && p.audiovisual.len() >= config.min_trials
        });

    if valid.is_empty() {
        return Err(AnalysisError::NoValidParticipants);
    }

    let (mut min, mut max) = (f64::INFINITY, f64::NEG_INFINITY);
    for p in &valid {
        for &x in p.audio.iter().chain(&p.visual).chain(&p.audiovisual) {
            min = min.min(x);
            max = max.max(x);
        }
    }
    let grid = QuantileGrid::new(min, max, config.grid_resolution)?;

    let results: Vec<ViolationResult> = valid
        .par_iter()
        .map(|p| evaluator.evaluate_on_grid(&p.audio, &p.visual, &p.audiovisual, grid.clone()))
        .collect::<Result<_, _>>()?;

    let n = results.len();
    let len = grid.len();

    let mean_curve = |select: fn(&ViolationResult) -> &CdfCurve| -> CdfCurve {
        let mut acc = vec![0.0; len];
        for r in &results {
            for (a, &v) in acc.iter_mut().zip(&select(r).values) {
                *a += v;
            }
        }
        for a in &mut acc {
            *a /= n as f64;
        }
        CdfCurve { values: acc }
    };

    let mean_cdf_audio = mean_curve(|r| &r.cdf_audio);
    let mean_cdf_visual = mean_curve(|r| &r.cdf_visual);
    let mean_cdf_audiovisual = mean_curve(|r| &r.cdf_audiovisual);
    let mean_bound = mean_curve(|r| &r.bound);

    let mean_violation: Vec<f64> = mean_bound
        .values
        .iter()
        .zip(&mean_cdf_audiovisual.values)
        .map(|(&b, &av)| b - av)
        .collect();

    let tests = if n >= 2 {
        let mut raw = Vec::with_capacity(len);
        let mut stats = Vec::with_capacity(len);
        for i in 0..len {
            let av: Vec<f64> = results.iter().map(|r| r.cdf_audiovisual.values[i]).collect();
            let bound: Vec<f64> = results.iter().map(|r| r.bound.values[i]).collect();
            let outcome = paired_t_test(&av, &bound, Tail::Greater);
            raw.push(outcome.p_value);
            stats.push(outcome.statistic);
        }
        let corrected = correct_p_values(&raw, config.correction);
        stats
            .into_iter()
            .zip(raw)
            .zip(corrected)
            .map(|((t, p), p_corrected)| GridPointTest {
                t,
                p,
                p_corrected,
                significant: p_corrected < config.alpha,
            })
            .collect()
    } else {
        Vec::new()
    };

    let significant_range = {
        let first = tests.iter().position(|t| t.significant);
        let last = tests.iter().rposition(|t| t.significant);
        match (first, last) {
            (Some(f), Some(l)) => Some((grid.points()[f], grid.points()[l])),
            _ => None,
        }
    };

    let participant_scores = valid
        .iter()
        .zip(&results)
        .map(|(p, r)| (p.participant, r.cumulative_violation(config.percentile_range)))
        .collect();

    Ok(GroupViolationResult {
        grid,
        mean_cdf_audio,
        mean_cdf_visual,
        mean_cdf_audiovisual,
        mean_bound,
        mean_violation,
        tests,
        significant_range,
        participants: valid.iter().map(|p| p.participant).collect(),
        n_skipped: skipped.len(),
        participant_scores,
    })
}

impl GroupViolationResult {
    /// Whether the group shows a significant violation anywhere on the grid.
    pub fn violated(&self) -> bool {
        self.significant_range.is_some()
    }

    /// Mean positive exceedance over a percentile window of the grid,
    /// computed from the averaged curves.
    pub fn mean_violation_in(&self, range: PercentileRange) -> f64 {
        let idx = range.index_range(self.mean_violation.len());
        if idx.is_empty() {
            return 0.0;
        }
        let n = idx.len() as f64;
        self.mean_violation[idx].iter().map(|&v| (-v).max(0.0)).sum::<f64>() / n
    }
}
