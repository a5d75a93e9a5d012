//! Race-model violation analysis.
//!
//! A race model predicts the multisensory (audiovisual) reaction-time
//! distribution from the two unisensory distributions under the assumption
//! that the faster of two independent processes drives the response. The
//! observed audiovisual CDF exceeding the model bound indicates coactivation
//! beyond what an independent race permits.
//!
//! The default bound is Miller's inequality:
//!
//! ```text
//! F_AV(t) <= min(1, F_A(t) + F_V(t))
//! ```
//!
//! All three empirical CDFs are evaluated on a shared, evenly spaced grid
//! spanning the pooled reaction-time range, and the violation curve is the
//! signed difference `bound(t) - F_AV(t)`: negative values are violations.
//!
//! # References
//!
//! Miller, J. (1982). "Divided attention: Evidence for coactivation with
//! redundant signals." Cognitive Psychology 14(2):247–279.
//!
//! Ulrich, R., Miller, J. & Schröter, H. (2007). "Testing the race model
//! inequality: An algorithm and computer programs." Behavior Research
//! Methods 39(2):291–302.

mod group;

pub use group::{evaluate_group, GridPointTest, GroupViolationResult};

use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};

use crate::config::Config;
use crate::error::AnalysisError;
use crate::statistics::ecdf::Ecdf;
use crate::types::{Modality, PercentileRange};

/// Evenly spaced time points shared by all three condition CDFs.
///
/// Even spacing over the pooled min..max range is the documented grid
/// construction; it weights all parts of the reaction-time range equally
/// rather than concentrating points where data are dense.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuantileGrid {
    points: Vec<f64>,
}

impl QuantileGrid {
    /// Build a grid of `resolution` evenly spaced points over `[min, max]`.
    pub fn new(min: f64, max: f64, resolution: usize) -> Result<QuantileGrid, AnalysisError> {
        if resolution < 2 {
            return Err(AnalysisError::InvalidGrid { resolution });
        }
        if !(min < max) {
            return Err(AnalysisError::DegenerateRange { value: min });
        }
        let step = (max - min) / (resolution - 1) as f64;
        let points = (0..resolution)
            .map(|i| {
                if i == resolution - 1 {
                    max // avoid drifting past max by accumulated rounding
                } else {
                    min + i as f64 * step
                }
            })
            .collect();
        Ok(QuantileGrid { points })
    }

    /// The grid points, strictly increasing.
    pub fn points(&self) -> &[f64] {
        &self.points
    }

    /// Number of grid points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always false; construction requires at least 2 points.
    pub fn is_empty(&self) -> bool {
        false
    }
}

/// A CDF evaluated on a quantile grid: probabilities in [0, 1],
/// non-decreasing in grid order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CdfCurve {
    /// Probability at each grid point.
    pub values: Vec<f64>,
}

impl CdfCurve {
    /// Evaluate a sample's step ECDF on the grid.
    pub fn from_sample(sample: &[f64], grid: &QuantileGrid) -> CdfCurve {
        let ecdf = Ecdf::new(sample);
        CdfCurve {
            values: ecdf.evaluate(grid.points()),
        }
    }
}

/// Race-model bound family.
///
/// `Miller` is the conventional test bound; the other variants reproduce the
/// alternative model predictions from the multisensory-integration
/// literature. All bounds are clamped to [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum RaceModel {
    /// Miller inequality: `min(1, F_A + F_V)`.
    Miller,
    /// Independent race: `1 - (1 - F_A)(1 - F_V)`.
    IndependentRace,
    /// Gaussian coactivation: `Phi((t - mean) / sd)`.
    Coactivation {
        /// Mean of the coactivation distribution, in milliseconds.
        mean: f64,
        /// Standard deviation, in milliseconds.
        sd: f64,
    },
    /// Independent race plus a cross-modal interaction term
    /// `gamma * min(F_A, F_V)`.
    ParallelInteractive {
        /// Interaction strength in [0, 1].
        gamma: f64,
    },
    /// Weighted multisensory response enhancement:
    /// `alpha * F_A + beta * F_V + lambda * F_A * F_V`.
    ResponseEnhancement {
        /// Audio weight.
        alpha: f64,
        /// Visual weight.
        beta: f64,
        /// Interaction weight.
        lambda: f64,
    },
}

impl RaceModel {
    /// Compute the bound curve from the two unisensory CDF curves.
    ///
    /// # Panics
    ///
    /// Panics if the curves and grid disagree in length, or if a
    /// `Coactivation` bound is configured with a non-positive `sd`.
    pub fn bound(&self, cdf_a: &CdfCurve, cdf_v: &CdfCurve, grid: &QuantileGrid) -> CdfCurve {
        assert_eq!(cdf_a.values.len(), grid.len());
        assert_eq!(cdf_v.values.len(), grid.len());

        let values = match *self {
            RaceModel::Miller => cdf_a
                .values
                .iter()
                .zip(&cdf_v.values)
                .map(|(&a, &v)| (a + v).min(1.0))
                .collect(),
            RaceModel::IndependentRace => cdf_a
                .values
                .iter()
                .zip(&cdf_v.values)
                .map(|(&a, &v)| 1.0 - (1.0 - a) * (1.0 - v))
                .collect(),
            RaceModel::Coactivation { mean, sd } => {
                assert!(sd > 0.0, "coactivation sd must be positive");
                let normal = Normal::new(mean, sd)
                    .unwrap_or_else(|_| panic!("invalid coactivation parameters"));
                grid.points().iter().map(|&t| normal.cdf(t)).collect()
            }
            RaceModel::ParallelInteractive { gamma } => cdf_a
                .values
                .iter()
                .zip(&cdf_v.values)
                .map(|(&a, &v)| {
                    let race = 1.0 - (1.0 - a) * (1.0 - v);
                    (race + gamma * a.min(v)).clamp(0.0, 1.0)
                })
                .collect(),
            RaceModel::ResponseEnhancement {
                alpha,
                beta,
                lambda,
            } => cdf_a
                .values
                .iter()
                .zip(&cdf_v.values)
                .map(|(&a, &v)| (alpha * a + beta * v + lambda * a * v).clamp(0.0, 1.0))
                .collect(),
        };
        CdfCurve { values }
    }
}

/// The three condition samples of one participant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipantSamples {
    /// Participant identifier.
    pub participant: u32,
    /// Audio-only reaction times (ms).
    pub audio: Vec<f64>,
    /// Visual-only reaction times (ms).
    pub visual: Vec<f64>,
    /// Audiovisual reaction times (ms).
    pub audiovisual: Vec<f64>,
}

/// Result of evaluating one participant (or one pooled dataset) against a
/// race-model bound.
///
/// Immutable value object handed back to reporting/plotting layers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViolationResult {
    /// Shared quantile grid.
    pub grid: QuantileGrid,
    /// Empirical audio CDF on the grid.
    pub cdf_audio: CdfCurve,
    /// Empirical visual CDF on the grid.
    pub cdf_visual: CdfCurve,
    /// Empirical audiovisual CDF on the grid.
    pub cdf_audiovisual: CdfCurve,
    /// Race-model bound curve.
    pub bound: CdfCurve,
    /// Signed difference `bound(t) - F_AV(t)` at each grid point.
    /// Negative values are race-model violations.
    pub violation: Vec<f64>,
    /// Trial counts used: [audio, visual, audiovisual].
    pub n_trials: [usize; 3],
}

impl ViolationResult {
    /// Whether any grid point violates the bound.
    pub fn violated(&self) -> bool {
        self.violation.iter().any(|&v| v < 0.0)
    }

    /// The strongest violation: grid time and magnitude of the most negative
    /// difference. `None` when the bound is never exceeded.
    pub fn max_violation(&self) -> Option<(f64, f64)> {
        self.violation
            .iter()
            .enumerate()
            .filter(|(_, &v)| v < 0.0)
            .min_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(i, &v)| (self.grid.points()[i], -v))
    }

    /// Grid range `[first, last]` over which violation occurs, or `None`.
    pub fn violation_range(&self) -> Option<(f64, f64)> {
        let first = self.violation.iter().position(|&v| v < 0.0)?;
        let last = self.violation.iter().rposition(|&v| v < 0.0)?;
        Some((self.grid.points()[first], self.grid.points()[last]))
    }

    /// Mean positive exceedance `max(0, F_AV - bound)` over a percentile
    /// window of the grid. This is the magnitude summary used for filtering
    /// and cross-dataset comparison.
    pub fn mean_violation(&self, range: PercentileRange) -> f64 {
        let idx = range.index_range(self.violation.len());
        if idx.is_empty() {
            return 0.0;
        }
        let n = idx.len() as f64;
        self.violation[idx].iter().map(|&v| (-v).max(0.0)).sum::<f64>() / n
    }

    /// Summed positive exceedance over a percentile window of the grid.
    pub fn cumulative_violation(&self, range: PercentileRange) -> f64 {
        let idx = range.index_range(self.violation.len());
        self.violation[idx].iter().map(|&v| (-v).max(0.0)).sum()
    }
}

/// Evaluates condition samples against a race-model bound.
///
/// Pure and synchronous: each evaluation is a function of its three input
/// samples and the configuration, with no shared state.
#[derive(Debug, Clone)]
pub struct RaceModelEvaluator {
    config: Config,
}

impl RaceModelEvaluator {
    /// Create an evaluator.
    ///
    /// # Panics
    ///
    /// Panics if the configuration fails validation.
    pub fn new(config: Config) -> RaceModelEvaluator {
        if let Err(msg) = config.validate() {
            panic!("invalid configuration: {}", msg);
        }
        RaceModelEvaluator { config }
    }

    /// The configuration in use.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Evaluate one participant's three condition samples.
    ///
    /// # Errors
    ///
    /// - `InsufficientData` when any sample has fewer than
    ///   `config.min_trials` values (checked in audio, visual, audiovisual
    ///   order, so three empty samples report the audio condition).
    /// - `DegenerateRange` when every value across all three samples is one
    ///   identical number.
    /// - `InvalidGrid` is unreachable here because the configuration is
    ///   validated at construction.
    pub fn evaluate(
        &self,
        audio: &[f64],
        visual: &[f64],
        audiovisual: &[f64],
    ) -> Result<ViolationResult, AnalysisError> {
        for (modality, sample) in [
            (Modality::Audio, audio),
            (Modality::Visual, visual),
            (Modality::Audiovisual, audiovisual),
        ] {
            if sample.len() < self.config.min_trials {
                return Err(AnalysisError::InsufficientData {
                    modality,
                    got: sample.len(),
                    min: self.config.min_trials,
                });
            }
        }

        let all = audio.iter().chain(visual).chain(audiovisual);
        let (mut min, mut max) = (f64::INFINITY, f64::NEG_INFINITY);
        for &x in all {
            min = min.min(x);
            max = max.max(x);
        }

        let grid = QuantileGrid::new(min, max, self.config.grid_resolution)?;
        self.evaluate_on_grid(audio, visual, audiovisual, grid)
    }

    /// Evaluate on a caller-provided grid. Used by group evaluation, where
    /// every participant shares one grid spanning the pooled range.
    pub(crate) fn evaluate_on_grid(
        &self,
        audio: &[f64],
        visual: &[f64],
        audiovisual: &[f64],
        grid: QuantileGrid,
    ) -> Result<ViolationResult, AnalysisError> {
        let cdf_audio = CdfCurve::from_sample(audio, &grid);
        let cdf_visual = CdfCurve::from_sample(visual, &grid);
        let cdf_audiovisual = CdfCurve::from_sample(audiovisual, &grid);

        let bound = self.config.model.bound(&cdf_audio, &cdf_visual, &grid);

        let violation = bound
            .values
            .iter()
            .zip(&cdf_audiovisual.values)
            .map(|(&b, &av)| b - av)
            .collect();

        Ok(ViolationResult {
            grid,
            cdf_audio,
            cdf_visual,
            cdf_audiovisual,
            bound,
            violation,
            n_trials: [audio.len(), visual.len(), audiovisual.len()],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_is_evenly_spaced_and_hits_endpoints() {
        let grid = QuantileGrid::new(100.0, 200.0, 101).unwrap();
        assert_eq!(grid.len(), 101);
        assert_eq!(grid.points()[0], 100.0);
        assert_eq!(grid.points()[100], 200.0);
        let step = grid.points()[1] - grid.points()[0];
        assert!((step - 1.0).abs() < 1e-12);
        for w in grid.points().windows(2) {
            assert!(w[1] > w[0], "grid must be strictly increasing");
        }
    }

    #[test]
    fn grid_rejects_bad_inputs() {
        assert!(matches!(
            QuantileGrid::new(100.0, 200.0, 1),
            Err(AnalysisError::InvalidGrid { resolution: 1 })
        ));
        assert!(matches!(
            QuantileGrid::new(150.0, 150.0, 10),
            Err(AnalysisError::DegenerateRange { .. })
        ));
    }

    #[test]
    fn miller_bound_is_exact_sum_capped() {
        let grid = QuantileGrid::new(0.0, 10.0, 11).unwrap();
        let a = CdfCurve {
            values: (0..11).map(|i| i as f64 * 0.1).collect(),
        };
        let v = CdfCurve {
            values: (0..11).map(|i| i as f64 * 0.08).collect(),
        };
        let bound = RaceModel::Miller.bound(&a, &v, &grid);
        for i in 0..11 {
            let expected = (a.values[i] + v.values[i]).min(1.0);
            assert_eq!(bound.values[i], expected, "exact equality at point {}", i);
        }
    }

    #[test]
    fn independent_race_below_miller() {
        let grid = QuantileGrid::new(0.0, 10.0, 11).unwrap();
        let a = CdfCurve {
            values: (0..11).map(|i| i as f64 * 0.1).collect(),
        };
        let v = a.clone();
        let miller = RaceModel::Miller.bound(&a, &v, &grid);
        let race = RaceModel::IndependentRace.bound(&a, &v, &grid);
        for i in 0..11 {
            assert!(race.values[i] <= miller.values[i] + 1e-12);
        }
    }

    #[test]
    fn bounds_stay_in_unit_interval() {
        let grid = QuantileGrid::new(0.0, 10.0, 11).unwrap();
        let a = CdfCurve {
            values: (0..11).map(|i| i as f64 * 0.1).collect(),
        };
        let v = a.clone();
        let models = [
            RaceModel::Miller,
            RaceModel::IndependentRace,
            RaceModel::Coactivation { mean: 5.0, sd: 2.0 },
            RaceModel::ParallelInteractive { gamma: 0.5 },
            RaceModel::ResponseEnhancement {
                alpha: 0.6,
                beta: 0.6,
                lambda: 0.4,
            },
        ];
        for model in models {
            let bound = model.bound(&a, &v, &grid);
            for &b in &bound.values {
                assert!((0.0..=1.0).contains(&b), "{:?} produced {}", model, b);
            }
        }
    }

    #[test]
    fn evaluator_insufficient_data() {
        let evaluator = RaceModelEvaluator::new(Config::default());
        let ok = vec![200.0, 210.0, 220.0, 230.0, 240.0];
        let err = evaluator.evaluate(&ok, &ok, &[]).unwrap_err();
        match err {
            AnalysisError::InsufficientData {
                modality,
                got,
                min,
            } => {
                assert_eq!(modality, Modality::Audiovisual);
                assert_eq!(got, 0);
                assert_eq!(min, 5);
            }
            other => panic!("expected InsufficientData, got {:?}", other),
        }
    }

    #[test]
    fn evaluator_all_empty_reports_first_condition() {
        let evaluator = RaceModelEvaluator::new(Config::default());
        let err = evaluator.evaluate(&[], &[], &[]).unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::InsufficientData {
                modality: Modality::Audio,
                got: 0,
                ..
            }
        ));
    }

    #[test]
    fn evaluator_degenerate_range() {
        let evaluator = RaceModelEvaluator::new(Config::default().min_trials(3));
        let same = vec![250.0, 250.0, 250.0];
        let err = evaluator.evaluate(&same, &same, &same).unwrap_err();
        assert!(matches!(err, AnalysisError::DegenerateRange { value } if value == 250.0));
    }

    #[test]
    fn violation_accessors() {
        let evaluator = RaceModelEvaluator::new(Config::default().min_trials(3));
        // Audiovisual far faster than both unisensory conditions.
        let audio = vec![200.0, 220.0, 240.0];
        let visual = vec![210.0, 230.0, 250.0];
        let av = vec![150.0, 160.0, 170.0];
        let result = evaluator.evaluate(&audio, &visual, &av).unwrap();

        assert!(result.violated());
        let (t, magnitude) = result.max_violation().unwrap();
        assert!(magnitude > 0.0);
        assert!((150.0..200.0).contains(&t), "t = {}", t);
        assert!(result.mean_violation(PercentileRange::FULL) > 0.0);
        assert!(result.cumulative_violation(PercentileRange::FULL) > 0.0);
        assert_eq!(result.n_trials, [3, 3, 3]);
    }
}
