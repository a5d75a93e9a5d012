//! Configuration for race-model and statistical analysis.

use crate::racemodel::RaceModel;
use crate::types::PercentileRange;

/// Multiple-comparison correction applied across a family of tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Correction {
    /// Bonferroni: multiply each p-value by the family size.
    #[default]
    Bonferroni,
    /// Holm step-down procedure.
    Holm,
    /// No correction.
    None,
}

/// Configuration options for analysis.
///
/// Controls grid construction, data-sufficiency guards, the race-model bound
/// family, and the inferential machinery used for group-level tests.
#[derive(Debug, Clone)]
pub struct Config {
    /// Number of evenly spaced points in the quantile grid.
    ///
    /// The grid spans the global minimum to maximum reaction time across the
    /// three condition samples. Default: 500, matching the common-RT axis
    /// resolution used in the race-model literature tooling.
    pub grid_resolution: usize,

    /// Minimum trials required per condition sample.
    ///
    /// Samples below this size fail with `InsufficientData`. Default: 5.
    pub min_trials: usize,

    /// Race-model bound family. Default: Miller's inequality.
    pub model: RaceModel,

    /// Percentile window over which violation summaries are aggregated.
    ///
    /// Default: the full grid.
    pub percentile_range: PercentileRange,

    /// Evaluate per participant and average (true), or pool all trials
    /// across participants before computing CDFs (false). Default: true.
    pub per_participant: bool,

    /// Significance level for group-level tests. Default: 0.05.
    pub alpha: f64,

    /// Correction applied across grid points and test families.
    pub correction: Correction,

    /// Iterations for permutation tests. Default: 10,000.
    pub permutations: usize,

    /// Cauchy prior scale for JZS Bayes factors. Default: sqrt(2)/2.
    pub bayes_prior_scale: f64,

    /// Optional deterministic seed for permutation tests.
    ///
    /// When set, permutation p-values are reproducible across runs.
    /// Default: None (seeded from entropy).
    pub seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            grid_resolution: 500,
            min_trials: 5,
            model: RaceModel::Miller,
            percentile_range: PercentileRange::FULL,
            per_participant: true,
            alpha: 0.05,
            correction: Correction::Bonferroni,
            permutations: 10_000,
            bayes_prior_scale: std::f64::consts::FRAC_1_SQRT_2,
            seed: None,
        }
    }
}

impl Config {
    /// Create a new configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a quick configuration for exploratory analysis.
    ///
    /// Uses a coarser grid and fewer permutation iterations:
    /// - 100 grid points
    /// - 1,000 permutations
    pub fn quick() -> Self {
        Self {
            grid_resolution: 100,
            permutations: 1_000,
            ..Default::default()
        }
    }

    /// Create a thorough configuration for publication-grade analysis.
    ///
    /// Uses a finer grid and more permutation iterations:
    /// - 2,000 grid points
    /// - 100,000 permutations
    pub fn thorough() -> Self {
        Self {
            grid_resolution: 2_000,
            permutations: 100_000,
            ..Default::default()
        }
    }

    // =========================================================================
    // Builder methods
    // =========================================================================

    /// Set the quantile grid resolution.
    pub fn grid_resolution(mut self, resolution: usize) -> Self {
        assert!(resolution >= 2, "grid_resolution must be at least 2");
        self.grid_resolution = resolution;
        self
    }

    /// Set the minimum trials per condition.
    pub fn min_trials(mut self, min: usize) -> Self {
        assert!(min >= 1, "min_trials must be at least 1");
        self.min_trials = min;
        self
    }

    /// Set the race-model bound family.
    pub fn model(mut self, model: RaceModel) -> Self {
        self.model = model;
        self
    }

    /// Set the percentile aggregation window.
    pub fn percentile_range(mut self, range: PercentileRange) -> Self {
        self.percentile_range = range;
        self
    }

    /// Set per-participant (true) or pooled (false) evaluation.
    pub fn per_participant(mut self, per_participant: bool) -> Self {
        self.per_participant = per_participant;
        self
    }

    /// Set the significance level.
    pub fn alpha(mut self, alpha: f64) -> Self {
        assert!(alpha > 0.0 && alpha < 1.0, "alpha must be in (0, 1)");
        self.alpha = alpha;
        self
    }

    /// Set the multiple-comparison correction.
    pub fn correction(mut self, correction: Correction) -> Self {
        self.correction = correction;
        self
    }

    /// Set the permutation-test iteration count.
    pub fn permutations(mut self, n: usize) -> Self {
        assert!(n > 0, "permutations must be positive");
        self.permutations = n;
        self
    }

    /// Set the JZS Cauchy prior scale.
    pub fn bayes_prior_scale(mut self, r: f64) -> Self {
        assert!(r > 0.0, "bayes_prior_scale must be positive");
        self.bayes_prior_scale = r;
        self
    }

    /// Set a deterministic seed for permutation tests.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Check that the configuration is internally consistent.
    pub fn validate(&self) -> Result<(), String> {
        if self.grid_resolution < 2 {
            return Err("grid_resolution must be at least 2".to_string());
        }
        if self.min_trials == 0 {
            return Err("min_trials must be positive".to_string());
        }
        if !(self.alpha > 0.0 && self.alpha < 1.0) {
            return Err("alpha must be in (0, 1)".to_string());
        }
        if self.permutations == 0 {
            return Err("permutations must be positive".to_string());
        }
        if self.bayes_prior_scale <= 0.0 {
            return Err("bayes_prior_scale must be positive".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.grid_resolution, 500);
        assert_eq!(config.min_trials, 5);
        assert_eq!(config.model, RaceModel::Miller);
        assert!(config.per_participant);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn preset_configs() {
        let quick = Config::quick();
        assert_eq!(quick.grid_resolution, 100);
        assert_eq!(quick.permutations, 1_000);

        let thorough = Config::thorough();
        assert_eq!(thorough.grid_resolution, 2_000);
        assert_eq!(thorough.permutations, 100_000);
    }

    #[test]
    fn builder_methods() {
        let config = Config::new()
            .grid_resolution(250)
            .min_trials(10)
            .alpha(0.01)
            .seed(42);

        assert_eq!(config.grid_resolution, 250);
        assert_eq!(config.min_trials, 10);
        assert_eq!(config.alpha, 0.01);
        assert_eq!(config.seed, Some(42));
    }

    #[test]
    fn validation_catches_bad_values() {
        let mut config = Config::default();
        config.grid_resolution = 1;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.alpha = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    #[should_panic(expected = "grid_resolution must be at least 2")]
    fn builder_rejects_tiny_grid() {
        Config::new().grid_resolution(1);
    }
}
