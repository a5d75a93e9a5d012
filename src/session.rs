//! Explicit session state and the analysis request/response interface.
//!
//! A [`Session`] owns the loaded datasets and the exclusion undo history —
//! there is no ambient global state. Analyses are submitted as
//! [`AnalysisRequest`] values and come back as [`AnalysisResult`] value
//! objects, decoupling computation from any presentation layer.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::data::{load_csv, Dataset, ExclusionCriteria, ExclusionPreview};
use crate::error::AnalysisError;
use crate::racemodel::{evaluate_group, GroupViolationResult, RaceModelEvaluator, ViolationResult};
use crate::statistics::anova::{anova_one_way, anova_two_way, AnovaTable};
use crate::statistics::bayes::{bayes_factor_ttest, interpret_bayes_factor, Evidence};
use crate::statistics::inference::{
    correct_p_values, permutation_test, significance_symbol, t_test, welch_t_test, TestOutcome,
};
use crate::statistics::{iqr, mean, median, std_dev};
use crate::types::{Modality, Trial};

/// Which test backs a pairwise comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TestMethod {
    /// Student's pooled-variance t-test.
    TTest,
    /// Welch's unequal-variance t-test.
    Welch,
    /// Seeded permutation test on the mean difference.
    Permutation,
    /// JZS Bayes factor (reported alongside the t statistic).
    BayesFactor,
}

/// An analysis to run against the session's datasets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AnalysisRequest {
    /// Race-model evaluation of one dataset. Honors
    /// `Config::per_participant`: per-participant evaluation with group
    /// statistics, or pooled evaluation across all trials.
    RaceModel {
        /// Dataset name.
        dataset: String,
    },

    /// Pairwise comparison of the three modalities' pooled reaction times.
    CompareModalities {
        /// Dataset name.
        dataset: String,
        /// Test backing each pairwise comparison.
        method: TestMethod,
    },

    /// Per-modality pairwise comparison of reaction times between datasets.
    CompareDatasets {
        /// Dataset names; at least two.
        datasets: Vec<String>,
        /// Test backing each pairwise comparison.
        method: TestMethod,
    },

    /// Pairwise comparison of per-participant violation scores between
    /// datasets.
    CompareViolations {
        /// Dataset names; at least two.
        datasets: Vec<String>,
        /// Test backing each pairwise comparison.
        method: TestMethod,
    },

    /// One-way ANOVA across modalities (single dataset) or two-way
    /// modality × dataset ANOVA (multiple datasets).
    Anova {
        /// Dataset names; at least one.
        datasets: Vec<String>,
    },

    /// Per participant × modality descriptive statistics.
    Descriptives {
        /// Dataset name.
        dataset: String,
    },
}

/// One pairwise comparison between two labeled samples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairwiseComparison {
    /// First sample label.
    pub label_a: String,
    /// Second sample label.
    pub label_b: String,
    /// Frequentist test outcome (t or permutation).
    pub outcome: TestOutcome,
    /// Corrected p-value within this comparison family, when a correction
    /// applies.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub p_corrected: Option<f64>,
    /// JZS BF10, for `TestMethod::BayesFactor`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bf10: Option<f64>,
    /// Evidence category for `bf10`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evidence: Option<Evidence>,
    /// Conventional significance stars for the corrected (or raw) p-value.
    pub symbol: String,
}

/// Pairwise comparisons within one modality.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModalityComparisons {
    /// The modality being compared across datasets.
    pub modality: Modality,
    /// One entry per dataset pair.
    pub comparisons: Vec<PairwiseComparison>,
}

/// Descriptive statistics for one participant × modality cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DescriptiveRow {
    /// Participant identifier.
    pub participant: u32,
    /// Modality of the cell.
    pub modality: Modality,
    /// Trial count.
    pub n: usize,
    /// Mean reaction time (ms).
    pub mean: f64,
    /// Median reaction time (ms).
    pub median: f64,
    /// Sample standard deviation (ms).
    pub sd: f64,
    /// Interquartile range (ms).
    pub iqr: f64,
}

/// Result of a submitted analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AnalysisResult {
    /// Pooled race-model evaluation.
    RaceModel(ViolationResult),
    /// Per-participant race-model evaluation with group statistics.
    GroupRaceModel(GroupViolationResult),
    /// Pairwise modality or violation-score comparisons.
    Pairwise(Vec<PairwiseComparison>),
    /// Per-modality comparisons between datasets.
    DatasetComparisons(Vec<ModalityComparisons>),
    /// ANOVA table.
    Anova(AnovaTable),
    /// Descriptive statistics rows.
    Descriptives(Vec<DescriptiveRow>),
}

/// One undoable exclusion pass.
#[derive(Debug, Clone)]
struct UndoRecord {
    dataset: String,
    removed: Vec<Trial>,
}

/// Analysis session: owns datasets, configuration, and exclusion history.
#[derive(Debug, Clone, Default)]
pub struct Session {
    config: Config,
    datasets: BTreeMap<String, Dataset>,
    history: Vec<UndoRecord>,
}

impl Session {
    /// Create a session with the given configuration.
    ///
    /// # Panics
    ///
    /// Panics if the configuration fails validation.
    pub fn new(config: Config) -> Session {
        if let Err(msg) = config.validate() {
            panic!("invalid configuration: {}", msg);
        }
        Session {
            config,
            datasets: BTreeMap::new(),
            history: Vec::new(),
        }
    }

    /// The session configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Replace the session configuration.
    pub fn set_config(&mut self, config: Config) -> Result<(), String> {
        config.validate()?;
        self.config = config;
        Ok(())
    }

    /// Load a CSV file and register it under `name`.
    pub fn load_csv_file(&mut self, path: &Path, name: &str) -> Result<(), AnalysisError> {
        let dataset = load_csv(path, name)?;
        self.datasets.insert(name.to_string(), dataset);
        Ok(())
    }

    /// Register an already-built dataset under its own name.
    pub fn insert_dataset(&mut self, dataset: Dataset) {
        self.datasets.insert(dataset.name().to_string(), dataset);
    }

    /// Remove and return a dataset.
    pub fn remove_dataset(&mut self, name: &str) -> Result<Dataset, AnalysisError> {
        self.datasets
            .remove(name)
            .ok_or_else(|| AnalysisError::UnknownDataset {
                name: name.to_string(),
            })
    }

    /// Registered dataset names, sorted.
    pub fn dataset_names(&self) -> Vec<&str> {
        self.datasets.keys().map(String::as_str).collect()
    }

    /// Look up a dataset.
    pub fn dataset(&self, name: &str) -> Result<&Dataset, AnalysisError> {
        self.datasets
            .get(name)
            .ok_or_else(|| AnalysisError::UnknownDataset {
                name: name.to_string(),
            })
    }

    /// Concatenate registered datasets into a new registered dataset.
    pub fn combine_datasets(
        &mut self,
        name: &str,
        sources: &[&str],
    ) -> Result<(), AnalysisError> {
        let mut refs = Vec::with_capacity(sources.len());
        for source in sources {
            refs.push(self.dataset(source)?);
        }
        let combined = Dataset::combine(name, &refs)?;
        self.datasets.insert(name.to_string(), combined);
        Ok(())
    }

    /// Preview which trials an exclusion pass would remove.
    pub fn preview_exclusions(
        &self,
        name: &str,
        criteria: &ExclusionCriteria,
    ) -> Result<ExclusionPreview, AnalysisError> {
        Ok(self.dataset(name)?.find_exclusions(criteria))
    }

    /// Apply an exclusion pass and push it onto the undo history.
    pub fn apply_exclusions(
        &mut self,
        name: &str,
        criteria: &ExclusionCriteria,
    ) -> Result<ExclusionPreview, AnalysisError> {
        let dataset = self
            .datasets
            .get_mut(name)
            .ok_or_else(|| AnalysisError::UnknownDataset {
                name: name.to_string(),
            })?;
        let preview = dataset.find_exclusions(criteria);
        let removed = dataset.apply_exclusions(&preview.indices);
        if !removed.is_empty() {
            self.history.push(UndoRecord {
                dataset: name.to_string(),
                removed,
            });
        }
        Ok(preview)
    }

    /// Undo the most recent exclusion pass. Returns the affected dataset
    /// name, or `None` when the history is empty or the dataset has been
    /// removed since.
    pub fn undo_exclusions(&mut self) -> Option<String> {
        let record = self.history.pop()?;
        let dataset = self.datasets.get_mut(&record.dataset)?;
        dataset.restore(record.removed);
        Some(record.dataset)
    }

    /// Run an analysis.
    pub fn submit(&self, request: &AnalysisRequest) -> Result<AnalysisResult, AnalysisError> {
        match request {
            AnalysisRequest::RaceModel { dataset } => self.race_model(dataset),
            AnalysisRequest::CompareModalities { dataset, method } => {
                self.compare_modalities(dataset, *method)
            }
            AnalysisRequest::CompareDatasets { datasets, method } => {
                self.compare_datasets(datasets, *method)
            }
            AnalysisRequest::CompareViolations { datasets, method } => {
                self.compare_violations(datasets, *method)
            }
            AnalysisRequest::Anova { datasets } => self.anova(datasets),
            AnalysisRequest::Descriptives { dataset } => self.descriptives(dataset),
        }
    }

    // =========================================================================
    // Request handlers
    // =========================================================================

    fn race_model(&self, name: &str) -> Result<AnalysisResult, AnalysisError> {
        let dataset = self.dataset(name)?;
        if self.config.per_participant {
            let samples = dataset.all_participant_samples();
            let result = evaluate_group(&samples, &self.config)?;
            Ok(AnalysisResult::GroupRaceModel(result))
        } else {
            let (audio, visual, audiovisual) = dataset.pooled_samples();
            let evaluator = RaceModelEvaluator::new(self.config.clone());
            let result = evaluator.evaluate(&audio, &visual, &audiovisual)?;
            Ok(AnalysisResult::RaceModel(result))
        }
    }

    fn compare_modalities(
        &self,
        name: &str,
        method: TestMethod,
    ) -> Result<AnalysisResult, AnalysisError> {
        let dataset = self.dataset(name)?;
        let mut labeled = Vec::with_capacity(3);
        for modality in Modality::ALL {
            let rts = dataset.pooled_reaction_times(modality);
            if rts.len() < 2 {
                return Err(AnalysisError::InsufficientData {
                    modality,
                    got: rts.len(),
                    min: 2,
                });
            }
            labeled.push((modality.to_string(), rts));
        }
        Ok(AnalysisResult::Pairwise(self.pairwise(&labeled, method)))
    }

    fn compare_datasets(
        &self,
        names: &[String],
        method: TestMethod,
    ) -> Result<AnalysisResult, AnalysisError> {
        if names.len() < 2 {
            return Err(AnalysisError::NotEnoughDatasets {
                got: names.len(),
                min: 2,
            });
        }
        let mut result = Vec::with_capacity(3);
        for modality in Modality::ALL {
            let mut labeled = Vec::with_capacity(names.len());
            for name in names {
                let rts = self.dataset(name)?.pooled_reaction_times(modality);
                if rts.len() < 2 {
                    return Err(AnalysisError::InsufficientData {
                        modality,
                        got: rts.len(),
                        min: 2,
                    });
                }
                labeled.push((name.clone(), rts));
            }
            result.push(ModalityComparisons {
                modality,
                comparisons: self.pairwise(&labeled, method),
            });
        }
        Ok(AnalysisResult::DatasetComparisons(result))
    }

    fn compare_violations(
        &self,
        names: &[String],
        method: TestMethod,
    ) -> Result<AnalysisResult, AnalysisError> {
        if names.len() < 2 {
            return Err(AnalysisError::NotEnoughDatasets {
                got: names.len(),
                min: 2,
            });
        }
        let mut labeled = Vec::with_capacity(names.len());
        for name in names {
            let samples = self.dataset(name)?.all_participant_samples();
            let group = evaluate_group(&samples, &self.config)?;
            let scores: Vec<f64> = group
                .participant_scores
                .iter()
                .map(|&(_, score)| score)
                .collect();
            if scores.len() < 2 {
                return Err(AnalysisError::NoValidParticipants);
            }
            labeled.push((name.clone(), scores));
        }
        Ok(AnalysisResult::Pairwise(self.pairwise(&labeled, method)))
    }

    fn anova(&self, names: &[String]) -> Result<AnalysisResult, AnalysisError> {
        if names.is_empty() {
            return Err(AnalysisError::NotEnoughDatasets { got: 0, min: 1 });
        }
        if names.len() == 1 {
            let dataset = self.dataset(&names[0])?;
            let mut groups = Vec::with_capacity(3);
            for modality in Modality::ALL {
                let rts = dataset.pooled_reaction_times(modality);
                if rts.len() < 2 {
                    return Err(AnalysisError::InsufficientData {
                        modality,
                        got: rts.len(),
                        min: 2,
                    });
                }
                groups.push(rts);
            }
            Ok(AnalysisResult::Anova(anova_one_way(&groups, "modality")))
        } else {
            let mut observations = Vec::new();
            for (dataset_idx, name) in names.iter().enumerate() {
                let dataset = self.dataset(name)?;
                for trial in dataset.trials() {
                    observations.push((
                        (trial.modality.code() - 1) as usize,
                        dataset_idx,
                        trial.rt_ms,
                    ));
                }
            }
            Ok(AnalysisResult::Anova(anova_two_way(
                &observations,
                "modality",
                "dataset",
            )))
        }
    }

    fn descriptives(&self, name: &str) -> Result<AnalysisResult, AnalysisError> {
        let dataset = self.dataset(name)?;
        let mut rows = Vec::new();
        for participant in dataset.participants() {
            for modality in Modality::ALL {
                let rts = dataset.reaction_times(participant, modality);
                if rts.is_empty() {
                    continue;
                }
                rows.push(DescriptiveRow {
                    participant,
                    modality,
                    n: rts.len(),
                    mean: mean(&rts),
                    median: median(&rts),
                    sd: std_dev(&rts),
                    iqr: iqr(&rts),
                });
            }
        }
        Ok(AnalysisResult::Descriptives(rows))
    }

    /// All pairwise comparisons among labeled samples, with p-values
    /// corrected across the family for frequentist methods.
    fn pairwise(&self, labeled: &[(String, Vec<f64>)], method: TestMethod) -> Vec<PairwiseComparison> {
        let mut comparisons = Vec::new();
        for i in 0..labeled.len() {
            for j in (i + 1)..labeled.len() {
                let (label_a, a) = &labeled[i];
                let (label_b, b) = &labeled[j];
                let (outcome, bf10) = match method {
                    TestMethod::TTest => (t_test(a, b), None),
                    TestMethod::Welch => (welch_t_test(a, b), None),
                    TestMethod::Permutation => (
                        permutation_test(a, b, self.config.permutations, self.config.seed),
                        None,
                    ),
                    TestMethod::BayesFactor => {
                        let outcome = t_test(a, b);
                        let bf10 = bayes_factor_ttest(
                            outcome.statistic,
                            a.len(),
                            Some(b.len()),
                            self.config.bayes_prior_scale,
                        );
                        (outcome, Some(bf10))
                    }
                };
                comparisons.push(PairwiseComparison {
                    label_a: label_a.clone(),
                    label_b: label_b.clone(),
                    outcome,
                    p_corrected: None,
                    bf10,
                    evidence: bf10.map(interpret_bayes_factor),
                    symbol: String::new(),
                });
            }
        }

        if method != TestMethod::BayesFactor {
            let raw: Vec<f64> = comparisons.iter().map(|c| c.outcome.p_value).collect();
            let corrected = correct_p_values(&raw, self.config.correction);
            for (comparison, p) in comparisons.iter_mut().zip(corrected) {
                comparison.p_corrected = Some(p);
                comparison.symbol = significance_symbol(p).to_string();
            }
        }
        comparisons
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_dataset(name: &str, av_speedup: f64) -> Dataset {
        let mut trials = Vec::new();
        for participant in 1..=6u32 {
            let offset = participant as f64 * 3.0;
            for i in 0..15 {
                let base = 240.0 + offset + i as f64 * 6.0;
                trials.push(Trial {
                    participant,
                    modality: Modality::Audio,
                    rt_ms: base,
                });
                trials.push(Trial {
                    participant,
                    modality: Modality::Visual,
                    rt_ms: base + 12.0,
                });
                trials.push(Trial {
                    participant,
                    modality: Modality::Audiovisual,
                    rt_ms: base - av_speedup,
                });
            }
        }
        Dataset::new(name, trials).unwrap()
    }

    fn session_with(datasets: Vec<Dataset>) -> Session {
        let mut session = Session::new(Config::quick().seed(11));
        for dataset in datasets {
            session.insert_dataset(dataset);
        }
        session
    }

    #[test]
    fn unknown_dataset_is_an_error() {
        let session = session_with(vec![]);
        let err = session
            .submit(&AnalysisRequest::Descriptives {
                dataset: "nope".to_string(),
            })
            .unwrap_err();
        assert!(matches!(err, AnalysisError::UnknownDataset { name } if name == "nope"));
    }

    #[test]
    fn group_race_model_round_trip() {
        let session = session_with(vec![build_dataset("main", 70.0)]);
        let result = session
            .submit(&AnalysisRequest::RaceModel {
                dataset: "main".to_string(),
            })
            .unwrap();
        match result {
            AnalysisResult::GroupRaceModel(group) => {
                assert_eq!(group.participants.len(), 6);
                assert!(group.violated());
            }
            other => panic!("expected GroupRaceModel, got {:?}", other),
        }
    }

    #[test]
    fn pooled_race_model_when_configured() {
        let mut session = session_with(vec![build_dataset("main", 70.0)]);
        let config = session.config().clone().per_participant(false);
        session.set_config(config).unwrap();
        let result = session
            .submit(&AnalysisRequest::RaceModel {
                dataset: "main".to_string(),
            })
            .unwrap();
        assert!(matches!(result, AnalysisResult::RaceModel(_)));
    }

    #[test]
    fn compare_modalities_three_pairs() {
        let session = session_with(vec![build_dataset("main", 70.0)]);
        let result = session
            .submit(&AnalysisRequest::CompareModalities {
                dataset: "main".to_string(),
                method: TestMethod::TTest,
            })
            .unwrap();
        match result {
            AnalysisResult::Pairwise(comparisons) => {
                assert_eq!(comparisons.len(), 3);
                for c in &comparisons {
                    assert!(c.p_corrected.is_some());
                    assert!(c.bf10.is_none());
                }
            }
            other => panic!("expected Pairwise, got {:?}", other),
        }
    }

    #[test]
    fn bayes_comparison_reports_evidence() {
        let session = session_with(vec![build_dataset("main", 70.0)]);
        let result = session
            .submit(&AnalysisRequest::CompareModalities {
                dataset: "main".to_string(),
                method: TestMethod::BayesFactor,
            })
            .unwrap();
        match result {
            AnalysisResult::Pairwise(comparisons) => {
                for c in &comparisons {
                    assert!(c.bf10.is_some());
                    assert!(c.evidence.is_some());
                    assert!(c.p_corrected.is_none());
                }
            }
            other => panic!("expected Pairwise, got {:?}", other),
        }
    }

    #[test]
    fn anova_one_and_two_way() {
        let session = session_with(vec![build_dataset("a", 70.0), build_dataset("b", 0.0)]);

        let one_way = session
            .submit(&AnalysisRequest::Anova {
                datasets: vec!["a".to_string()],
            })
            .unwrap();
        match one_way {
            AnalysisResult::Anova(table) => {
                assert!(table.effect("modality").is_some());
                assert_eq!(table.rows.len(), 2);
            }
            other => panic!("expected Anova, got {:?}", other),
        }

        let two_way = session
            .submit(&AnalysisRequest::Anova {
                datasets: vec!["a".to_string(), "b".to_string()],
            })
            .unwrap();
        match two_way {
            AnalysisResult::Anova(table) => {
                assert!(table.effect("modality").is_some());
                assert!(table.effect("dataset").is_some());
                assert!(table.effect("modality * dataset").is_some());
            }
            other => panic!("expected Anova, got {:?}", other),
        }
    }

    #[test]
    fn violation_comparison_separates_datasets() {
        let session = session_with(vec![build_dataset("fast", 80.0), build_dataset("none", 0.0)]);
        let result = session
            .submit(&AnalysisRequest::CompareViolations {
                datasets: vec!["fast".to_string(), "none".to_string()],
                method: TestMethod::TTest,
            })
            .unwrap();
        match result {
            AnalysisResult::Pairwise(comparisons) => {
                assert_eq!(comparisons.len(), 1);
                // The speeded dataset should show larger violation scores.
                assert!(comparisons[0].outcome.statistic > 0.0);
            }
            other => panic!("expected Pairwise, got {:?}", other),
        }
    }

    #[test]
    fn exclusion_undo_restores_trials() {
        let mut session = session_with(vec![build_dataset("main", 70.0)]);
        let before = session.dataset("main").unwrap().len();

        let criteria = ExclusionCriteria {
            rt_max: Some(280.0),
            ..Default::default()
        };
        let preview = session.apply_exclusions("main", &criteria).unwrap();
        assert!(preview.total() > 0);
        assert_eq!(
            session.dataset("main").unwrap().len(),
            before - preview.total()
        );

        assert_eq!(session.undo_exclusions(), Some("main".to_string()));
        assert_eq!(session.dataset("main").unwrap().len(), before);
        assert_eq!(session.undo_exclusions(), None);
    }

    #[test]
    fn descriptives_cover_all_cells() {
        let session = session_with(vec![build_dataset("main", 70.0)]);
        let result = session
            .submit(&AnalysisRequest::Descriptives {
                dataset: "main".to_string(),
            })
            .unwrap();
        match result {
            AnalysisResult::Descriptives(rows) => {
                assert_eq!(rows.len(), 18); // 6 participants x 3 modalities
                for row in &rows {
                    assert_eq!(row.n, 15);
                    assert!(row.sd > 0.0);
                }
            }
            other => panic!("expected Descriptives, got {:?}", other),
        }
    }
}
