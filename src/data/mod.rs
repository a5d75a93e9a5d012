//! Dataset management for SRT trial tables.
//!
//! A [`Dataset`] is an in-memory table of trials with the column contract
//! `participant_number` (int), `modality` (1/2/3), `reaction_time` (positive
//! float, milliseconds). This module owns loading (see [`csv`]), validation,
//! per-participant/per-modality extraction, and trial exclusion.

mod csv;

pub use csv::{load_csv, load_csv_with_mapping, ColumnMap};

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::racemodel::ParticipantSamples;
use crate::statistics::{median, z_scores};
use crate::types::{Modality, Trial};

/// Errors that can occur while loading or validating trial data.
#[derive(Debug)]
pub enum DataError {
    /// IO error reading a file.
    Io(std::io::Error),

    /// CSV structure error at a specific line.
    Parse {
        /// Line number where the error occurred (1-indexed).
        line: usize,
        /// Description of the parse error.
        message: String,
    },

    /// A cell that could not be parsed as its column's type.
    InvalidValue {
        /// Line number where the invalid value was found (1-indexed).
        line: usize,
        /// The offending cell content.
        value: String,
    },

    /// A required column is missing from the header.
    MissingColumn {
        /// The column that was expected.
        column: String,
        /// The header names that were actually found.
        found: Vec<String>,
    },

    /// A reaction time violating the positivity invariant.
    InvalidReactionTime {
        /// The non-positive value, in milliseconds.
        value: f64,
    },

    /// The file or dataset contains no trials.
    Empty,
}

impl fmt::Display for DataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataError::Io(e) => write!(f, "IO error: {}", e),
            DataError::Parse { line, message } => {
                write!(f, "Parse error at line {}: {}", line, message)
            }
            DataError::InvalidValue { line, value } => {
                write!(f, "Invalid value at line {}: '{}'", line, value)
            }
            DataError::MissingColumn { column, found } => {
                write!(
                    f,
                    "Missing column '{}' in header. Found columns: {:?}",
                    column, found
                )
            }
            DataError::InvalidReactionTime { value } => {
                write!(f, "Reaction times must be positive, got {} ms", value)
            }
            DataError::Empty => write!(f, "Dataset contains no trials"),
        }
    }
}

impl std::error::Error for DataError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DataError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for DataError {
    fn from(e: std::io::Error) -> Self {
        DataError::Io(e)
    }
}

/// Criteria for excluding trials, applied within participant × modality.
///
/// All criteria are optional; a trial is excluded when it matches any enabled
/// criterion in an enabled modality.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExclusionCriteria {
    /// Exclude trials faster than this (ms).
    pub rt_min: Option<f64>,
    /// Exclude trials slower than this (ms).
    pub rt_max: Option<f64>,
    /// Exclude trials with |z| above this threshold within their
    /// participant × modality cell.
    pub z_threshold: Option<f64>,
    /// Exclude trials deviating from the cell median by more than this
    /// percentage.
    pub percent_deviation: Option<f64>,
    /// Which modalities to screen, in [audio, visual, audiovisual] order.
    pub modalities: [bool; 3],
}

impl Default for ExclusionCriteria {
    fn default() -> Self {
        Self {
            rt_min: None,
            rt_max: None,
            z_threshold: None,
            percent_deviation: None,
            modalities: [true, true, true],
        }
    }
}

/// Per-participant exclusion counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExclusionSummary {
    /// Participant identifier.
    pub participant: u32,
    /// Excluded audio trials.
    pub audio: usize,
    /// Excluded visual trials.
    pub visual: usize,
    /// Excluded audiovisual trials.
    pub audiovisual: usize,
}

impl ExclusionSummary {
    /// Total excluded trials for this participant.
    pub fn total(&self) -> usize {
        self.audio + self.visual + self.audiovisual
    }
}

/// Preview of an exclusion pass: which trial indices would be removed and
/// the per-participant counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExclusionPreview {
    /// Indices into the dataset's trial table, ascending.
    pub indices: Vec<usize>,
    /// Per-participant summaries, sorted by participant.
    pub summaries: Vec<ExclusionSummary>,
}

impl ExclusionPreview {
    /// Total trials that would be excluded.
    pub fn total(&self) -> usize {
        self.indices.len()
    }
}

/// A named, validated table of SRT trials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    name: String,
    trials: Vec<Trial>,
}

impl Dataset {
    /// Create a dataset, validating the reaction-time invariant.
    ///
    /// # Errors
    ///
    /// `Empty` for an empty trial list; `InvalidReactionTime` for any
    /// non-positive reaction time.
    pub fn new(name: impl Into<String>, trials: Vec<Trial>) -> Result<Dataset, DataError> {
        if trials.is_empty() {
            return Err(DataError::Empty);
        }
        for trial in &trials {
            if !(trial.rt_ms > 0.0) {
                return Err(DataError::InvalidReactionTime { value: trial.rt_ms });
            }
        }
        Ok(Dataset {
            name: name.into(),
            trials,
        })
    }

    /// Dataset name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of trials.
    pub fn len(&self) -> usize {
        self.trials.len()
    }

    /// Whether the dataset holds no trials (possible after exclusions).
    pub fn is_empty(&self) -> bool {
        self.trials.is_empty()
    }

    /// All trials, in table order.
    pub fn trials(&self) -> &[Trial] {
        &self.trials
    }

    /// Sorted unique participant identifiers.
    pub fn participants(&self) -> Vec<u32> {
        let set: BTreeSet<u32> = self.trials.iter().map(|t| t.participant).collect();
        set.into_iter().collect()
    }

    /// Reaction times for one participant × modality cell, in table order.
    pub fn reaction_times(&self, participant: u32, modality: Modality) -> Vec<f64> {
        self.trials
            .iter()
            .filter(|t| t.participant == participant && t.modality == modality)
            .map(|t| t.rt_ms)
            .collect()
    }

    /// All reaction times for a modality, pooled across participants.
    pub fn pooled_reaction_times(&self, modality: Modality) -> Vec<f64> {
        self.trials
            .iter()
            .filter(|t| t.modality == modality)
            .map(|t| t.rt_ms)
            .collect()
    }

    /// The three condition samples for one participant.
    pub fn participant_samples(&self, participant: u32) -> ParticipantSamples {
        ParticipantSamples {
            participant,
            audio: self.reaction_times(participant, Modality::Audio),
            visual: self.reaction_times(participant, Modality::Visual),
            audiovisual: self.reaction_times(participant, Modality::Audiovisual),
        }
    }

    /// Condition samples for every participant, sorted by identifier.
    pub fn all_participant_samples(&self) -> Vec<ParticipantSamples> {
        self.participants()
            .into_iter()
            .map(|p| self.participant_samples(p))
            .collect()
    }

    /// Pooled condition samples across all participants, in
    /// (audio, visual, audiovisual) order.
    pub fn pooled_samples(&self) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
        (
            self.pooled_reaction_times(Modality::Audio),
            self.pooled_reaction_times(Modality::Visual),
            self.pooled_reaction_times(Modality::Audiovisual),
        )
    }

    /// Concatenate several datasets into one.
    ///
    /// # Errors
    ///
    /// `Empty` when all sources are empty.
    pub fn combine(name: impl Into<String>, sources: &[&Dataset]) -> Result<Dataset, DataError> {
        let trials: Vec<Trial> = sources.iter().flat_map(|d| d.trials.iter().copied()).collect();
        Dataset::new(name, trials)
    }

    /// Preview which trials the criteria would exclude.
    ///
    /// Trials are screened within their participant × modality cell; an
    /// index appears once even when several criteria match it.
    pub fn find_exclusions(&self, criteria: &ExclusionCriteria) -> ExclusionPreview {
        let mut excluded: BTreeSet<usize> = BTreeSet::new();
        let mut summaries = Vec::new();

        for participant in self.participants() {
            let mut summary = ExclusionSummary {
                participant,
                audio: 0,
                visual: 0,
                audiovisual: 0,
            };

            for (slot, modality) in Modality::ALL.iter().enumerate() {
                if !criteria.modalities[slot] {
                    continue;
                }
                let cell: Vec<(usize, f64)> = self
                    .trials
                    .iter()
                    .enumerate()
                    .filter(|(_, t)| t.participant == participant && t.modality == *modality)
                    .map(|(i, t)| (i, t.rt_ms))
                    .collect();
                if cell.is_empty() {
                    continue;
                }

                let rts: Vec<f64> = cell.iter().map(|&(_, rt)| rt).collect();
                let z = if criteria.z_threshold.is_some() && rts.len() > 1 {
                    Some(z_scores(&rts))
                } else {
                    None
                };
                let cell_median = if criteria.percent_deviation.is_some() {
                    Some(median(&rts))
                } else {
                    None
                };

                let mut cell_count = 0usize;
                for (pos, &(index, rt)) in cell.iter().enumerate() {
                    let mut matches = false;
                    if let Some(min) = criteria.rt_min {
                        matches |= rt < min;
                    }
                    if let Some(max) = criteria.rt_max {
                        matches |= rt > max;
                    }
                    if let (Some(threshold), Some(z)) = (criteria.z_threshold, &z) {
                        matches |= z[pos].abs() > threshold;
                    }
                    if let (Some(limit), Some(m)) = (criteria.percent_deviation, cell_median) {
                        matches |= (rt - m).abs() / m * 100.0 > limit;
                    }
                    if matches && excluded.insert(index) {
                        cell_count += 1;
                    }
                }

                match modality {
                    Modality::Audio => summary.audio += cell_count,
                    Modality::Visual => summary.visual += cell_count,
                    Modality::Audiovisual => summary.audiovisual += cell_count,
                }
            }

            if summary.total() > 0 {
                summaries.push(summary);
            }
        }

        ExclusionPreview {
            indices: excluded.into_iter().collect(),
            summaries,
        }
    }

    /// Remove the trials at `indices`, returning them for undo.
    ///
    /// Indices must be ascending and in range, as produced by
    /// [`Dataset::find_exclusions`].
    pub fn apply_exclusions(&mut self, indices: &[usize]) -> Vec<Trial> {
        let mut removed = Vec::with_capacity(indices.len());
        // Walk backwards so earlier indices stay valid.
        for &index in indices.iter().rev() {
            removed.push(self.trials.remove(index));
        }
        removed.reverse();
        removed
    }

    /// Reinsert trials removed by a previous exclusion pass.
    ///
    /// Trial order within the table is not semantic; restored trials are
    /// appended.
    pub fn restore(&mut self, trials: Vec<Trial>) {
        self.trials.extend(trials);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trial(participant: u32, modality: Modality, rt_ms: f64) -> Trial {
        Trial {
            participant,
            modality,
            rt_ms,
        }
    }

    fn sample_dataset() -> Dataset {
        let mut trials = Vec::new();
        for p in 1..=2u32 {
            for m in Modality::ALL {
                for i in 0..10 {
                    trials.push(trial(p, m, 200.0 + p as f64 * 10.0 + i as f64 * 5.0));
                }
            }
        }
        Dataset::new("test", trials).unwrap()
    }

    #[test]
    fn rejects_empty_and_nonpositive() {
        assert!(matches!(Dataset::new("x", vec![]), Err(DataError::Empty)));
        let bad = vec![trial(1, Modality::Audio, -5.0)];
        assert!(matches!(
            Dataset::new("x", bad),
            Err(DataError::InvalidReactionTime { value }) if value == -5.0
        ));
    }

    #[test]
    fn extraction_by_participant_and_modality() {
        let data = sample_dataset();
        assert_eq!(data.participants(), vec![1, 2]);
        let rts = data.reaction_times(1, Modality::Audio);
        assert_eq!(rts.len(), 10);
        assert_eq!(rts[0], 210.0);

        let samples = data.participant_samples(2);
        assert_eq!(samples.participant, 2);
        assert_eq!(samples.audio.len(), 10);
        assert_eq!(samples.audiovisual.len(), 10);
    }

    #[test]
    fn rt_window_exclusion() {
        let data = sample_dataset();
        let criteria = ExclusionCriteria {
            rt_max: Some(230.0),
            ..Default::default()
        };
        let preview = data.find_exclusions(&criteria);
        // Participant 1 cells run 210..255; participant 2 cells 220..265.
        assert!(preview.total() > 0);
        for &i in &preview.indices {
            assert!(data.trials()[i].rt_ms > 230.0);
        }
    }

    #[test]
    fn z_score_exclusion_flags_outlier() {
        let mut trials: Vec<Trial> = (0..20)
            .map(|i| trial(1, Modality::Audio, 250.0 + i as f64))
            .collect();
        trials.push(trial(1, Modality::Audio, 900.0));
        let data = Dataset::new("z", trials).unwrap();

        let criteria = ExclusionCriteria {
            z_threshold: Some(3.0),
            ..Default::default()
        };
        let preview = data.find_exclusions(&criteria);
        assert_eq!(preview.total(), 1);
        assert_eq!(data.trials()[preview.indices[0]].rt_ms, 900.0);
        assert_eq!(preview.summaries[0].audio, 1);
    }

    #[test]
    fn percent_deviation_exclusion() {
        let mut trials: Vec<Trial> = (0..10)
            .map(|i| trial(1, Modality::Visual, 300.0 + i as f64))
            .collect();
        trials.push(trial(1, Modality::Visual, 600.0)); // ~97% above median
        let data = Dataset::new("pd", trials).unwrap();

        let criteria = ExclusionCriteria {
            percent_deviation: Some(50.0),
            ..Default::default()
        };
        let preview = data.find_exclusions(&criteria);
        assert_eq!(preview.total(), 1);
    }

    #[test]
    fn disabled_modalities_are_not_screened() {
        let data = sample_dataset();
        let criteria = ExclusionCriteria {
            rt_max: Some(0.1), // would exclude everything
            modalities: [false, false, false],
            ..Default::default()
        };
        assert_eq!(data.find_exclusions(&criteria).total(), 0);
    }

    #[test]
    fn apply_and_restore_round_trip() {
        let mut data = sample_dataset();
        let before = data.len();
        let criteria = ExclusionCriteria {
            rt_max: Some(230.0),
            ..Default::default()
        };
        let preview = data.find_exclusions(&criteria);
        let removed = data.apply_exclusions(&preview.indices);

        assert_eq!(removed.len(), preview.total());
        assert_eq!(data.len(), before - removed.len());
        assert!(data.trials().iter().all(|t| t.rt_ms <= 230.0));

        data.restore(removed);
        assert_eq!(data.len(), before);
    }

    #[test]
    fn combine_concatenates() {
        let a = sample_dataset();
        let b = sample_dataset();
        let combined = Dataset::combine("both", &[&a, &b]).unwrap();
        assert_eq!(combined.len(), a.len() + b.len());
    }
}
