//! Error types for race-model and statistical analysis.
//!
//! All analysis failures are deterministic given the same inputs; there are
//! no transient or retryable failure modes, so callers should surface these
//! errors directly rather than retry.

use std::fmt;

use crate::data::DataError;
use crate::types::Modality;

/// Error returned when an analysis cannot be performed.
#[derive(Debug)]
pub enum AnalysisError {
    /// A condition sample has fewer trials than the configured minimum.
    InsufficientData {
        /// Modality of the undersized sample.
        modality: Modality,
        /// Number of trials found.
        got: usize,
        /// Minimum trials required by the configuration.
        min: usize,
    },

    /// The quantile grid resolution is too small to span a range.
    InvalidGrid {
        /// The rejected resolution.
        resolution: usize,
    },

    /// All samples collapse to a single identical value, so no grid can be
    /// constructed. Callers should skip the participant or report the
    /// degenerate result.
    DegenerateRange {
        /// The single repeated value, in milliseconds.
        value: f64,
    },

    /// No participant in a group evaluation had enough data in all three
    /// modalities.
    NoValidParticipants,

    /// A request referenced a dataset name the session does not hold.
    UnknownDataset {
        /// The unresolved name.
        name: String,
    },

    /// A comparison or ANOVA request named fewer datasets than the analysis
    /// needs.
    NotEnoughDatasets {
        /// Number of datasets in the request.
        got: usize,
        /// Minimum required by the analysis.
        min: usize,
    },

    /// A data-layer failure (IO, parse, column contract).
    Data(DataError),
}

impl fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisError::InsufficientData { modality, got, min } => write!(
                f,
                "insufficient data for {} condition: got {} trials, need at least {}",
                modality, got, min
            ),
            AnalysisError::InvalidGrid { resolution } => write!(
                f,
                "invalid quantile grid: resolution {} (need at least 2 points)",
                resolution
            ),
            AnalysisError::DegenerateRange { value } => write!(
                f,
                "degenerate reaction-time range: all samples equal {} ms",
                value
            ),
            AnalysisError::NoValidParticipants => {
                write!(f, "no participant has sufficient data in all three modalities")
            }
            AnalysisError::UnknownDataset { name } => {
                write!(f, "unknown dataset '{}'", name)
            }
            AnalysisError::NotEnoughDatasets { got, min } => write!(
                f,
                "analysis needs at least {} datasets, request named {}",
                min, got
            ),
            AnalysisError::Data(e) => write!(f, "data error: {}", e),
        }
    }
}

impl std::error::Error for AnalysisError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AnalysisError::Data(e) => Some(e),
            _ => None,
        }
    }
}

impl From<DataError> for AnalysisError {
    fn from(e: DataError) -> Self {
        AnalysisError::Data(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_mentions_counts() {
        let err = AnalysisError::InsufficientData {
            modality: Modality::Audiovisual,
            got: 2,
            min: 5,
        };
        let msg = err.to_string();
        assert!(msg.contains("Audiovisual"));
        assert!(msg.contains("got 2"));
        assert!(msg.contains("at least 5"));
    }
}
