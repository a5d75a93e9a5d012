//! Shared types for SRT analysis.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stimulus modality of a trial.
///
/// Integer codes follow the dataset column contract:
/// 1 = audio, 2 = visual, 3 = audiovisual.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Modality {
    /// Auditory stimulus only.
    Audio,
    /// Visual stimulus only.
    Visual,
    /// Combined audiovisual stimulus.
    Audiovisual,
}

impl Modality {
    /// All three modalities in column-code order.
    pub const ALL: [Modality; 3] = [Modality::Audio, Modality::Visual, Modality::Audiovisual];

    /// Integer code used in the `modality` dataset column.
    pub fn code(self) -> u8 {
        match self {
            Modality::Audio => 1,
            Modality::Visual => 2,
            Modality::Audiovisual => 3,
        }
    }

    /// Parse a dataset column code.
    pub fn from_code(code: u8) -> Option<Modality> {
        match code {
            1 => Some(Modality::Audio),
            2 => Some(Modality::Visual),
            3 => Some(Modality::Audiovisual),
            _ => None,
        }
    }
}

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Modality::Audio => "Audio",
            Modality::Visual => "Visual",
            Modality::Audiovisual => "Audiovisual",
        };
        write!(f, "{}", name)
    }
}

/// One reaction-time trial.
///
/// Reaction times are in milliseconds and must be positive; the data layer
/// rejects non-positive values at load time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Trial {
    /// Participant identifier from the `participant_number` column.
    pub participant: u32,
    /// Stimulus modality.
    pub modality: Modality,
    /// Reaction time in milliseconds.
    pub rt_ms: f64,
}

/// Percentile window restricting violation aggregation to part of the grid.
///
/// `(0.0, 100.0)` covers the whole grid. The window selects grid indices by
/// position, matching how the original analysis restricts the violation
/// summary to a slice of the common RT axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PercentileRange {
    /// Lower percentile in [0, 100].
    pub lower: f64,
    /// Upper percentile in (lower, 100].
    pub upper: f64,
}

impl PercentileRange {
    /// The full grid.
    pub const FULL: PercentileRange = PercentileRange {
        lower: 0.0,
        upper: 100.0,
    };

    /// Create a window, asserting the bounds are ordered and within [0, 100].
    pub fn new(lower: f64, upper: f64) -> PercentileRange {
        assert!(
            (0.0..=100.0).contains(&lower) && (0.0..=100.0).contains(&upper),
            "percentile bounds must be in [0, 100]"
        );
        assert!(lower < upper, "lower percentile must be < upper");
        PercentileRange { lower, upper }
    }

    /// Convert the window to a half-open index range over `len` grid points.
    pub fn index_range(&self, len: usize) -> std::ops::Range<usize> {
        let lo = (len as f64 * self.lower / 100.0) as usize;
        let hi = (len as f64 * self.upper / 100.0) as usize;
        lo..hi.min(len)
    }
}

impl Default for PercentileRange {
    fn default() -> Self {
        PercentileRange::FULL
    }
}
