//! # racebound
//!
//! Race-model analysis of simple reaction time (SRT) experiments.
//!
//! In a redundant-signals experiment, participants respond to auditory,
//! visual, and audiovisual targets. Audiovisual responses are reliably
//! faster; the question is whether that speedup exceeds what parallel
//! independent channels can produce. Miller's race-model inequality bounds
//! the audiovisual CDF by `min(1, F_A(t) + F_V(t))`; where the observed
//! `F_AV(t)` exceeds the bound, no race between separate channels can
//! explain the data and a coactivation account is required.
//!
//! This crate provides:
//! - Empirical CDFs on a shared quantile grid and the violation curve
//!   `bound(t) - F_AV(t)` (negative values are violations)
//! - Alternative bounds (independent race, Gaussian coactivation, and
//!   interaction variants) selected via [`RaceModel`]
//! - Group-level testing across participants with pointwise paired t-tests
//!   and multiple-comparison correction
//! - Supporting inference: t-tests, permutation tests, JZS Bayes factors,
//!   one-way and two-way ANOVA
//! - CSV loading, trial exclusion with undo, and JSON/terminal output
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::path::Path;
//! use racebound::{AnalysisRequest, AnalysisResult, Config, Session};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut session = Session::new(Config::new());
//! session.load_csv_file(Path::new("srt_data.csv"), "pilot")?;
//!
//! let result = session.submit(&AnalysisRequest::RaceModel {
//!     dataset: "pilot".to_string(),
//! })?;
//!
//! if let AnalysisResult::GroupRaceModel(group) = &result {
//!     if group.violated() {
//!         println!("race model violated: {:?}", group.significant_range);
//!     }
//! }
//! println!("{}", racebound::output::format_result(&result));
//! # Ok(())
//! # }
//! ```
//!
//! ## References
//!
//! - Miller, J. (1982). Divided attention: Evidence for coactivation with
//!   redundant signals. Cognitive Psychology, 14(2), 247-279.
//! - Ulrich, R., Miller, J., & Schröter, H. (2007). Testing the race model
//!   inequality: An algorithm and computer programs. Behavior Research
//!   Methods, 39(2), 291-302.

#![warn(missing_docs)]
#![warn(clippy::all)]

// Core modules
mod config;
mod error;
mod types;

// Functional modules
pub mod data;
pub mod output;
pub mod racemodel;
pub mod session;
pub mod statistics;

// Re-exports for public API
pub use config::{Config, Correction};
pub use data::{
    load_csv, load_csv_with_mapping, ColumnMap, DataError, Dataset, ExclusionCriteria,
    ExclusionPreview, ExclusionSummary,
};
pub use error::AnalysisError;
pub use racemodel::{
    evaluate_group, CdfCurve, GroupViolationResult, ParticipantSamples, QuantileGrid, RaceModel,
    RaceModelEvaluator, ViolationResult,
};
pub use session::{
    AnalysisRequest, AnalysisResult, DescriptiveRow, PairwiseComparison, Session, TestMethod,
};
pub use types::{Modality, PercentileRange, Trial};
