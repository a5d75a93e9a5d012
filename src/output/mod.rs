//! Output formatting for analysis results.
//!
//! Two surfaces: [`json`] for machine-readable export and [`terminal`] for
//! colored human-readable summaries. Both operate on [`AnalysisResult`]
//! values; nothing here touches session state.
//!
//! [`AnalysisResult`]: crate::session::AnalysisResult

pub mod json;
pub mod terminal;

pub use json::{to_json, to_json_pretty};
pub use terminal::format_result;
