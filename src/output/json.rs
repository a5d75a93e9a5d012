//! JSON serialization for analysis results.

use crate::session::AnalysisResult;

/// Serialize an analysis result to a compact JSON string.
///
/// # Errors
///
/// Returns an error if serialization fails (should not happen for
/// `AnalysisResult`).
pub fn to_json(result: &AnalysisResult) -> Result<String, serde_json::Error> {
    serde_json::to_string(result)
}

/// Serialize an analysis result to a pretty-printed JSON string.
///
/// # Errors
///
/// Returns an error if serialization fails (should not happen for
/// `AnalysisResult`).
pub fn to_json_pretty(result: &AnalysisResult) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{AnalysisResult, DescriptiveRow, PairwiseComparison};
    use crate::statistics::anova::{AnovaRow, AnovaTable};
    use crate::statistics::inference::TestOutcome;
    use crate::types::Modality;

    fn make_pairwise() -> AnalysisResult {
        AnalysisResult::Pairwise(vec![PairwiseComparison {
            label_a: "audio".to_string(),
            label_b: "audiovisual".to_string(),
            outcome: TestOutcome {
                statistic: 4.21,
                df: Some(38.0),
                p_value: 0.00015,
                effect_size: Some(1.33),
            },
            p_corrected: Some(0.00045),
            bf10: None,
            evidence: None,
            symbol: "***".to_string(),
        }])
    }

    fn make_anova() -> AnalysisResult {
        AnalysisResult::Anova(AnovaTable {
            rows: vec![
                AnovaRow {
                    source: "modality".to_string(),
                    ss: 1520.0,
                    df: 2.0,
                    f: Some(9.1),
                    p: Some(0.0003),
                    partial_eta_sq: Some(0.17),
                },
                AnovaRow {
                    source: "Residual".to_string(),
                    ss: 7400.0,
                    df: 87.0,
                    f: None,
                    p: None,
                    partial_eta_sq: None,
                },
            ],
        })
    }

    #[test]
    fn pairwise_round_trips() {
        let result = make_pairwise();
        let json = to_json(&result).unwrap();
        assert!(json.contains("Pairwise"));
        assert!(json.contains("\"label_a\":\"audio\""));
        // Absent optionals are skipped entirely.
        assert!(!json.contains("bf10"));

        let back: AnalysisResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back, result);
    }

    #[test]
    fn anova_serializes_all_rows() {
        let json = to_json(&make_anova()).unwrap();
        assert!(json.contains("Anova"));
        assert!(json.contains("\"source\":\"modality\""));
        assert!(json.contains("\"source\":\"Residual\""));
    }

    #[test]
    fn pretty_output_has_newlines() {
        let result = AnalysisResult::Descriptives(vec![DescriptiveRow {
            participant: 1,
            modality: Modality::Audio,
            n: 20,
            mean: 251.3,
            median: 249.0,
            sd: 31.2,
            iqr: 40.5,
        }]);
        let json = to_json_pretty(&result).unwrap();
        assert!(json.contains('\n'));
        assert!(json.contains("Descriptives"));
    }
}
