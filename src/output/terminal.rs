//! Colored terminal summaries of analysis results.

use colored::Colorize;

use crate::racemodel::{GroupViolationResult, ViolationResult};
use crate::session::{AnalysisResult, DescriptiveRow, ModalityComparisons, PairwiseComparison};
use crate::statistics::anova::AnovaTable;

const SEP_WIDTH: usize = 62;

/// Format any analysis result for human-readable terminal output.
pub fn format_result(result: &AnalysisResult) -> String {
    match result {
        AnalysisResult::RaceModel(r) => format_violation(r),
        AnalysisResult::GroupRaceModel(r) => format_group_violation(r),
        AnalysisResult::Pairwise(comparisons) => format_pairwise("Pairwise Comparisons", comparisons),
        AnalysisResult::DatasetComparisons(per_modality) => format_dataset_comparisons(per_modality),
        AnalysisResult::Anova(table) => format_anova(table),
        AnalysisResult::Descriptives(rows) => format_descriptives(rows),
    }
}

fn header(title: &str) -> String {
    let sep = "\u{2500}".repeat(SEP_WIDTH);
    format!("{}\n  {}\n{}\n", sep, title.bold(), sep)
}

/// Format a pooled race-model evaluation.
pub fn format_violation(result: &ViolationResult) -> String {
    let mut out = header("Race Model Test");

    out.push_str(&format!(
        "  Trials:       audio {}, visual {}, audiovisual {}\n",
        result.n_trials[0], result.n_trials[1], result.n_trials[2]
    ));
    let points = result.grid.points();
    out.push_str(&format!(
        "  Grid:         {} points over {:.1}..{:.1} ms\n",
        result.grid.len(),
        points[0],
        points[points.len() - 1]
    ));

    match result.max_violation() {
        Some((t, magnitude)) => {
            out.push_str(&format!(
                "  Verdict:      {}\n",
                "race model violated".red().bold()
            ));
            out.push_str(&format!(
                "  Peak:         {:.3} at {:.1} ms\n",
                magnitude, t
            ));
            if let Some((lo, hi)) = result.violation_range() {
                out.push_str(&format!("  Range:        {:.1}..{:.1} ms\n", lo, hi));
            }
        }
        None => {
            out.push_str(&format!(
                "  Verdict:      {}\n",
                "no violation".green()
            ));
        }
    }
    out
}

/// Format a group-level race-model evaluation.
pub fn format_group_violation(result: &GroupViolationResult) -> String {
    let mut out = header("Race Model Test (group)");

    out.push_str(&format!(
        "  Participants: {} included, {} skipped\n",
        result.participants.len(),
        result.n_skipped
    ));

    match result.significant_range {
        Some((lo, hi)) => {
            out.push_str(&format!(
                "  Verdict:      {}\n",
                "race model violated".red().bold()
            ));
            out.push_str(&format!(
                "  Significant:  {:.1}..{:.1} ms (corrected)\n",
                lo, hi
            ));
        }
        None => {
            out.push_str(&format!(
                "  Verdict:      {}\n",
                "no significant violation".green()
            ));
        }
    }

    if !result.participant_scores.is_empty() {
        out.push_str("\n  Violation scores\n");
        for &(participant, score) in &result.participant_scores {
            out.push_str(&format!("    P{:<4} {:.4}\n", participant, score));
        }
    }
    out
}

/// Format a family of pairwise comparisons as an aligned table.
pub fn format_pairwise(title: &str, comparisons: &[PairwiseComparison]) -> String {
    let mut out = header(title);
    for c in comparisons {
        let df = match c.outcome.df {
            Some(df) => format!("df = {:.1}", df),
            None => "permutation".to_string(),
        };
        out.push_str(&format!(
            "  {} vs {}: t = {:.3} ({}), p = {:.4}",
            c.label_a.bold(),
            c.label_b.bold(),
            c.outcome.statistic,
            df,
            c.outcome.p_value
        ));
        if let Some(p) = c.p_corrected {
            out.push_str(&format!(", corrected = {:.4}", p));
        }
        if let Some(d) = c.outcome.effect_size {
            out.push_str(&format!(", d = {:.2}", d));
        }
        if !c.symbol.is_empty() {
            out.push_str(&format!(" {}", c.symbol.yellow()));
        }
        out.push('\n');
        if let (Some(bf10), Some(evidence)) = (c.bf10, c.evidence) {
            out.push_str(&format!(
                "    BF10 = {:.3} ({})\n",
                bf10,
                evidence.to_string().cyan()
            ));
        }
    }
    out
}

fn format_dataset_comparisons(per_modality: &[ModalityComparisons]) -> String {
    let mut out = String::new();
    for block in per_modality {
        out.push_str(&format_pairwise(
            &format!("Dataset Comparisons \u{2014} {}", block.modality),
            &block.comparisons,
        ));
        out.push('\n');
    }
    out
}

/// Format an ANOVA table.
pub fn format_anova(table: &AnovaTable) -> String {
    let mut out = header("ANOVA");
    out.push_str(&format!(
        "  {:<22} {:>10} {:>6} {:>8} {:>8} {:>6}\n",
        "Source", "SS", "df", "F", "p", "np2"
    ));
    for row in &table.rows {
        let f = row.f.map_or("-".to_string(), |f| format!("{:.2}", f));
        let p = row.p.map_or("-".to_string(), |p| format!("{:.4}", p));
        let np2 = row
            .partial_eta_sq
            .map_or("-".to_string(), |e| format!("{:.3}", e));
        let line = format!(
            "  {:<22} {:>10.1} {:>6.0} {:>8} {:>8} {:>6}\n",
            row.source, row.ss, row.df, f, p, np2
        );
        if row.p.is_some_and(|p| p < 0.05) {
            out.push_str(&line.red().to_string());
        } else {
            out.push_str(&line);
        }
    }
    out
}

/// Format descriptive statistics rows.
pub fn format_descriptives(rows: &[DescriptiveRow]) -> String {
    let mut out = header("Descriptives");
    out.push_str(&format!(
        "  {:>5} {:<12} {:>4} {:>8} {:>8} {:>8} {:>8}\n",
        "P", "Modality", "n", "mean", "median", "sd", "IQR"
    ));
    for row in rows {
        out.push_str(&format!(
            "  {:>5} {:<12} {:>4} {:>8.1} {:>8.1} {:>8.1} {:>8.1}\n",
            row.participant,
            row.modality.to_string(),
            row.n,
            row.mean,
            row.median,
            row.sd,
            row.iqr
        ));
    }
    out
}
