//! CSV loading for SRT trial tables.
//!
//! The expected format is a headered CSV with the columns
//! `participant_number`, `modality` (1 = audio, 2 = visual,
//! 3 = audiovisual), and `reaction_time` (milliseconds). Files exported from
//! other acquisition software can be loaded by remapping header names with
//! [`ColumnMap`].

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use super::{DataError, Dataset};
use crate::types::{Modality, Trial};

/// Header names for the three required columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMap {
    /// Header of the participant identifier column.
    pub participant: String,
    /// Header of the modality code column.
    pub modality: String,
    /// Header of the reaction-time column.
    pub reaction_time: String,
}

impl Default for ColumnMap {
    fn default() -> Self {
        Self {
            participant: "participant_number".to_string(),
            modality: "modality".to_string(),
            reaction_time: "reaction_time".to_string(),
        }
    }
}

/// Load a dataset from a CSV file with the standard column names.
///
/// # Errors
///
/// Returns `DataError` if the file cannot be read, a required column is
/// missing, any cell fails to parse, or the file holds no trials.
pub fn load_csv(path: &Path, name: impl Into<String>) -> Result<Dataset, DataError> {
    load_csv_with_mapping(path, name, &ColumnMap::default())
}

/// Load a dataset from a CSV file with remapped column headers.
pub fn load_csv_with_mapping(
    path: &Path,
    name: impl Into<String>,
    columns: &ColumnMap,
) -> Result<Dataset, DataError> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let mut lines = reader.lines().enumerate();

    // Locate the three required columns in the header.
    let header = loop {
        match lines.next() {
            Some((_, line)) => {
                let line = line?;
                if !line.trim().is_empty() {
                    break line;
                }
            }
            None => return Err(DataError::Empty),
        }
    };
    let names: Vec<String> = header.split(',').map(|s| s.trim().to_string()).collect();
    let find = |wanted: &str| -> Result<usize, DataError> {
        names
            .iter()
            .position(|n| n == wanted)
            .ok_or_else(|| DataError::MissingColumn {
                column: wanted.to_string(),
                found: names.clone(),
            })
    };
    let participant_idx = find(&columns.participant)?;
    let modality_idx = find(&columns.modality)?;
    let rt_idx = find(&columns.reaction_time)?;
    let width = participant_idx.max(modality_idx).max(rt_idx) + 1;

    let mut trials = Vec::new();
    for (line_num, line_result) in lines {
        let line = line_result?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let parts: Vec<&str> = line.split(',').collect();
        if parts.len() < width {
            return Err(DataError::Parse {
                line: line_num + 1,
                message: format!("Expected at least {} columns, got {}", width, parts.len()),
            });
        }

        let participant = parse_integer(parts[participant_idx], line_num + 1)?;
        let participant =
            u32::try_from(participant).map_err(|_| DataError::InvalidValue {
                line: line_num + 1,
                value: parts[participant_idx].trim().to_string(),
            })?;
        let code = parse_integer(parts[modality_idx], line_num + 1)?;
        let modality = u8::try_from(code)
            .ok()
            .and_then(Modality::from_code)
            .ok_or_else(|| DataError::InvalidValue {
                line: line_num + 1,
                value: parts[modality_idx].trim().to_string(),
            })?;
        let rt_ms: f64 = parts[rt_idx]
            .trim()
            .parse()
            .map_err(|_| DataError::InvalidValue {
                line: line_num + 1,
                value: parts[rt_idx].trim().to_string(),
            })?;
        if !(rt_ms > 0.0) {
            return Err(DataError::InvalidReactionTime { value: rt_ms });
        }

        trials.push(Trial {
            participant,
            modality,
            rt_ms,
        });
    }

    Dataset::new(name, trials)
}

/// Parse an integer cell, tolerating float formatting ("3.0") from
/// spreadsheet exports.
fn parse_integer(cell: &str, line: usize) -> Result<u64, DataError> {
    let cell = cell.trim();
    if let Ok(v) = cell.parse::<u64>() {
        return Ok(v);
    }
    let as_float: f64 = cell.parse().map_err(|_| DataError::InvalidValue {
        line,
        value: cell.to_string(),
    })?;
    if as_float >= 0.0 && as_float.fract() == 0.0 {
        Ok(as_float as u64)
    } else {
        Err(DataError::InvalidValue {
            line,
            value: cell.to_string(),
        })
    }
}
