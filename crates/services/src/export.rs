//! Flattens a result history into downloadable shapes.
//!
//! The rendering/download mechanics live outside this crate; these functions
//! only produce the flat rows, the CSV text, and the raw JSON document.

use serde::Serialize;

use storage::repository::ResultRecord;
use study_core::model::TestResult;

use crate::error::ExportError;

/// One answered question, flattened across all results of a history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportRow {
    pub timestamp: String,
    pub section: String,
    pub group: u32,
    pub question: String,
    pub selected: String,
    pub correct: String,
    pub is_correct: bool,
}

/// One row per answered question across all results, in append order.
#[must_use]
pub fn history_rows(history: &[TestResult]) -> Vec<ExportRow> {
    history
        .iter()
        .flat_map(|result| {
            let timestamp = result.timestamp().to_rfc3339();
            result.answers().iter().map(move |answer| ExportRow {
                timestamp: timestamp.clone(),
                section: answer.section.clone(),
                group: answer.group,
                question: answer.question.clone(),
                selected: answer.selected.clone(),
                correct: answer.correct.clone(),
                is_correct: answer.is_correct,
            })
        })
        .collect()
}

/// The flat rows as CSV text with a header row.
///
/// # Errors
///
/// Returns `ExportError` if a row fails to serialize.
pub fn history_to_csv(history: &[TestResult]) -> Result<String, ExportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in history_rows(history) {
        writer.serialize(row)?;
    }
    let bytes = writer.into_inner().map_err(csv::IntoInnerError::into_error)?;
    Ok(String::from_utf8(bytes)?)
}

/// The history in its raw persisted JSON encoding, pretty-printed.
///
/// # Errors
///
/// Returns `ExportError` if serialization fails.
pub fn history_to_json(history: &[TestResult]) -> Result<String, ExportError> {
    let records: Vec<ResultRecord> = history.iter().map(ResultRecord::from_result).collect();
    Ok(serde_json::to_string_pretty(&records)?)
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
