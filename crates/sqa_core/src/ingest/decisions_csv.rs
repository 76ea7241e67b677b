use std::collections::BTreeMap;

use crate::domain::Decision;
use crate::error::AppError;

use super::{cell, require_columns};

pub const DECISIONS_COLUMNS: [&str; 3] = ["question_id", "decision", "notes"];

pub fn normalize_decision(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Parse a reviewer decisions CSV into a map keyed by question_id.
///
/// Rows without a question_id are skipped. When an id appears more than once the last
/// row wins. Decision values are normalized (trim + lowercase).
pub fn parse_decisions_csv(csv_text: &str) -> Result<BTreeMap<String, Decision>, AppError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(csv_text.as_bytes());

    let headers = rdr
        .headers()
        .map_err(|e| {
            AppError::input("DECISIONS_CSV_HEADERS_FAILED", "Failed to read decisions CSV headers")
                .with_details(e.to_string())
        })?
        .clone();
    let idx = require_columns(&headers, &DECISIONS_COLUMNS, "DECISIONS_COLUMNS_MISSING", "Decisions")?;

    let mut out = BTreeMap::new();
    for (row_idx, result) in rdr.records().enumerate() {
        let row = result.map_err(|e| {
            AppError::input("DECISIONS_CSV_PARSE_FAILED", "Failed to parse decisions CSV row")
                .with_details(format!("row={}; err={}", row_idx + 1, e))
        })?;
        let question_id = cell(&row, idx[0]);
        if question_id.is_empty() {
            continue;
        }
        out.insert(
            question_id.to_string(),
            Decision {
                question_id: question_id.to_string(),
                decision: normalize_decision(cell(&row, idx[1])),
                notes: cell(&row, idx[2]).to_string(),
            },
        );
    }
    Ok(out)
}
