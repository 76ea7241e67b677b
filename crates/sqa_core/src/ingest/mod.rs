use std::fs;
use std::path::Path;

use crate::error::AppError;

pub mod decisions_csv;
pub mod questionnaire_csv;

/// Read an operator-supplied text file. Missing files are an input error, not I/O.
pub fn read_input_text(path: &Path, what: &str) -> Result<String, AppError> {
    if !path.is_file() {
        return Err(AppError::input("INPUT_FILE_NOT_FOUND", format!("{what} file not found"))
            .with_details(format!("path={}", path.display())));
    }
    let raw = fs::read_to_string(path).map_err(|e| {
        AppError::input("INPUT_FILE_UNREADABLE", format!("Failed to read {what} file as UTF-8 text"))
            .with_details(format!("path={}; err={}", path.display(), e))
    })?;
    Ok(raw.trim_start_matches('\u{feff}').to_string())
}

pub(crate) fn header_index(headers: &csv::StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|h| h.trim() == name)
}

pub(crate) fn cell<'a>(row: &'a csv::StringRecord, idx: usize) -> &'a str {
    row.get(idx).map(|v| v.trim()).unwrap_or("")
}

pub(crate) fn require_columns(
    headers: &csv::StringRecord,
    required: &[&str],
    code: &str,
    what: &str,
) -> Result<Vec<usize>, AppError> {
    let mut idx = Vec::with_capacity(required.len());
    let mut missing = Vec::new();
    for name in required {
        match header_index(headers, name) {
            Some(i) => idx.push(i),
            None => missing.push(*name),
        }
    }
    if !missing.is_empty() {
        return Err(AppError::input(
            code,
            format!("{what} CSV must include columns: {}", required.join(",")),
        )
        .with_details(format!("missing={}", missing.join(","))));
    }
    Ok(idx)
}
