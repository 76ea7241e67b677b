use std::collections::BTreeSet;

use crate::domain::QuestionnaireItem;
use crate::error::AppError;

use super::{cell, require_columns};

pub const QUESTIONNAIRE_COLUMNS: [&str; 2] = ["question_id", "question"];

/// Parse a questionnaire CSV.
///
/// Extra columns are ignored. Rows where either required field is blank after trimming
/// are dropped. At least one valid row must remain and ids must be unique.
pub fn parse_questionnaire_csv(csv_text: &str) -> Result<Vec<QuestionnaireItem>, AppError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(csv_text.as_bytes());

    let headers = rdr
        .headers()
        .map_err(|e| {
            AppError::input("QUESTIONNAIRE_CSV_HEADERS_FAILED", "Failed to read questionnaire CSV headers")
                .with_details(e.to_string())
        })?
        .clone();
    let idx = require_columns(
        &headers,
        &QUESTIONNAIRE_COLUMNS,
        "QUESTIONNAIRE_COLUMNS_MISSING",
        "Questionnaire",
    )?;

    let mut items = Vec::new();
    let mut seen = BTreeSet::new();
    let mut duplicates = Vec::new();
    for (row_idx, result) in rdr.records().enumerate() {
        let row = result.map_err(|e| {
            AppError::input("QUESTIONNAIRE_CSV_PARSE_FAILED", "Failed to parse questionnaire CSV row")
                .with_details(format!("row={}; err={}", row_idx + 1, e))
        })?;
        let question_id = cell(&row, idx[0]);
        let question = cell(&row, idx[1]);
        if question_id.is_empty() || question.is_empty() {
            continue;
        }
        if !seen.insert(question_id.to_string()) {
            duplicates.push(question_id.to_string());
            continue;
        }
        items.push(QuestionnaireItem {
            question_id: question_id.to_string(),
            question: question.to_string(),
        });
    }

    if !duplicates.is_empty() {
        return Err(AppError::input(
            "QUESTIONNAIRE_DUPLICATE_ID",
            "Questionnaire question_id values must be unique",
        )
        .with_details(format!("question_ids={}", duplicates.join(", "))));
    }
    if items.is_empty() {
        return Err(AppError::input(
            "QUESTIONNAIRE_EMPTY",
            "Questionnaire CSV is empty after parsing",
        ));
    }
    Ok(items)
}

/// Serialize the stored snapshot (`question_id,question`).
pub fn write_questionnaire_csv(items: &[QuestionnaireItem]) -> Result<Vec<u8>, AppError> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    let encode_err = |e: csv::Error| {
        AppError::io("QUESTIONNAIRE_CSV_WRITE_FAILED", "Failed to encode questionnaire snapshot")
            .with_details(e.to_string())
    };
    wtr.write_record(QUESTIONNAIRE_COLUMNS).map_err(encode_err)?;
    for item in items {
        wtr.write_record([item.question_id.as_str(), item.question.as_str()])
            .map_err(encode_err)?;
    }
    wtr.into_inner().map_err(|e| {
        AppError::io("QUESTIONNAIRE_CSV_WRITE_FAILED", "Failed to flush questionnaire snapshot")
            .with_details(e.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn drops_blank_rows_and_ignores_extra_columns() {
        let csv_text = "section,question_id,question\n\
A,Q1,Do you encrypt data at rest?\n\
A,,Missing id\n\
B,Q2,   \n\
B, Q3 , Do you run pentests? \n";
        let items = parse_questionnaire_csv(csv_text).expect("parse");
        assert_eq!(
            items,
            vec![
                QuestionnaireItem {
                    question_id: "Q1".to_string(),
                    question: "Do you encrypt data at rest?".to_string(),
                },
                QuestionnaireItem {
                    question_id: "Q3".to_string(),
                    question: "Do you run pentests?".to_string(),
                },
            ]
        );
    }

    #[test]
    fn short_rows_are_dropped_not_fatal() {
        let items = parse_questionnaire_csv("question_id,question\nQ1\nQ2,Second\n").expect("parse");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].question_id, "Q2");
    }

    #[test]
    fn missing_column_is_rejected() {
        let err = parse_questionnaire_csv("id,question\nQ1,x\n").unwrap_err();
        assert_eq!(err.code, "QUESTIONNAIRE_COLUMNS_MISSING");
        assert_eq!(err.details.as_deref(), Some("missing=question_id"));
    }

    #[test]
    fn empty_after_parsing_is_rejected() {
        let err = parse_questionnaire_csv("question_id,question\n,\n").unwrap_err();
        assert_eq!(err.code, "QUESTIONNAIRE_EMPTY");
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let err = parse_questionnaire_csv("question_id,question\nQ1,a\nQ1,b\n").unwrap_err();
        assert_eq!(err.code, "QUESTIONNAIRE_DUPLICATE_ID");
    }

    #[test]
    fn snapshot_round_trips_quoted_text() {
        let items = vec![QuestionnaireItem {
            question_id: "Q1".to_string(),
            question: "Describe \"MFA\", SSO, and RBAC".to_string(),
        }];
        let bytes = write_questionnaire_csv(&items).expect("write");
        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(parse_questionnaire_csv(&text).expect("parse"), items);
    }
}
