//! Unicode and special-character handling at the CSV boundaries: questionnaire text,
//! reviewer notes and exported tables must survive byte-for-byte.
use pretty_assertions::assert_eq;
use sqa_core::domain::{AnswerStatus, Citation, DraftAnswer};
use sqa_core::export::{build_answers_csv, build_citation_index};
use sqa_core::ingest::decisions_csv::parse_decisions_csv;
use sqa_core::ingest::questionnaire_csv::{parse_questionnaire_csv, write_questionnaire_csv};

#[test]
fn questionnaire_preserves_unicode_and_quoted_commas() {
    let csv_text = "question_id,question\n\
\"Q-δ1\",\"Wird MFA für Administratoren erzwungen?\"\n\
Q2,\"Encryption: at rest, in transit, and in backups? 🔐\"\n";
    let items = parse_questionnaire_csv(csv_text).expect("parse");
    assert_eq!(items[0].question_id, "Q-δ1");
    assert_eq!(items[0].question, "Wird MFA für Administratoren erzwungen?");
    assert_eq!(items[1].question, "Encryption: at rest, in transit, and in backups? 🔐");

    let bytes = write_questionnaire_csv(&items).expect("write");
    let reparsed = parse_questionnaire_csv(std::str::from_utf8(&bytes).expect("utf-8")).expect("reparse");
    assert_eq!(reparsed, items);
}

#[test]
fn reviewer_notes_keep_emoji_and_newlines() {
    let csv_text = "question_id,decision,notes\nQ1,Approve,\"ok 👍\nsee ticket #12\"\n";
    let decisions = parse_decisions_csv(csv_text).expect("parse");
    assert_eq!(decisions["Q1"].notes, "ok 👍\nsee ticket #12");
    assert!(decisions["Q1"].is_approving());
}

#[test]
fn exported_tables_quote_embedded_separators() {
    let answer = DraftAnswer {
        question_id: "Q1".to_string(),
        question: "Do you use \"zero trust\", really?".to_string(),
        answer: "Yes; see policy, section 2.".to_string(),
        citations: vec![Citation {
            source_file: "01_politique_sécurité.md".to_string(),
            line_start: 2,
            line_end: 2,
            quote: "Zéro confiance appliquée | partout".to_string(),
        }],
        status: AnswerStatus::Draft,
    };
    let bytes = build_answers_csv(std::slice::from_ref(&answer)).expect("csv");
    let mut rdr = csv::Reader::from_reader(bytes.as_slice());
    let row = rdr.records().next().expect("row").expect("record");
    assert_eq!(&row[1], "Do you use \"zero trust\", really?");
    assert_eq!(&row[3], "01_politique_sécurité.md:2-2");

    let md = build_citation_index(&[answer]);
    assert!(md.contains("- 01_politique_sécurité.md:2-2 | Zéro confiance appliquée | partout"));
}
