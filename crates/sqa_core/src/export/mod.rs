use std::fs;
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};
use zip::write::FileOptions;

use crate::digest::sha256_hex;
use crate::domain::{DraftAnswer, ExportFileEntry, ExportGates, ExportManifest, EXPORT_MANIFEST_SCHEMA};
use crate::error::AppError;
use crate::gates::ExportClearance;
use crate::run::{RunStore, MANIFEST_FILE, QUESTIONNAIRE_FILE, SOURCES_DIR};

pub const ANSWERS_FILE: &str = "answers.csv";
pub const CITATIONS_FILE: &str = "citations.md";
pub const ANSWERS_COLUMNS: [&str; 4] = ["question_id", "question", "answer", "citations"];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ArchiveSummary {
    pub path: String,
    pub entries: Vec<String>,
    pub sha256: String,
    pub bytes: u64,
}

/// `file:start-end` locators joined with `; `.
pub fn flatten_citations(answer: &DraftAnswer) -> String {
    answer
        .citations
        .iter()
        .map(|c| c.locator())
        .collect::<Vec<_>>()
        .join("; ")
}

pub fn build_answers_csv(answers: &[DraftAnswer]) -> Result<Vec<u8>, AppError> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    let encode_err = |e: csv::Error| {
        AppError::io("EXPORT_ANSWERS_ENCODE_FAILED", "Failed to encode answers table")
            .with_details(e.to_string())
    };
    wtr.write_record(ANSWERS_COLUMNS).map_err(encode_err)?;
    for a in answers {
        let citations = flatten_citations(a);
        wtr.write_record([
            a.question_id.as_str(),
            a.question.as_str(),
            a.answer.as_str(),
            citations.as_str(),
        ])
        .map_err(encode_err)?;
    }
    wtr.into_inner().map_err(|e| {
        AppError::io("EXPORT_ANSWERS_ENCODE_FAILED", "Failed to flush answers table")
            .with_details(e.to_string())
    })
}

/// Markdown citation index: one section per question, one bullet per citation.
pub fn build_citation_index(answers: &[DraftAnswer]) -> String {
    let mut lines = vec!["# Citation Index".to_string(), String::new()];
    for a in answers {
        lines.push(format!("## {}", a.question_id));
        lines.push(a.question.clone());
        for c in &a.citations {
            lines.push(format!("- {} | {}", c.locator(), c.quote));
        }
        lines.push(String::new());
    }
    lines.join("\n")
}

/// Rebuild `<run_id>/export_package/` from scratch and return the manifest written into it.
///
/// Requires an [`ExportClearance`]; the package is never produced for an ungated run.
pub fn write_export_package(
    runs: &RunStore<'_>,
    clearance: &ExportClearance,
    exported_at: &str,
) -> Result<ExportManifest, AppError> {
    let run_id = clearance.run_id();
    runs.clear_export(run_id)?;

    let answers = clearance.answers();
    runs.put_export_file(run_id, ANSWERS_FILE, &build_answers_csv(answers)?)?;
    runs.put_export_file(run_id, CITATIONS_FILE, build_citation_index(answers).as_bytes())?;
    runs.put_export_file(run_id, QUESTIONNAIRE_FILE, &runs.read_questionnaire_bytes(run_id)?)?;
    for (rel, bytes) in runs.read_sources(run_id)? {
        runs.put_export_file(run_id, &rel, &bytes)?;
    }

    let mut files: Vec<ExportFileEntry> = runs
        .read_export_files(run_id)?
        .into_iter()
        .filter(|(rel, _)| rel != MANIFEST_FILE)
        .map(|(rel, bytes)| ExportFileEntry {
            rel_path: rel,
            sha256: sha256_hex(&bytes),
            bytes: bytes.len() as u64,
        })
        .collect();
    files.sort_by(|a, b| a.rel_path.cmp(&b.rel_path));

    let manifest = ExportManifest {
        schema: EXPORT_MANIFEST_SCHEMA.to_string(),
        run_id: run_id.to_string(),
        exported_at: exported_at.to_string(),
        reviewer: clearance.reviewer().to_string(),
        approval_timestamp: clearance.approved_at().to_string(),
        answer_count: answers.len() as u32,
        gates: ExportGates::passed(),
        files,
    };
    runs.save_export_manifest(&manifest)?;

    tracing::debug!(
        run_id,
        files = manifest.files.len() + 1,
        sources = manifest
            .files
            .iter()
            .filter(|f| f.rel_path.starts_with(&format!("{SOURCES_DIR}/")))
            .count(),
        "export package written"
    );
    Ok(manifest)
}

/// Zip the export package to `output`, entries relative to the package root. Only file
/// entries are written; no directory entries.
pub fn write_archive(
    runs: &RunStore<'_>,
    run_id: &str,
    output: &Path,
) -> Result<ArchiveSummary, AppError> {
    let files = runs.read_export_files(run_id)?;
    if files.is_empty() {
        return Err(AppError::conflict(
            "EXPORT_PACKAGE_EMPTY",
            "Export package is empty; nothing to archive",
        )
        .with_details(format!("run_id={run_id}")));
    }

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| {
            AppError::io("EXPORT_ARCHIVE_MKDIR_FAILED", "Failed to create archive directory")
                .with_details(format!("path={}; err={}", parent.display(), e))
        })?;
    }

    let zip_err = |e: zip::result::ZipError| {
        AppError::io("EXPORT_ARCHIVE_FAILED", "Failed to write export archive")
            .with_details(format!("path={}; err={}", output.display(), e))
    };
    let io_err = |e: std::io::Error| {
        AppError::io("EXPORT_ARCHIVE_FAILED", "Failed to write export archive")
            .with_details(format!("path={}; err={}", output.display(), e))
    };

    let file = fs::File::create(output).map_err(io_err)?;
    let mut zip = zip::ZipWriter::new(file);
    let options = FileOptions::default().compression_method(zip::CompressionMethod::Deflated);
    let mut entries = Vec::with_capacity(files.len());
    for (rel, bytes) in &files {
        zip.start_file(rel.as_str(), options).map_err(zip_err)?;
        zip.write_all(bytes).map_err(io_err)?;
        entries.push(rel.clone());
    }
    zip.finish().map_err(zip_err)?;

    let archive = fs::read(output).map_err(io_err)?;
    Ok(ArchiveSummary {
        path: output.display().to_string(),
        entries,
        sha256: sha256_hex(&archive),
        bytes: archive.len() as u64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AnswerStatus, Citation};
    use pretty_assertions::assert_eq;

    fn answer() -> DraftAnswer {
        DraftAnswer {
            question_id: "Q1".to_string(),
            question: "Is MFA enforced?".to_string(),
            answer: "MFA is enforced for all staff.".to_string(),
            citations: vec![
                Citation {
                    source_file: "01_policy.md".to_string(),
                    line_start: 4,
                    line_end: 4,
                    quote: "MFA is enforced for all staff.".to_string(),
                },
                Citation {
                    source_file: "02_controls.csv".to_string(),
                    line_start: 7,
                    line_end: 7,
                    quote: "mfa,enforced".to_string(),
                },
            ],
            status: AnswerStatus::Draft,
        }
    }

    #[test]
    fn flattens_citations_with_semicolons() {
        assert_eq!(
            flatten_citations(&answer()),
            "01_policy.md:4-4; 02_controls.csv:7-7"
        );
    }

    #[test]
    fn citation_index_groups_by_question() {
        let md = build_citation_index(&[answer()]);
        assert_eq!(
            md,
            "# Citation Index\n\n## Q1\nIs MFA enforced?\n\
- 01_policy.md:4-4 | MFA is enforced for all staff.\n\
- 02_controls.csv:7-7 | mfa,enforced\n"
        );
    }

    #[test]
    fn answers_table_has_one_row_per_answer() {
        let bytes = build_answers_csv(&[answer()]).unwrap();
        let mut rdr = csv::Reader::from_reader(bytes.as_slice());
        let headers: Vec<String> = rdr.headers().unwrap().iter().map(|h| h.to_string()).collect();
        assert_eq!(headers, ANSWERS_COLUMNS.map(String::from).to_vec());
        let rows: Vec<csv::StringRecord> = rdr.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 1);
        assert_eq!(&rows[0][3], "01_policy.md:4-4; 02_controls.csv:7-7");
    }
}
