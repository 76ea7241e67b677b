use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sqa_core::digest::sha256_hex;
use sqa_core::domain::{SourceChunk, SourceFile, SourceIndex, SOURCE_INDEX_SCHEMA};
use sqa_core::error::AppError;
use sqa_core::ingest::questionnaire_csv::parse_questionnaire_csv;
use sqa_core::ingest::read_input_text;
use sqa_core::run::{sanitize_run_id, RunStore, SOURCES_DIR};
use sqa_core::store::{join_key, validate_key};

use crate::evidence::{check_extension, extract_chunks, stored_source_name};

use super::check_clock;

#[derive(Debug, Clone)]
pub struct IngestInput {
    pub run_id: String,
    pub questionnaire: PathBuf,
    pub sources: Vec<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IngestSummary {
    pub run_id: String,
    pub question_count: u32,
    pub source_count: u32,
    pub chunk_count: u32,
}

struct StagedSource {
    stored_name: String,
    bytes: Vec<u8>,
    entry: SourceFile,
}

fn stage_source(
    runs: &RunStore<'_>,
    run_id: &str,
    index: usize,
    path: &Path,
) -> Result<(StagedSource, Vec<SourceChunk>), AppError> {
    if !path.is_file() {
        return Err(AppError::input("SOURCE_NOT_FOUND", "Source file not found")
            .with_details(format!("path={}", path.display())));
    }
    check_extension(path)?;
    let original_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| {
            AppError::input("SOURCE_NAME_INVALID", "Source file name is not valid UTF-8")
                .with_details(format!("path={}", path.display()))
        })?
        .to_string();

    let bytes = fs::read(path).map_err(|e| {
        AppError::io("SOURCE_READ_FAILED", "Failed to read source file")
            .with_details(format!("path={}; err={}", path.display(), e))
    })?;
    let text = std::str::from_utf8(&bytes).map_err(|e| {
        AppError::input("SOURCE_NOT_UTF8", "Source file is not UTF-8 text")
            .with_details(format!("path={}; err={}", path.display(), e))
    })?;

    let stored_name = stored_source_name(index, &original_name);
    validate_key(&runs.key(run_id, &join_key(SOURCES_DIR, &stored_name))).map_err(|e| {
        AppError::input("SOURCE_NAME_INVALID", "Source file name cannot be stored")
            .with_details(format!(
                "path={}; {}",
                path.display(),
                e.details.unwrap_or_default()
            ))
    })?;
    let chunks = extract_chunks(&stored_name, text.trim_start_matches('\u{feff}'));
    let entry = SourceFile {
        source_file: stored_name.clone(),
        original_name,
        sha256: sha256_hex(&bytes),
        bytes: bytes.len() as u64,
        chunk_count: chunks.len() as u32,
    };
    Ok((
        StagedSource {
            stored_name,
            bytes,
            entry,
        },
        chunks,
    ))
}

/// Create a run from a questionnaire and evidence files.
///
/// Every input is validated before the run id is claimed, so a rejected ingest leaves
/// nothing behind. A run id that was used before is always a conflict, never a merge.
pub fn ingest_run(
    runs: &RunStore<'_>,
    input: &IngestInput,
    now: &str,
) -> Result<IngestSummary, AppError> {
    check_clock(now)?;
    let run_id = sanitize_run_id(&input.run_id)?;
    if runs.exists(&run_id)? {
        return Err(AppError::conflict(
            "RUN_ALREADY_EXISTS",
            "Run already exists; use a new run id",
        )
        .with_details(format!("run_id={run_id}")));
    }

    let questionnaire = parse_questionnaire_csv(&read_input_text(&input.questionnaire, "Questionnaire")?)?;

    let mut staged = Vec::with_capacity(input.sources.len());
    let mut chunks: Vec<SourceChunk> = Vec::new();
    for (idx, path) in input.sources.iter().enumerate() {
        let (source, source_chunks) = stage_source(runs, &run_id, idx + 1, path)?;
        chunks.extend(source_chunks);
        staged.push(source);
    }
    if chunks.is_empty() {
        return Err(AppError::input(
            "EVIDENCE_EMPTY",
            "No source chunks extracted; check the source files",
        )
        .with_details(format!("sources={}", input.sources.len())));
    }

    runs.create(&run_id)?;
    runs.write_questionnaire(&run_id, &questionnaire)?;
    for source in &staged {
        runs.write_source(&run_id, &source.stored_name, &source.bytes)?;
    }
    let index = SourceIndex {
        schema: SOURCE_INDEX_SCHEMA.to_string(),
        run_id: run_id.clone(),
        created_at: now.to_string(),
        chunk_count: chunks.len() as u32,
        sources: staged.into_iter().map(|s| s.entry).collect(),
        chunks,
    };
    runs.save_source_index(&index)?;

    let summary = IngestSummary {
        run_id,
        question_count: questionnaire.len() as u32,
        source_count: index.sources.len() as u32,
        chunk_count: index.chunk_count,
    };
    tracing::info!(
        run_id = %summary.run_id,
        questions = summary.question_count,
        sources = summary.source_count,
        chunks = summary.chunk_count,
        "ingest complete"
    );
    Ok(summary)
}
