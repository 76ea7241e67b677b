use std::path::Path;

use serde::{Deserialize, Serialize};
use sqa_core::error::AppError;
use sqa_core::export::{write_archive, write_export_package, ArchiveSummary};
use sqa_core::gates::{clear_for_export, StageOutcome};
use sqa_core::run::RunStore;

use super::{check_clock, open_run, require_draft};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExportSummary {
    pub run_id: String,
    pub answer_count: u32,
    pub reviewer: Option<String>,
    pub archive: Option<ArchiveSummary>,
}

/// Re-derive both gates from the persisted draft, approval and source index, then
/// rebuild the export package and archive it to `output`.
///
/// Blocked exports write nothing: no package directory, no archive. When the archive
/// cannot be written the package is removed again, so the run stays `approved`.
pub fn export_run(
    runs: &RunStore<'_>,
    run_id: &str,
    output: &Path,
    now: &str,
) -> Result<StageOutcome<ExportSummary>, AppError> {
    check_clock(now)?;
    let run_id = open_run(runs, run_id)?;
    let run_id = run_id.as_str();
    let draft = require_draft(runs, run_id)?;
    let approval = runs.load_approval(run_id)?;
    let index = runs.load_source_index(run_id)?;

    let clearance = match clear_for_export(&draft, approval.as_ref(), &index) {
        Ok(clearance) => clearance,
        Err(blocks) => {
            for block in &blocks {
                tracing::warn!(run_id, %block, "export blocked");
            }
            let summary = ExportSummary {
                run_id: run_id.to_string(),
                answer_count: draft.answers.len() as u32,
                reviewer: approval.map(|a| a.reviewer),
                archive: None,
            };
            return Ok(StageOutcome::blocked(summary, blocks));
        }
    };

    let manifest = write_export_package(runs, &clearance, now)?;
    let archive = match write_archive(runs, run_id, output) {
        Ok(archive) => archive,
        Err(err) => {
            // The manifest marks the run exported; it must not outlive a failed archive.
            runs.clear_export(run_id)?;
            tracing::warn!(run_id, error = %err, "export archive failed; package removed");
            return Err(err);
        }
    };
    tracing::info!(
        run_id,
        answers = manifest.answer_count,
        entries = archive.entries.len(),
        path = %archive.path,
        "export complete"
    );
    Ok(StageOutcome::completed(ExportSummary {
        run_id: run_id.to_string(),
        answer_count: manifest.answer_count,
        reviewer: Some(manifest.reviewer),
        archive: Some(archive),
    }))
}
