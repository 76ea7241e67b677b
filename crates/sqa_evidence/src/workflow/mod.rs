//! The four run stages plus `status`. Each stage reloads everything it needs from the
//! run store, so every invocation is an independent transaction over persisted state.
//! Stages take the current time as an RFC3339 string instead of reading a clock.

mod approve;
mod draft;
mod export;
mod ingest;
mod status;

pub use approve::{approve_run, ApproveSummary};
pub use draft::{draft_run, DraftSummary};
pub use export::{export_run, ExportSummary};
pub use ingest::{ingest_run, IngestInput, IngestSummary};
pub use status::{run_status, RunStatus};

use sqa_core::domain::DraftAnswers;
use sqa_core::error::AppError;
use sqa_core::normalize::timestamps::check_rfc3339;
use sqa_core::run::{sanitize_run_id, RunStore};

fn check_clock(now: &str) -> Result<(), AppError> {
    check_rfc3339("now", now).map_err(|e| {
        AppError::input("STAGE_TIMESTAMP_INVALID", "Stage timestamp must be RFC3339")
            .with_details(e.details.unwrap_or_default())
    })
}

/// Resolve an operator-supplied run id to an existing run.
fn open_run(runs: &RunStore<'_>, raw_run_id: &str) -> Result<String, AppError> {
    let run_id = sanitize_run_id(raw_run_id)?;
    runs.require_exists(&run_id)?;
    Ok(run_id)
}

fn require_draft(runs: &RunStore<'_>, run_id: &str) -> Result<DraftAnswers, AppError> {
    runs.load_draft(run_id)?.ok_or_else(|| {
        AppError::conflict("RUN_NOT_DRAFTED", "Run has no draft answers; run draft first")
            .with_details(format!("run_id={run_id}"))
    })
}
