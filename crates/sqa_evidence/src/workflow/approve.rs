use std::path::Path;

use serde::{Deserialize, Serialize};
use sqa_core::domain::{Approval, Decision, APPROVAL_SCHEMA};
use sqa_core::error::AppError;
use sqa_core::gates::{citation_gate_for_draft, evaluate_decisions, GateBlock, StageOutcome};
use sqa_core::ingest::decisions_csv::parse_decisions_csv;
use sqa_core::ingest::read_input_text;
use sqa_core::run::RunStore;

use super::{check_clock, open_run, require_draft};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApproveSummary {
    pub run_id: String,
    pub reviewer: String,
    pub question_count: u32,
    pub approved_count: u32,
    pub approval_written: bool,
}

/// Record a reviewer's decisions. All-or-nothing: `approval.json` is written only when
/// the draft passed its citation gate and every question has an approving decision.
/// Otherwise nothing is written and every blocking reason is returned together.
pub fn approve_run(
    runs: &RunStore<'_>,
    run_id: &str,
    reviewer: &str,
    decisions_path: &Path,
    now: &str,
) -> Result<StageOutcome<ApproveSummary>, AppError> {
    check_clock(now)?;
    let run_id = open_run(runs, run_id)?;
    let run_id = run_id.as_str();
    let reviewer = reviewer.trim();
    if reviewer.is_empty() {
        return Err(AppError::input("REVIEWER_REQUIRED", "Reviewer identity is required"));
    }
    let draft = require_draft(runs, run_id)?;
    if runs.has_approval(run_id)? {
        return Err(AppError::conflict("RUN_ALREADY_APPROVED", "Run is already approved")
            .with_details(format!("run_id={run_id}")));
    }

    let mut decisions = parse_decisions_csv(&read_input_text(decisions_path, "Decisions")?)?;
    let question_ids: Vec<String> = draft.answers.iter().map(|a| a.question_id.clone()).collect();

    let unknown: Vec<&String> = decisions
        .keys()
        .filter(|id| !question_ids.contains(*id))
        .collect();
    if !unknown.is_empty() {
        tracing::warn!(
            run_id,
            ids = ?unknown,
            "ignoring decisions for unknown question ids"
        );
    }

    let mut blocks: Vec<GateBlock> = citation_gate_for_draft(&draft).into_iter().collect();
    blocks.extend(evaluate_decisions(&question_ids, &decisions));

    let approved_count = question_ids
        .iter()
        .filter(|id| decisions.get(*id).is_some_and(Decision::is_approving))
        .count() as u32;
    let mut summary = ApproveSummary {
        run_id: run_id.to_string(),
        reviewer: reviewer.to_string(),
        question_count: question_ids.len() as u32,
        approved_count,
        approval_written: false,
    };

    if !blocks.is_empty() {
        for block in &blocks {
            tracing::warn!(run_id, %block, "approval blocked");
        }
        return Ok(StageOutcome::blocked(summary, blocks));
    }

    let approvals: Vec<Decision> = question_ids
        .iter()
        .filter_map(|id| decisions.remove(id))
        .collect();
    runs.save_approval(&Approval {
        schema: APPROVAL_SCHEMA.to_string(),
        run_id: run_id.to_string(),
        reviewer: reviewer.to_string(),
        reviewed_at: now.to_string(),
        all_approved: true,
        approvals,
    })?;
    summary.approval_written = true;

    tracing::info!(
        run_id,
        reviewer,
        approved = summary.approved_count,
        "approval recorded"
    );
    Ok(StageOutcome::completed(summary))
}
