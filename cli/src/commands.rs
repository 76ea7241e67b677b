use serde::Serialize;
use serde_json::json;
use sqa_core::error::AppError;
use sqa_core::gates::{GateBlock, StageOutcome};
use sqa_core::pricing::{evaluate_pilot_deal, DealInput};
use sqa_core::run::RunStore;
use sqa_evidence::workflow::{
    approve_run, draft_run, export_run, ingest_run, run_status, IngestInput,
};

use crate::args::{ApproveArgs, DealArgs, ExportArgs, IngestArgs, RunArgs};

/// Process exit status: `0` completed, `1` gate-blocked, `2` fatal error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    Completed,
    Blocked,
    Fatal,
}

impl Exit {
    pub fn code(self) -> u8 {
        match self {
            Exit::Completed => 0,
            Exit::Blocked => 1,
            Exit::Fatal => 2,
        }
    }
}

/// What a command prints: operator-facing lines and the same result as JSON.
#[derive(Debug, Clone)]
pub struct Report {
    pub exit: Exit,
    pub lines: Vec<String>,
    pub json: serde_json::Value,
}

fn to_json<T: Serialize>(value: &T) -> Result<serde_json::Value, AppError> {
    serde_json::to_value(value).map_err(|e| {
        AppError::io("OUTPUT_ENCODE_FAILED", "Failed to encode command output")
            .with_details(e.to_string())
    })
}

fn blocked_lines(blocks: &[GateBlock]) -> Vec<String> {
    blocks.iter().map(|b| format!("BLOCKED: {b}")).collect()
}

fn outcome_report<T: Serialize>(
    outcome: &StageOutcome<T>,
    mut lines: Vec<String>,
) -> Result<Report, AppError> {
    let exit = if outcome.is_completed() {
        Exit::Completed
    } else {
        lines.extend(blocked_lines(&outcome.blocks));
        Exit::Blocked
    };
    Ok(Report {
        exit,
        lines,
        json: json!({
            "completed": outcome.is_completed(),
            "summary": to_json(&outcome.summary)?,
            "blocks": to_json(&outcome.blocks)?,
        }),
    })
}

pub fn error_report(err: &AppError) -> Report {
    Report {
        exit: Exit::Fatal,
        lines: vec![format!("error: {err}")],
        json: json!({ "error": err }),
    }
}

pub fn ingest(runs: &RunStore<'_>, args: &IngestArgs, now: &str) -> Result<Report, AppError> {
    let input = IngestInput {
        run_id: args.run_id.clone(),
        questionnaire: args.questionnaire.clone(),
        sources: args.sources.clone(),
    };
    let summary = ingest_run(runs, &input, now)?;
    Ok(Report {
        exit: Exit::Completed,
        lines: vec![
            format!("Ingest complete for run {}", summary.run_id),
            format!(
                "Questions: {} | Sources: {} | Source chunks: {}",
                summary.question_count, summary.source_count, summary.chunk_count
            ),
        ],
        json: to_json(&summary)?,
    })
}

pub fn draft(runs: &RunStore<'_>, args: &RunArgs, now: &str) -> Result<Report, AppError> {
    let outcome = draft_run(runs, &args.run_id, now)?;
    let s = &outcome.summary;
    let headline = if outcome.is_completed() {
        format!("Draft complete for run {}", s.run_id)
    } else {
        format!("Draft saved for run {} but the citation gate is unmet", s.run_id)
    };
    let lines = vec![
        headline,
        format!("Drafted answers: {} | cited: {}", s.question_count, s.cited_count),
    ];
    outcome_report(&outcome, lines)
}

pub fn approve(runs: &RunStore<'_>, args: &ApproveArgs, now: &str) -> Result<Report, AppError> {
    let outcome = approve_run(runs, &args.run_id, &args.reviewer, &args.decisions, now)?;
    let s = &outcome.summary;
    let headline = if s.approval_written {
        format!("Approval recorded for run {} by {}", s.run_id, s.reviewer)
    } else {
        format!(
            "Approval blocked for run {}: every question must be approved before export",
            s.run_id
        )
    };
    let lines = vec![
        headline,
        format!("Approved: {}/{}", s.approved_count, s.question_count),
    ];
    outcome_report(&outcome, lines)
}

pub fn export(runs: &RunStore<'_>, args: &ExportArgs, now: &str) -> Result<Report, AppError> {
    let outcome = export_run(runs, &args.run_id, &args.output, now)?;
    let lines = match outcome.summary.archive.as_ref() {
        Some(archive) => vec![
            format!("Export complete: {}", archive.path),
            format!(
                "Answers: {} | entries: {} | sha256: {}",
                outcome.summary.answer_count,
                archive.entries.len(),
                archive.sha256
            ),
        ],
        None => vec![format!(
            "Export blocked for run {}; nothing was written",
            outcome.summary.run_id
        )],
    };
    outcome_report(&outcome, lines)
}

fn flag(value: Option<bool>) -> &'static str {
    match value {
        Some(true) => "yes",
        Some(false) => "no",
        None => "-",
    }
}

pub fn status(runs: &RunStore<'_>, args: &RunArgs) -> Result<Report, AppError> {
    let st = run_status(runs, &args.run_id)?;
    let mut lines = vec![
        format!("Run: {}", st.run_id),
        format!("Stage: {}", st.stage.as_str()),
        format!(
            "Questions: {} | Source chunks: {} | Answers: {}",
            st.question_count,
            st.chunk_count,
            st.answer_count.map(|n| n.to_string()).unwrap_or_else(|| "-".to_string())
        ),
        format!("All answers cited: {}", flag(st.all_answers_have_citations)),
        format!("Human approved: {}", flag(Some(st.human_approved))),
    ];
    if !st.uncited_question_ids.is_empty() {
        lines.push(format!("Uncited question IDs: {}", st.uncited_question_ids.join(", ")));
    }
    if let Some(reviewer) = st.reviewer.as_deref() {
        lines.push(format!("Reviewer: {reviewer}"));
    }
    if let Some(exported_at) = st.exported_at.as_deref() {
        lines.push(format!("Exported at: {exported_at}"));
    }
    Ok(Report {
        exit: Exit::Completed,
        lines,
        json: to_json(&st)?,
    })
}

/// Always reports JSON; the exit status says whether the deal clears the floor.
pub fn validate_pilot_deal(args: &DealArgs) -> Result<Report, AppError> {
    let verdict = evaluate_pilot_deal(DealInput {
        onboarding_fee: args.onboarding_fee,
        monthly_fee: args.monthly_fee,
        included_questionnaires: args.included_questionnaires,
        overage_fee: args.overage_fee,
        expected_questionnaires: args.expected_questionnaires,
        estimated_cogs_per_questionnaire: args.estimated_cogs_per_questionnaire,
    });
    if !verdict.approved {
        tracing::warn!(issues = verdict.issues.len(), "pilot deal below pricing floor");
    }
    let json = to_json(&verdict)?;
    let pretty = serde_json::to_string_pretty(&json).map_err(|e| {
        AppError::io("OUTPUT_ENCODE_FAILED", "Failed to encode command output")
            .with_details(e.to_string())
    })?;
    Ok(Report {
        exit: if verdict.approved {
            Exit::Completed
        } else {
            Exit::Blocked
        },
        lines: vec![pretty],
        json,
    })
}
