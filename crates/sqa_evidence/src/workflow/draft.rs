use serde::{Deserialize, Serialize};
use sqa_core::domain::{DraftAnswer, DraftAnswers, DRAFT_ANSWERS_SCHEMA};
use sqa_core::error::AppError;
use sqa_core::gates::StageOutcome;
use sqa_core::run::RunStore;

use crate::draft::draft_question;
use crate::guardrails::{enforce_citations, gate_checks_for};

use super::{check_clock, open_run};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DraftSummary {
    pub run_id: String,
    pub question_count: u32,
    pub cited_count: u32,
    pub uncited_question_ids: Vec<String>,
}

/// Draft every question from the stored questionnaire and source index.
///
/// The draft is always persisted, replacing any earlier one. Uncited questions do not
/// fail the stage; they come back as a citation block.
pub fn draft_run(
    runs: &RunStore<'_>,
    run_id: &str,
    now: &str,
) -> Result<StageOutcome<DraftSummary>, AppError> {
    check_clock(now)?;
    let run_id = open_run(runs, run_id)?;
    let run_id = run_id.as_str();
    if runs.has_approval(run_id)? {
        return Err(AppError::conflict(
            "RUN_ALREADY_APPROVED",
            "Run is already approved; re-drafting would invalidate the approval",
        )
        .with_details(format!("run_id={run_id}")));
    }

    let questionnaire = runs.read_questionnaire(run_id)?;
    let index = runs.load_source_index(run_id)?;

    let answers: Vec<DraftAnswer> = questionnaire
        .iter()
        .map(|item| draft_question(item, &index.chunks))
        .collect();
    let gate_checks = gate_checks_for(&answers);
    let block = enforce_citations(&answers);

    let draft = DraftAnswers {
        schema: DRAFT_ANSWERS_SCHEMA.to_string(),
        run_id: run_id.to_string(),
        generated_at: now.to_string(),
        answers,
        gate_checks,
    };
    runs.save_draft(&draft)?;

    let summary = DraftSummary {
        run_id: run_id.to_string(),
        question_count: draft.answers.len() as u32,
        cited_count: draft.answers.iter().filter(|a| a.is_cited()).count() as u32,
        uncited_question_ids: draft.gate_checks.uncited_question_ids.clone(),
    };
    tracing::info!(
        run_id,
        questions = summary.question_count,
        cited = summary.cited_count,
        "draft complete"
    );
    match block {
        Some(block) => {
            tracing::warn!(run_id, %block, "citation gate blocked");
            Ok(StageOutcome::blocked(summary, vec![block]))
        }
        None => Ok(StageOutcome::completed(summary)),
    }
}
