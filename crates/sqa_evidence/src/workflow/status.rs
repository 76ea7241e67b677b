use serde::{Deserialize, Serialize};
use sqa_core::domain::RunStage;
use sqa_core::error::AppError;
use sqa_core::run::{sanitize_run_id, RunStore};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunStatus {
    pub run_id: String,
    pub stage: RunStage,
    pub question_count: u32,
    pub chunk_count: u32,
    pub answer_count: Option<u32>,
    pub all_answers_have_citations: Option<bool>,
    pub uncited_question_ids: Vec<String>,
    pub human_approved: bool,
    pub reviewer: Option<String>,
    pub exported_at: Option<String>,
}

/// Read-only snapshot of a run, loaded through the same checked readers the stages use.
pub fn run_status(runs: &RunStore<'_>, run_id: &str) -> Result<RunStatus, AppError> {
    let run_id = sanitize_run_id(run_id)?;
    let run_id = run_id.as_str();
    let stage = runs.stage(run_id)?;
    let questionnaire = runs.read_questionnaire(run_id)?;
    let index = runs.load_source_index(run_id)?;
    let draft = runs.load_draft(run_id)?;
    let approval = runs.load_approval(run_id)?;
    let manifest = runs.load_export_manifest(run_id)?;

    Ok(RunStatus {
        run_id: run_id.to_string(),
        stage,
        question_count: questionnaire.len() as u32,
        chunk_count: index.chunk_count,
        answer_count: draft.as_ref().map(|d| d.answers.len() as u32),
        all_answers_have_citations: draft
            .as_ref()
            .map(|d| d.gate_checks.all_answers_have_citations),
        uncited_question_ids: draft
            .map(|d| d.gate_checks.uncited_question_ids)
            .unwrap_or_default(),
        human_approved: approval.as_ref().is_some_and(|a| a.all_approved),
        reviewer: approval.map(|a| a.reviewer),
        exported_at: manifest.map(|m| m.exported_at),
    })
}
