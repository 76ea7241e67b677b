//! Gate evaluation. Every function here is pure: it takes persisted records and returns
//! the blocks (if any) that forbid the next stage transition. Callers decide whether a
//! block is reported (draft, approve) or stops the stage before it writes (export).

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::{Approval, Decision, DraftAnswer, DraftAnswers, SourceIndex};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Gate {
    Citation,
    Approval,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BlockReason {
    UncitedAnswers,
    CitationMismatch,
    MissingDecisions,
    RejectedDecisions,
    ApprovalMissing,
    ApprovalIncomplete,
}

impl BlockReason {
    pub fn message(self) -> &'static str {
        match self {
            BlockReason::UncitedAnswers => "uncited answers found",
            BlockReason::CitationMismatch => "citations do not match the source index",
            BlockReason::MissingDecisions => "missing decisions",
            BlockReason::RejectedDecisions => "rejected or unresolved decisions",
            BlockReason::ApprovalMissing => "no approval record",
            BlockReason::ApprovalIncomplete => "approval record does not approve every question",
        }
    }
}

/// One unmet gate condition and the question ids it affects.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GateBlock {
    pub gate: Gate,
    pub reason: BlockReason,
    pub question_ids: Vec<String>,
}

impl GateBlock {
    pub fn new(gate: Gate, reason: BlockReason, question_ids: Vec<String>) -> Self {
        Self {
            gate,
            reason,
            question_ids,
        }
    }
}

impl fmt::Display for GateBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.question_ids.is_empty() {
            write!(f, "{}", self.reason.message())
        } else {
            write!(
                f,
                "{}: {}",
                self.reason.message(),
                self.question_ids.join(", ")
            )
        }
    }
}

/// Result of a gated stage: the stage's summary plus any gate blocks it hit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StageOutcome<T> {
    pub summary: T,
    pub blocks: Vec<GateBlock>,
}

impl<T> StageOutcome<T> {
    pub fn completed(summary: T) -> Self {
        Self {
            summary,
            blocks: Vec::new(),
        }
    }

    pub fn blocked(summary: T, blocks: Vec<GateBlock>) -> Self {
        Self { summary, blocks }
    }

    pub fn is_completed(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn blocks_for(&self, reason: BlockReason) -> Option<&GateBlock> {
        self.blocks.iter().find(|b| b.reason == reason)
    }
}

pub fn uncited_question_ids(answers: &[DraftAnswer]) -> Vec<String> {
    answers
        .iter()
        .filter(|a| !a.is_cited())
        .map(|a| a.question_id.clone())
        .collect()
}

/// Citation gate over freshly drafted answers.
pub fn evaluate_citation_gate(answers: &[DraftAnswer]) -> Option<GateBlock> {
    let uncited = uncited_question_ids(answers);
    if uncited.is_empty() {
        return None;
    }
    Some(GateBlock::new(Gate::Citation, BlockReason::UncitedAnswers, uncited))
}

/// Citation gate re-derived from a persisted draft: the stored flag must be true AND
/// every stored answer must still carry a citation.
pub fn citation_gate_for_draft(draft: &DraftAnswers) -> Option<GateBlock> {
    let mut ids: Vec<String> = uncited_question_ids(&draft.answers);
    for id in &draft.gate_checks.uncited_question_ids {
        if !ids.contains(id) {
            ids.push(id.clone());
        }
    }
    if draft.gate_checks.all_answers_have_citations && ids.is_empty() {
        return None;
    }
    Some(GateBlock::new(Gate::Citation, BlockReason::UncitedAnswers, ids))
}

/// Every stored citation must point at an indexed chunk and quote a prefix of its text.
pub fn verify_citations(answers: &[DraftAnswer], index: &SourceIndex) -> Option<GateBlock> {
    let chunks: BTreeMap<(&str, u32, u32), &str> = index
        .chunks
        .iter()
        .map(|c| ((c.source_file.as_str(), c.line_start, c.line_end), c.text.as_str()))
        .collect();

    let mismatched: Vec<String> = answers
        .iter()
        .filter(|a| {
            a.citations.iter().any(|c| {
                match chunks.get(&(c.source_file.as_str(), c.line_start, c.line_end)) {
                    Some(text) => !text.starts_with(c.quote.as_str()),
                    None => true,
                }
            })
        })
        .map(|a| a.question_id.clone())
        .collect();

    if mismatched.is_empty() {
        None
    } else {
        Some(GateBlock::new(Gate::Citation, BlockReason::CitationMismatch, mismatched))
    }
}

/// Approval gate over a reviewer's decisions, in questionnaire order. All-or-nothing:
/// any missing or non-approving decision blocks.
pub fn evaluate_decisions(
    question_ids: &[String],
    decisions: &BTreeMap<String, Decision>,
) -> Vec<GateBlock> {
    let missing: Vec<String> = question_ids
        .iter()
        .filter(|id| !decisions.contains_key(*id))
        .cloned()
        .collect();
    let rejected: Vec<String> = question_ids
        .iter()
        .filter(|id| decisions.get(*id).is_some_and(|d| !d.is_approving()))
        .cloned()
        .collect();

    let mut blocks = Vec::new();
    if !missing.is_empty() {
        blocks.push(GateBlock::new(Gate::Approval, BlockReason::MissingDecisions, missing));
    }
    if !rejected.is_empty() {
        blocks.push(GateBlock::new(Gate::Approval, BlockReason::RejectedDecisions, rejected));
    }
    blocks
}

/// Approval gate re-derived from the persisted approval record.
pub fn approval_gate_for_record(
    question_ids: &[String],
    approval: Option<&Approval>,
) -> Option<GateBlock> {
    let Some(approval) = approval else {
        return Some(GateBlock::new(
            Gate::Approval,
            BlockReason::ApprovalMissing,
            question_ids.to_vec(),
        ));
    };

    let approved: BTreeSet<&str> = approval
        .approvals
        .iter()
        .filter(|d| d.is_approving())
        .map(|d| d.question_id.as_str())
        .collect();
    let unresolved: Vec<String> = question_ids
        .iter()
        .filter(|id| !approved.contains(id.as_str()))
        .cloned()
        .collect();

    if approval.all_approved && unresolved.is_empty() {
        return None;
    }
    Some(GateBlock::new(
        Gate::Approval,
        BlockReason::ApprovalIncomplete,
        unresolved,
    ))
}

/// Proof that both gates held when the export stage re-derived them. Only
/// [`clear_for_export`] can build one, and the exporter accepts nothing else.
#[derive(Debug, Clone)]
pub struct ExportClearance {
    run_id: String,
    answers: Vec<DraftAnswer>,
    reviewer: String,
    approved_at: String,
}

impl ExportClearance {
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn answers(&self) -> &[DraftAnswer] {
        &self.answers
    }

    pub fn reviewer(&self) -> &str {
        &self.reviewer
    }

    pub fn approved_at(&self) -> &str {
        &self.approved_at
    }
}

/// Re-check every export precondition from persisted records. Returns all blocks at once
/// so the operator sees every affected question id.
pub fn clear_for_export(
    draft: &DraftAnswers,
    approval: Option<&Approval>,
    index: &SourceIndex,
) -> Result<ExportClearance, Vec<GateBlock>> {
    let question_ids: Vec<String> = draft.answers.iter().map(|a| a.question_id.clone()).collect();

    let blocks: Vec<GateBlock> = [
        citation_gate_for_draft(draft),
        verify_citations(&draft.answers, index),
        approval_gate_for_record(&question_ids, approval),
    ]
    .into_iter()
    .flatten()
    .collect();

    match approval {
        Some(approval) if blocks.is_empty() => Ok(ExportClearance {
            run_id: draft.run_id.clone(),
            answers: draft.answers.clone(),
            reviewer: approval.reviewer.clone(),
            approved_at: approval.reviewed_at.clone(),
        }),
        _ => Err(blocks),
    }
}
