//! Lexical retrieval. Deterministic and explainable: every score can be recomputed by
//! hand from the question and the chunk text.

use std::collections::BTreeSet;

use sqa_core::domain::SourceChunk;

mod scoring;

pub use scoring::{score_chunk, tokenize};

/// Maximum number of chunks returned per question.
pub const TOP_K: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredChunk<'a> {
    pub chunk: &'a SourceChunk,
    pub score: f64,
}

/// Rank `chunks` against `question`, best first, keeping at most [`TOP_K`] with a
/// positive score.
///
/// Ties keep the order chunks were produced in (file ingestion order, then line order):
/// the sort is stable and never looks at anything but the score.
pub fn rank_chunks<'a>(question: &str, chunks: &'a [SourceChunk]) -> Vec<ScoredChunk<'a>> {
    let question_tokens = tokenize(question);
    rank_with_tokens(&question_tokens, chunks)
}

pub fn rank_with_tokens<'a>(
    question_tokens: &BTreeSet<String>,
    chunks: &'a [SourceChunk],
) -> Vec<ScoredChunk<'a>> {
    let mut scored: Vec<ScoredChunk<'a>> = chunks
        .iter()
        .map(|chunk| ScoredChunk {
            chunk,
            score: score_chunk(question_tokens, &chunk.text),
        })
        .filter(|s| s.score > 0.0)
        .collect();
    scored.sort_by(|a, b| b.score.total_cmp(&a.score));
    scored.truncate(TOP_K);
    scored
}
