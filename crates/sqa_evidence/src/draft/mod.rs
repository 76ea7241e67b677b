use sqa_core::domain::{AnswerStatus, Citation, DraftAnswer, QuestionnaireItem, SourceChunk};

use crate::retrieve::{rank_chunks, ScoredChunk};

/// Hard cap on a drafted answer, in characters.
pub const ANSWER_MAX_CHARS: usize = 600;
const ELLIPSIS: &str = "...";
/// Number of ranked chunks whose text forms the answer.
pub const ANSWER_CHUNKS: usize = 2;
/// Cap on a citation quote, in characters. Quotes carry no truncation marker.
pub const QUOTE_MAX_CHARS: usize = 180;

fn take_chars(text: &str, n: usize) -> &str {
    match text.char_indices().nth(n) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

/// Join the top two chunk texts with a space and cap the result at
/// [`ANSWER_MAX_CHARS`]: over-long answers keep their first 597 characters (trailing
/// whitespace trimmed) plus `...`.
pub fn draft_answer(ranked: &[ScoredChunk<'_>]) -> String {
    let answer = ranked
        .iter()
        .take(ANSWER_CHUNKS)
        .map(|s| s.chunk.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    if answer.chars().count() <= ANSWER_MAX_CHARS {
        return answer;
    }
    let mut out = take_chars(&answer, ANSWER_MAX_CHARS - ELLIPSIS.len())
        .trim_end()
        .to_string();
    out.push_str(ELLIPSIS);
    out
}

pub fn citation_for_chunk(chunk: &SourceChunk) -> Citation {
    Citation {
        source_file: chunk.source_file.clone(),
        line_start: chunk.line_start,
        line_end: chunk.line_end,
        quote: take_chars(&chunk.text, QUOTE_MAX_CHARS).to_string(),
    }
}

/// One citation per ranked chunk, including the ones not used in the answer text.
pub fn build_citations(ranked: &[ScoredChunk<'_>]) -> Vec<Citation> {
    ranked.iter().map(|s| citation_for_chunk(s.chunk)).collect()
}

/// Draft one question. No overlapping evidence yields an empty answer with no
/// citations; that is a valid result, left for the citation gate to report.
pub fn draft_question(item: &QuestionnaireItem, chunks: &[SourceChunk]) -> DraftAnswer {
    let ranked = rank_chunks(&item.question, chunks);
    tracing::debug!(
        question_id = %item.question_id,
        hits = ranked.len(),
        top_score = ranked.first().map(|s| s.score).unwrap_or(0.0),
        "ranked evidence"
    );
    DraftAnswer {
        question_id: item.question_id.clone(),
        question: item.question.clone(),
        answer: draft_answer(&ranked),
        citations: build_citations(&ranked),
        status: AnswerStatus::Draft,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn chunk(line: u32, text: &str) -> SourceChunk {
        SourceChunk {
            source_file: "01_policy.md".to_string(),
            line_start: line,
            line_end: line,
            text: text.to_string(),
        }
    }

    fn scored(chunks: &[SourceChunk]) -> Vec<ScoredChunk<'_>> {
        chunks
            .iter()
            .map(|chunk| ScoredChunk { chunk, score: 1.0 })
            .collect()
    }

    #[test]
    fn joins_top_two_with_single_space() {
        let chunks = vec![chunk(1, "First."), chunk(2, "Second."), chunk(3, "Third.")];
        let ranked = scored(&chunks);
        assert_eq!(draft_answer(&ranked), "First. Second.");
        assert_eq!(build_citations(&ranked).len(), 3);
    }

    #[test]
    fn empty_ranking_gives_empty_answer() {
        assert_eq!(draft_answer(&[]), "");
        assert!(build_citations(&[]).is_empty());
    }

    #[test]
    fn long_answers_are_cut_to_exactly_600_chars() {
        let chunks = vec![chunk(1, &"a".repeat(400)), chunk(2, &"b".repeat(400))];
        let answer = draft_answer(&scored(&chunks));
        assert_eq!(answer.chars().count(), ANSWER_MAX_CHARS);
        assert!(answer.ends_with("..."));
        assert!(answer.starts_with(&"a".repeat(400)));
    }

    #[test]
    fn answer_at_the_limit_is_untouched() {
        let chunks = vec![chunk(1, &"a".repeat(299)), chunk(2, &"b".repeat(300))];
        let answer = draft_answer(&scored(&chunks));
        assert_eq!(answer.chars().count(), 600);
        assert!(!answer.ends_with("..."));
    }

    #[test]
    fn truncation_trims_whitespace_before_marker() {
        let chunks = vec![chunk(1, &"a".repeat(595)), chunk(2, &"b".repeat(50))];
        let answer = draft_answer(&scored(&chunks));
        assert_eq!(answer, format!("{} b...", "a".repeat(595)));

        let chunks = vec![chunk(1, &"a".repeat(596)), chunk(2, &"b".repeat(50))];
        // the cut lands on the joining space
        let answer = draft_answer(&scored(&chunks));
        assert_eq!(answer, format!("{}...", "a".repeat(596)));
    }

    #[test]
    fn multibyte_text_is_counted_in_chars() {
        let chunks = vec![chunk(1, &"é".repeat(700))];
        let answer = draft_answer(&scored(&chunks));
        assert_eq!(answer.chars().count(), 600);

        let quote = citation_for_chunk(&chunks[0]).quote;
        assert_eq!(quote.chars().count(), QUOTE_MAX_CHARS);
    }
}
