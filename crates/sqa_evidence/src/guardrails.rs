use sqa_core::domain::{DraftAnswer, GateChecks};
use sqa_core::gates::{evaluate_citation_gate, uncited_question_ids, GateBlock};

/// Gate flags recorded alongside a fresh draft. Approval is always pending at draft time.
pub fn gate_checks_for(answers: &[DraftAnswer]) -> GateChecks {
    let uncited = uncited_question_ids(answers);
    GateChecks {
        all_answers_have_citations: uncited.is_empty(),
        pending_human_approval: true,
        uncited_question_ids: uncited,
    }
}

/// Every drafted answer must cite at least one chunk before it can go to review.
pub fn enforce_citations(answers: &[DraftAnswer]) -> Option<GateBlock> {
    evaluate_citation_gate(answers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqa_core::domain::{AnswerStatus, Citation};
    use sqa_core::gates::BlockReason;

    fn answer(id: &str, cited: bool) -> DraftAnswer {
        DraftAnswer {
            question_id: id.to_string(),
            question: "q".to_string(),
            answer: String::new(),
            citations: if cited {
                vec![Citation {
                    source_file: "01_a.md".to_string(),
                    line_start: 1,
                    line_end: 1,
                    quote: "a".to_string(),
                }]
            } else {
                Vec::new()
            },
            status: AnswerStatus::Draft,
        }
    }

    #[test]
    fn uncited_answers_fail_the_gate() {
        let answers = vec![answer("Q1", true), answer("Q2", false), answer("Q3", false)];
        let checks = gate_checks_for(&answers);
        assert!(!checks.all_answers_have_citations);
        assert!(checks.pending_human_approval);
        assert_eq!(checks.uncited_question_ids, vec!["Q2", "Q3"]);

        let block = enforce_citations(&answers).unwrap();
        assert_eq!(block.reason, BlockReason::UncitedAnswers);
        assert_eq!(block.to_string(), "uncited answers found: Q2, Q3");
    }

    #[test]
    fn fully_cited_answers_pass() {
        let answers = vec![answer("Q1", true)];
        assert!(gate_checks_for(&answers).all_answers_have_citations);
        assert!(enforce_citations(&answers).is_none());
    }
}
