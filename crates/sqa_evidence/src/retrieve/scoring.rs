use std::collections::BTreeSet;

/// Dense-overlap bonus per shared token.
const OVERLAP_BONUS: f64 = 0.01;

/// Lowercased maximal runs of ASCII letters and digits, as a set.
pub fn tokenize(text: &str) -> BTreeSet<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_ascii_lowercase() || c.is_ascii_digit()))
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Jaccard similarity plus `0.01 * overlap`. Zero when nothing overlaps.
pub fn score_chunk(question_tokens: &BTreeSet<String>, chunk_text: &str) -> f64 {
    let chunk_tokens = tokenize(chunk_text);
    if chunk_tokens.is_empty() {
        return 0.0;
    }
    let overlap = question_tokens.intersection(&chunk_tokens).count();
    if overlap == 0 {
        return 0.0;
    }
    let union = question_tokens.union(&chunk_tokens).count();
    overlap as f64 / union as f64 + overlap as f64 * OVERLAP_BONUS
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn set(words: &[&str]) -> BTreeSet<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn tokenizer_lowercases_and_splits_on_non_alnum() {
        assert_eq!(
            tokenize("Is MFA enforced for SSO-2 logins? MFA!"),
            set(&["is", "mfa", "enforced", "for", "sso", "2", "logins"])
        );
        assert_eq!(tokenize("Zugriffskontrolle für Büros"), set(&["zugriffskontrolle", "f", "r", "b", "ros"]));
        assert!(tokenize("  --  ").is_empty());
    }

    #[test]
    fn score_is_jaccard_plus_bonus() {
        let q = tokenize("mfa enforced staff");
        // overlap 2 (mfa, enforced), union 4 (mfa, enforced, staff, always)
        let score = score_chunk(&q, "MFA always enforced");
        assert!((score - (2.0 / 4.0 + 0.02)).abs() < 1e-12);
    }

    #[test]
    fn no_overlap_or_no_tokens_scores_zero() {
        let q = tokenize("mfa");
        assert_eq!(score_chunk(&q, "backups nightly"), 0.0);
        assert_eq!(score_chunk(&q, "---"), 0.0);
    }
}
