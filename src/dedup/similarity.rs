//! Normalized string similarity for title comparison.

/// Similarity in [0, 1] between two titles after normalization.
/// 1.0 means identical up to case, punctuation, and whitespace.
#[must_use]
pub fn title_similarity(a: &str, b: &str) -> f64 {
    let a = normalize_title(a);
    let b = normalize_title(b);

    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    if a == b {
        return 1.0;
    }

    let distance = levenshtein(&a, &b);
    let max_len = a.chars().count().max(b.chars().count());

    #[allow(clippy::cast_precision_loss)]
    {
        1.0 - distance as f64 / max_len as f64
    }
}

/// Lowercases, replaces punctuation with spaces, and collapses whitespace
/// runs so formatting variations do not dominate the edit distance.
fn normalize_title(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    let mut last_was_space = true;

    for ch in title.chars() {
        if ch.is_alphanumeric() {
            out.extend(ch.to_lowercase());
            last_was_space = false;
        } else if !last_was_space {
            out.push(' ');
            last_was_space = true;
        }
    }

    out.trim_end().to_string()
}

/// Two-row Levenshtein distance over chars.
fn levenshtein(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();

    if a_chars.is_empty() {
        return b_chars.len();
    }
    if b_chars.is_empty() {
        return a_chars.len();
    }

    let mut prev: Vec<usize> = (0..=b_chars.len()).collect();
    let mut curr = vec![0; b_chars.len() + 1];

    for (i, &ca) in a_chars.iter().enumerate() {
        curr[0] = i + 1;
        for (j, &cb) in b_chars.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b_chars.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_titles() {
        assert!((title_similarity("Diabetes Treatment", "Diabetes Treatment") - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_case_and_punctuation_ignored() {
        assert!((title_similarity("Rust: The Book!", "rust the book") - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_unrelated_titles_score_low() {
        assert!(title_similarity("Diabetes Treatment Options", "Quantum Chromodynamics") < 0.5);
    }

    #[test]
    fn test_near_duplicate_scores_high() {
        let score = title_similarity(
            "Diabetes Treatment Options - Mayo Clinic",
            "Diabetes Treatment Options | Mayo Clinic",
        );
        assert!(score > 0.95, "got {score}");
    }

    #[test]
    fn test_empty_titles() {
        assert!((title_similarity("", "") - 1.0).abs() < f64::EPSILON);
        assert!(title_similarity("something", "").abs() < f64::EPSILON);
    }

    #[test]
    fn test_levenshtein_basics() {
        assert_eq!(levenshtein("kitten", "sitting"), 3);
        assert_eq!(levenshtein("abc", "abc"), 0);
        assert_eq!(levenshtein("", "abc"), 3);
    }
}
