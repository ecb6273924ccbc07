//! Near-duplicate removal within a single result batch.
//!
//! Candidates are scanned left-to-right against previously accepted uniques,
//! in the merged batch order (provider-configuration order, provider-local
//! rank). For each candidate the passes run in a fixed order: exact URL,
//! normalized URL, title similarity. The relation is always duplicate →
//! earliest-seen unique; when several uniques match, the first one wins.

pub mod similarity;
pub mod url_normalize;

use crate::models::{
    DeduplicationOptions, DuplicateMethod, DuplicateRelationship, SearchResult,
};
use similarity::title_similarity;
use url_normalize::{domain_of, exact_key, normalized_key};

/// Partition of one batch into uniques and attributed duplicates.
/// `unique.len() + duplicates.len()` always equals the input length, and
/// `relationships` has one entry per duplicate.
#[derive(Debug, Default)]
pub struct DedupOutcome {
    pub unique: Vec<SearchResult>,
    pub duplicates: Vec<SearchResult>,
    pub relationships: Vec<DuplicateRelationship>,
}

#[derive(Debug, Clone, Default)]
pub struct Deduplicator;

struct AcceptedUnique {
    index: usize,
    exact_key: String,
    normalized_key: String,
}

impl Deduplicator {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Runs the dedup policy over one batch.
    ///
    /// O(n²) in the title-similarity pass; batches are bounded (≤ 100
    /// results) so no indexing is needed.
    #[must_use]
    pub fn dedupe(
        &self,
        results: Vec<SearchResult>,
        options: &DeduplicationOptions,
    ) -> DedupOutcome {
        let mut outcome = DedupOutcome::default();
        let mut accepted: Vec<AcceptedUnique> = Vec::new();

        for mut candidate in results {
            match Self::find_match(&candidate, &accepted, &outcome.unique, options) {
                Some((unique_index, method, score)) => {
                    let unique_id = outcome.unique[unique_index].id;
                    candidate.duplicate_of = Some(unique_id);
                    outcome.relationships.push(DuplicateRelationship {
                        result_id: candidate.id,
                        duplicate_of: unique_id,
                        request_id: candidate.request_id,
                        similarity: score,
                        method,
                    });
                    outcome.duplicates.push(candidate);
                }
                None => {
                    accepted.push(AcceptedUnique {
                        index: outcome.unique.len(),
                        exact_key: exact_key(&candidate.url),
                        normalized_key: normalized_key(&candidate.url),
                    });
                    outcome.unique.push(candidate);
                }
            }
        }

        outcome
    }

    /// Applies the passes in policy order and returns the first match:
    /// (index into uniques, method, similarity score).
    fn find_match(
        candidate: &SearchResult,
        accepted: &[AcceptedUnique],
        uniques: &[SearchResult],
        options: &DeduplicationOptions,
    ) -> Option<(usize, DuplicateMethod, f64)> {
        let candidate_exact = exact_key(&candidate.url);
        if let Some(hit) = accepted.iter().find(|u| u.exact_key == candidate_exact) {
            return Some((hit.index, DuplicateMethod::ExactUrl, 1.0));
        }

        // Domains in ignored_domains legitimately serve different content at
        // one canonical URL, so they are exempt from the normalized pass.
        let exempt = domain_of(&candidate.url)
            .is_some_and(|d| options.ignored_domains.iter().any(|ig| ig.eq_ignore_ascii_case(&d)));

        if !options.strict_url_matching && !exempt {
            let candidate_normalized = normalized_key(&candidate.url);
            if let Some(hit) = accepted
                .iter()
                .find(|u| u.normalized_key == candidate_normalized)
            {
                return Some((hit.index, DuplicateMethod::NormalizedUrl, 1.0));
            }
        }

        let mut best: Option<(usize, f64)> = None;
        for (index, unique) in uniques.iter().enumerate() {
            let score = title_similarity(&candidate.title, &unique.title);
            // Strictly-greater keeps the earliest unique on a tied score.
            if best.is_none_or(|(_, b)| score > b) {
                best = Some((index, score));
            }
        }

        match best {
            Some((index, score)) if score >= options.title_similarity_threshold => {
                Some((index, DuplicateMethod::TitleSimilarity, score))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RawResult;
    use uuid::Uuid;

    fn result(title: &str, url: &str, rank: u32) -> SearchResult {
        SearchResult::from_raw(
            RawResult {
                title: title.to_string(),
                url: url.to_string(),
                snippet: String::new(),
                provider: "test".to_string(),
                rank,
                kind: crate::models::ResultKind::Page,
            },
            Uuid::nil(),
        )
    }

    #[test]
    fn test_conservation_invariant() {
        let batch = vec![
            result("A", "https://a.com/1", 0),
            result("B", "https://a.com/1", 1),
            result("C", "https://c.com/3", 2),
        ];
        let n = batch.len();
        let outcome = Deduplicator::new().dedupe(batch, &DeduplicationOptions::default());
        assert_eq!(outcome.unique.len() + outcome.duplicates.len(), n);
        assert_eq!(outcome.relationships.len(), outcome.duplicates.len());
    }

    #[test]
    fn test_exact_url_first_survives() {
        let batch = vec![
            result("First", "https://example.com/page", 0),
            result("Second", "HTTP://EXAMPLE.COM/page/", 1),
        ];
        let outcome = Deduplicator::new().dedupe(batch, &DeduplicationOptions::default());

        assert_eq!(outcome.unique.len(), 1);
        assert_eq!(outcome.unique[0].title, "First");
        assert_eq!(outcome.relationships[0].method, DuplicateMethod::ExactUrl);
        assert_eq!(
            outcome.duplicates[0].duplicate_of,
            Some(outcome.unique[0].id)
        );
    }

    #[test]
    fn test_normalized_url_catches_tracking_params() {
        let batch = vec![
            result("Article", "https://news.com/story?id=5", 0),
            result("Article again", "https://news.com/story?id=5&utm_source=mail", 1),
        ];
        let outcome = Deduplicator::new().dedupe(batch, &DeduplicationOptions::default());

        assert_eq!(outcome.unique.len(), 1);
        assert_eq!(
            outcome.relationships[0].method,
            DuplicateMethod::NormalizedUrl
        );
    }

    #[test]
    fn test_ignored_domain_exempt_from_normalized_pass() {
        let options = DeduplicationOptions {
            ignored_domains: vec!["news.com".to_string()],
            // Distinct titles so the similarity pass does not catch them.
            title_similarity_threshold: 0.99,
            ..Default::default()
        };
        let batch = vec![
            result("Morning edition", "https://news.com/story?id=5", 0),
            result("Something else entirely", "https://news.com/story?id=5&utm_source=mail", 1),
        ];
        let outcome = Deduplicator::new().dedupe(batch, &options);
        assert_eq!(outcome.unique.len(), 2);
    }

    #[test]
    fn test_title_similarity_attributes_to_earliest() {
        let options = DeduplicationOptions {
            title_similarity_threshold: 0.85,
            ..Default::default()
        };
        let batch = vec![
            result("Diabetes Treatment Options - Mayo Clinic", "https://a.com/1", 0),
            result("Unrelated result", "https://b.com/2", 1),
            result("Diabetes Treatment Options | Mayo Clinic", "https://c.com/3", 2),
        ];
        let outcome = Deduplicator::new().dedupe(batch, &options);

        assert_eq!(outcome.unique.len(), 2);
        assert_eq!(outcome.duplicates.len(), 1);
        let rel = &outcome.relationships[0];
        assert_eq!(rel.method, DuplicateMethod::TitleSimilarity);
        assert_eq!(rel.duplicate_of, outcome.unique[0].id);
        assert!(rel.similarity >= 0.85);
    }

    #[test]
    fn test_strict_url_matching_skips_normalized_pass() {
        let options = DeduplicationOptions {
            strict_url_matching: true,
            title_similarity_threshold: 0.99,
            ..Default::default()
        };
        let batch = vec![
            result("One thing", "https://news.com/story?id=5", 0),
            result("Another thing", "https://news.com/story?id=5&utm_source=mail", 1),
        ];
        let outcome = Deduplicator::new().dedupe(batch, &options);
        assert_eq!(outcome.unique.len(), 2);
    }

    #[test]
    fn test_empty_batch() {
        let outcome = Deduplicator::new().dedupe(Vec::new(), &DeduplicationOptions::default());
        assert!(outcome.unique.is_empty());
        assert!(outcome.duplicates.is_empty());
    }
}
