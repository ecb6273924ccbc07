//! Cache key derivation.
//!
//! The fingerprint must be stable: the same normalized query, the same
//! normalized filter set, and the same provider set always produce the same
//! key, independent of key ordering in the filter structure or the order
//! providers were listed in.

use sha2::{Digest, Sha256};

use crate::models::SearchFilters;

/// Derives the deterministic cache fingerprint for a query + filters +
/// provider set.
#[must_use]
pub fn fingerprint(query: &str, filters: &SearchFilters, providers: &[String]) -> String {
    let mut hasher = Sha256::new();

    hasher.update(normalize_query(query));
    hasher.update(b"\x1f");

    let mut file_types: Vec<String> =
        filters.file_types.iter().map(|t| t.trim().to_lowercase()).collect();
    file_types.sort();
    file_types.dedup();
    for ft in &file_types {
        hasher.update(ft);
        hasher.update(b"\x1e");
    }
    hasher.update(b"\x1f");

    if let Some(domain) = &filters.trusted_domain {
        hasher.update(domain.trim().to_lowercase());
    }
    hasher.update(b"\x1f");

    let mut hints: Vec<String> =
        filters.provider_hints.iter().map(|h| h.trim().to_lowercase()).collect();
    hints.sort();
    hints.dedup();
    for hint in &hints {
        hasher.update(hint);
        hasher.update(b"\x1e");
    }
    hasher.update(b"\x1f");

    let mut names: Vec<String> = providers.iter().map(|p| p.trim().to_lowercase()).collect();
    names.sort();
    names.dedup();
    for name in &names {
        hasher.update(name);
        hasher.update(b"\x1e");
    }

    format!("{:x}", hasher.finalize())
}

/// Lowercases and collapses whitespace so incidental formatting does not
/// split the cache.
fn normalize_query(query: &str) -> String {
    query.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stable_across_calls() {
        let filters = SearchFilters::default();
        let providers = vec!["searxng".to_string()];
        assert_eq!(
            fingerprint("diabetes treatment", &filters, &providers),
            fingerprint("diabetes treatment", &filters, &providers)
        );
    }

    #[test]
    fn test_query_whitespace_and_case_normalized() {
        let filters = SearchFilters::default();
        let providers = vec!["searxng".to_string()];
        assert_eq!(
            fingerprint("  Diabetes   Treatment ", &filters, &providers),
            fingerprint("diabetes treatment", &filters, &providers)
        );
    }

    #[test]
    fn test_filter_field_order_irrelevant() {
        let a = SearchFilters {
            file_types: vec!["pdf".to_string(), "doc".to_string()],
            ..Default::default()
        };
        let b = SearchFilters {
            file_types: vec!["doc".to_string(), "pdf".to_string()],
            ..Default::default()
        };
        let providers = vec!["brave".to_string(), "searxng".to_string()];
        let reversed = vec!["searxng".to_string(), "brave".to_string()];
        assert_eq!(
            fingerprint("q", &a, &providers),
            fingerprint("q", &b, &reversed)
        );
    }

    #[test]
    fn test_different_inputs_differ() {
        let filters = SearchFilters::default();
        let providers = vec!["searxng".to_string()];
        assert_ne!(
            fingerprint("diabetes treatment", &filters, &providers),
            fingerprint("diabetes prevention", &filters, &providers)
        );

        let trusted = SearchFilters {
            trusted_domain: Some("nih.gov".to_string()),
            ..Default::default()
        };
        assert_ne!(
            fingerprint("diabetes treatment", &filters, &providers),
            fingerprint("diabetes treatment", &trusted, &providers)
        );
    }

    #[test]
    fn test_field_separators_prevent_collisions() {
        // "ab" as a file type must not equal "a" hint + "b" provider etc.
        let a = SearchFilters {
            file_types: vec!["ab".to_string()],
            ..Default::default()
        };
        let b = SearchFilters {
            file_types: vec!["a".to_string(), "b".to_string()],
            ..Default::default()
        };
        let providers = vec!["searxng".to_string()];
        assert_ne!(fingerprint("q", &a, &providers), fingerprint("q", &b, &providers));
    }
}
