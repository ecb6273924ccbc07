use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One search hit as returned by a single provider, before deduplication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawResult {
    pub title: String,
    pub url: String,
    pub snippet: String,
    pub provider: String,
    /// Position within the provider's own response, starting at 0.
    pub rank: u32,
    #[serde(default)]
    pub kind: ResultKind,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultKind {
    #[default]
    Page,
    Document,
}

impl ResultKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Page => "page",
            Self::Document => "document",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "page" => Some(Self::Page),
            "document" => Some(Self::Document),
            _ => None,
        }
    }
}

/// A result bound to its owning request, as persisted and returned to
/// callers. Belongs to exactly one `SearchRequest`; `duplicate_of` points at
/// the earliest-seen unique it matched, or is `None` for uniques.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: Uuid,
    pub request_id: Uuid,
    pub title: String,
    pub url: String,
    pub snippet: String,
    pub provider: String,
    pub rank: u32,
    pub kind: ResultKind,
    pub duplicate_of: Option<Uuid>,
    pub captured_at: DateTime<Utc>,
}

impl SearchResult {
    /// Binds a raw provider hit to a request, assigning its identity.
    #[must_use]
    pub fn from_raw(raw: RawResult, request_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            request_id,
            title: raw.title,
            url: raw.url,
            snippet: raw.snippet,
            provider: raw.provider,
            rank: raw.rank,
            kind: raw.kind,
            duplicate_of: None,
            captured_at: Utc::now(),
        }
    }
}

/// How a duplicate was matched to its unique, in policy order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DuplicateMethod {
    #[serde(rename = "exact-url")]
    ExactUrl,
    #[serde(rename = "normalized-url")]
    NormalizedUrl,
    #[serde(rename = "title-similarity")]
    TitleSimilarity,
}

impl DuplicateMethod {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ExactUrl => "exact-url",
            Self::NormalizedUrl => "normalized-url",
            Self::TitleSimilarity => "title-similarity",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "exact-url" => Some(Self::ExactUrl),
            "normalized-url" => Some(Self::NormalizedUrl),
            "title-similarity" => Some(Self::TitleSimilarity),
            _ => None,
        }
    }
}

/// Immutable record linking a duplicate result to the unique it matched.
/// Created only during deduplication, read-only afterward.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicateRelationship {
    pub result_id: Uuid,
    pub duplicate_of: Uuid,
    pub request_id: Uuid,
    pub similarity: f64,
    pub method: DuplicateMethod,
}

/// Outcome of one `process()` call. Pipeline-internal, never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessingResult {
    pub request_id: Uuid,
    pub unique_results: Vec<SearchResult>,
    pub duplicates_removed: u64,
    pub cache_hit: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_raw_assigns_identity() {
        let request_id = Uuid::new_v4();
        let raw = RawResult {
            title: "Rust Book".to_string(),
            url: "https://doc.rust-lang.org/book".to_string(),
            snippet: "Learn Rust".to_string(),
            provider: "searxng".to_string(),
            rank: 3,
            kind: ResultKind::Page,
        };

        let result = SearchResult::from_raw(raw, request_id);
        assert_eq!(result.request_id, request_id);
        assert_eq!(result.rank, 3);
        assert!(result.duplicate_of.is_none());
    }

    #[test]
    fn test_kind_wire_names() {
        assert_eq!(ResultKind::Page.as_str(), "page");
        assert_eq!(ResultKind::parse("document"), Some(ResultKind::Document));
        assert_eq!(ResultKind::parse("binary"), None);
    }

    #[test]
    fn test_method_wire_names() {
        assert_eq!(DuplicateMethod::ExactUrl.as_str(), "exact-url");
        assert_eq!(
            DuplicateMethod::parse("title-similarity"),
            Some(DuplicateMethod::TitleSimilarity)
        );
        assert_eq!(DuplicateMethod::parse("fuzzy"), None);
    }
}
