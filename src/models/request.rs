use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::SearchError;

pub const MAX_RESULTS_LIMIT: u32 = 100;
pub const DEFAULT_MAX_RESULTS: u32 = 50;
pub const DEFAULT_TITLE_SIMILARITY_THRESHOLD: f64 = 0.85;

/// Lifecycle of a search request. Transitions are driven only by the
/// results/background processors; `Completed` and `Error` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Processing,
    Completed,
    Error,
}

impl RequestStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Error => "error",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "processing" => Some(Self::Processing),
            "completed" => Some(Self::Completed),
            "error" => Some(Self::Error),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Error)
    }
}

/// Structured provider-facing filters attached to a request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchFilters {
    /// File type restrictions, e.g. `["pdf", "doc"]`.
    pub file_types: Vec<String>,

    /// Restrict results to one trusted domain.
    pub trusted_domain: Option<String>,

    /// Free-form hints forwarded to providers that understand them.
    pub provider_hints: Vec<String>,
}

impl SearchFilters {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.file_types.is_empty()
            && self.trusted_domain.is_none()
            && self.provider_hints.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeduplicationOptions {
    /// Similarity score in [0, 1] above which two titles are duplicates.
    pub title_similarity_threshold: f64,

    /// When set, only exact URL matches count; normalized-URL and
    /// title-similarity passes are skipped.
    pub strict_url_matching: bool,

    /// Domains exempt from normalized-URL matching.
    pub ignored_domains: Vec<String>,
}

impl Default for DeduplicationOptions {
    fn default() -> Self {
        Self {
            title_similarity_threshold: DEFAULT_TITLE_SIMILARITY_THRESHOLD,
            strict_url_matching: false,
            ignored_domains: Vec::new(),
        }
    }
}

/// A search request as accepted at the core boundary and persisted.
///
/// After creation, `status` is the only mutable field besides the terminal
/// `result_count`/`error_message` pair. Rows are destroyed only by external
/// retention policy, never by the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    pub id: Uuid,
    pub user_id: Option<String>,
    pub query: String,
    pub title: String,
    pub filters: SearchFilters,
    /// Provider identifiers to fan out to; empty means the configured default.
    pub providers: Vec<String>,
    pub dedup: DeduplicationOptions,
    pub max_results: u32,
    pub status: RequestStatus,
    pub result_count: Option<i64>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl SearchRequest {
    /// Builds a new pending request, deriving the title from the query when
    /// the caller does not supply one.
    #[must_use]
    pub fn new(query: impl Into<String>) -> Self {
        let query = query.into();
        Self {
            id: Uuid::new_v4(),
            user_id: None,
            title: query.clone(),
            query,
            filters: SearchFilters::default(),
            providers: Vec::new(),
            dedup: DeduplicationOptions::default(),
            max_results: DEFAULT_MAX_RESULTS,
            status: RequestStatus::Pending,
            result_count: None,
            error_message: None,
            created_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn with_providers(mut self, providers: Vec<String>) -> Self {
        self.providers = providers;
        self
    }

    #[must_use]
    pub fn with_filters(mut self, filters: SearchFilters) -> Self {
        self.filters = filters;
        self
    }

    #[must_use]
    pub fn with_dedup(mut self, dedup: DeduplicationOptions) -> Self {
        self.dedup = dedup;
        self
    }

    #[must_use]
    pub const fn with_max_results(mut self, max_results: u32) -> Self {
        self.max_results = max_results;
        self
    }

    /// Rejects malformed input before any network or storage work.
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.query.trim().is_empty() {
            return Err(SearchError::validation("query must not be empty"));
        }

        if self.max_results < 1 || self.max_results > MAX_RESULTS_LIMIT {
            return Err(SearchError::validation(format!(
                "max_results must be in [1, {}], got {}",
                MAX_RESULTS_LIMIT, self.max_results
            )));
        }

        let threshold = self.dedup.title_similarity_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(SearchError::validation(format!(
                "title_similarity_threshold must be in [0, 1], got {threshold}"
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_request_defaults() {
        let req = SearchRequest::new("diabetes treatment");
        assert_eq!(req.status, RequestStatus::Pending);
        assert_eq!(req.title, "diabetes treatment");
        assert_eq!(req.max_results, DEFAULT_MAX_RESULTS);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_empty_query_rejected() {
        let req = SearchRequest::new("   ");
        assert!(matches!(
            req.validate(),
            Err(SearchError::Validation(_))
        ));
    }

    #[test]
    fn test_max_results_boundaries() {
        assert!(SearchRequest::new("q").with_max_results(1).validate().is_ok());
        assert!(SearchRequest::new("q").with_max_results(100).validate().is_ok());
        assert!(SearchRequest::new("q").with_max_results(0).validate().is_err());
        assert!(SearchRequest::new("q").with_max_results(101).validate().is_err());
    }

    #[test]
    fn test_threshold_out_of_range_rejected() {
        let req = SearchRequest::new("q").with_dedup(DeduplicationOptions {
            title_similarity_threshold: 1.5,
            ..Default::default()
        });
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_status_round_trip() {
        for status in [
            RequestStatus::Pending,
            RequestStatus::Processing,
            RequestStatus::Completed,
            RequestStatus::Error,
        ] {
            assert_eq!(RequestStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(RequestStatus::parse("bogus"), None);
    }
}
