use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::SearchError;
use crate::models::{
    DeduplicationOptions, ProcessingResult, SearchFilters, SearchRequest, SearchResult,
};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Body accepted by both the synchronous and queued search endpoints.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SearchSubmission {
    pub query: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub providers: Vec<String>,
    #[serde(default)]
    pub filters: Option<SearchFilters>,
    #[serde(default)]
    pub dedup: Option<DeduplicationOptions>,
    #[serde(default)]
    pub max_results: Option<u32>,
}

impl SearchSubmission {
    /// Builds a validated request, falling back to configured defaults for
    /// anything the caller left out.
    pub fn into_request(
        self,
        defaults: &crate::config::Config,
    ) -> Result<SearchRequest, SearchError> {
        let mut request = SearchRequest::new(&self.query);
        if let Some(title) = self.title {
            request.title = title;
        }
        request.user_id = self.user_id;
        request.providers = if self.providers.is_empty() {
            defaults.providers.default.clone()
        } else {
            self.providers
        };
        if let Some(filters) = self.filters {
            request.filters = filters;
        }
        request.dedup = self
            .dedup
            .unwrap_or_else(|| defaults.default_dedup_options());
        if let Some(max_results) = self.max_results {
            request.max_results = max_results;
        }

        request.validate()?;
        Ok(request)
    }
}

#[derive(Debug, Serialize)]
pub struct SearchOutcomeDto {
    pub request_id: Uuid,
    pub cache_hit: bool,
    pub duplicates_removed: u64,
    pub results: Vec<SearchResult>,
}

impl From<ProcessingResult> for SearchOutcomeDto {
    fn from(outcome: ProcessingResult) -> Self {
        Self {
            request_id: outcome.request_id,
            cache_hit: outcome.cache_hit,
            duplicates_removed: outcome.duplicates_removed,
            results: outcome.unique_results,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct QueuedDto {
    pub request_id: Uuid,
    /// False when the request was already queued or running.
    pub queued: bool,
}

#[derive(Debug, Serialize)]
pub struct RequestDetailDto {
    pub request: SearchRequest,
    pub results: Vec<SearchResult>,
    pub duplicates_removed: u64,
}

#[derive(Debug, Serialize)]
pub struct CleanupDto {
    pub cache_entries_removed: u64,
    pub requests_removed: u64,
}

#[derive(Debug, Serialize)]
pub struct HealthDto {
    pub status: &'static str,
    pub version: &'static str,
    pub uptime_seconds: u64,
}
