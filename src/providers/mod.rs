//! External search-engine adapters.
//!
//! Each adapter translates one provider's authentication, pagination, and
//! response schema into the shared [`RawResult`] shape. Network failures and
//! non-success statuses surface as [`SearchError::Provider`]; an empty result
//! set is a valid, non-error outcome.

pub mod brave;
pub mod searxng;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::ProvidersConfig;
use crate::error::SearchError;
use crate::models::{RawResult, SearchFilters};

pub use brave::BraveProvider;
pub use searxng::SearxngProvider;

#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Stable identifier used in configuration, fingerprints, and results.
    fn name(&self) -> &'static str;

    /// Fetches up to `max_results` hits for the query. Ordered, finite.
    async fn fetch(
        &self,
        query: &str,
        filters: &SearchFilters,
        max_results: u32,
    ) -> Result<Vec<RawResult>, SearchError>;
}

/// Resolves provider identifiers to adapters.
///
/// An empty `requested` set falls back to the configured default list.
/// Unknown identifiers are a validation failure, caught before any network
/// work.
pub fn build_providers(
    config: &ProvidersConfig,
    client: &reqwest::Client,
    requested: &[String],
) -> Result<Vec<Arc<dyn SearchProvider>>, SearchError> {
    let names: &[String] = if requested.is_empty() {
        &config.default
    } else {
        requested
    };

    if names.is_empty() {
        return Err(SearchError::validation("no search providers configured"));
    }

    let mut providers: Vec<Arc<dyn SearchProvider>> = Vec::with_capacity(names.len());
    for name in names {
        match name.to_lowercase().as_str() {
            searxng::PROVIDER_NAME => providers.push(Arc::new(SearxngProvider::new(
                client.clone(),
                config.searxng.base_url.clone(),
            ))),
            brave::PROVIDER_NAME => providers.push(Arc::new(BraveProvider::new(
                client.clone(),
                config.brave.base_url.clone(),
                config.brave.api_key.clone(),
            ))),
            other => {
                return Err(SearchError::validation(format!(
                    "unknown search provider '{other}'"
                )));
            }
        }
    }

    Ok(providers)
}

/// Applies the shared filter conventions to a query string: `site:` for a
/// trusted domain, `filetype:` per requested type.
#[must_use]
pub fn query_with_filters(query: &str, filters: &SearchFilters) -> String {
    if filters.is_empty() {
        return query.to_string();
    }

    let mut parts = vec![query.to_string()];

    if let Some(domain) = &filters.trusted_domain {
        parts.push(format!("site:{domain}"));
    }

    for file_type in &filters.file_types {
        parts.push(format!("filetype:{file_type}"));
    }

    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProvidersConfig;

    #[test]
    fn test_build_default_providers() {
        let config = ProvidersConfig::default();
        let client = reqwest::Client::new();
        let providers = build_providers(&config, &client, &[]).unwrap();
        assert_eq!(providers.len(), 1);
        assert_eq!(providers[0].name(), "searxng");
    }

    #[test]
    fn test_build_requested_set_in_order() {
        let config = ProvidersConfig::default();
        let client = reqwest::Client::new();
        let requested = vec!["brave".to_string(), "searxng".to_string()];
        let providers = build_providers(&config, &client, &requested).unwrap();
        assert_eq!(providers.len(), 2);
        assert_eq!(providers[0].name(), "brave");
        assert_eq!(providers[1].name(), "searxng");
    }

    #[test]
    fn test_unknown_provider_rejected() {
        let config = ProvidersConfig::default();
        let client = reqwest::Client::new();
        let requested = vec!["altavista".to_string()];
        assert!(matches!(
            build_providers(&config, &client, &requested),
            Err(SearchError::Validation(_))
        ));
    }

    #[test]
    fn test_query_with_filters() {
        let filters = SearchFilters {
            file_types: vec!["pdf".to_string()],
            trusted_domain: Some("nih.gov".to_string()),
            provider_hints: Vec::new(),
        };
        assert_eq!(
            query_with_filters("diabetes treatment", &filters),
            "diabetes treatment site:nih.gov filetype:pdf"
        );
    }
}
