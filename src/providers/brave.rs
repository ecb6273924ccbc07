use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use url::Url;

use crate::error::SearchError;
use crate::models::{RawResult, ResultKind, SearchFilters};

use super::{SearchProvider, query_with_filters};

pub const PROVIDER_NAME: &str = "brave";

/// Brave caps a single web-search page at 20 hits.
const PAGE_SIZE: u32 = 20;

/// Adapter for the Brave Search REST API.
#[derive(Clone)]
pub struct BraveProvider {
    client: Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct BraveResponse {
    #[serde(default)]
    web: Option<BraveWeb>,
}

#[derive(Debug, Deserialize)]
struct BraveWeb {
    #[serde(default)]
    results: Vec<BraveResult>,
}

#[derive(Debug, Deserialize)]
struct BraveResult {
    #[serde(default)]
    title: String,
    url: String,
    #[serde(default)]
    description: String,
}

impl BraveProvider {
    #[must_use]
    pub const fn new(client: Client, base_url: String, api_key: String) -> Self {
        Self {
            client,
            base_url,
            api_key,
        }
    }

    fn search_url(&self, query: &str, filters: &SearchFilters, count: u32) -> Result<Url, SearchError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| SearchError::provider(PROVIDER_NAME, format!("bad base URL: {e}")))?;

        url.query_pairs_mut()
            .append_pair("q", &query_with_filters(query, filters))
            .append_pair("count", &count.min(PAGE_SIZE).to_string());

        Ok(url)
    }

    fn into_raw_results(response: BraveResponse, max_results: u32) -> Vec<RawResult> {
        response
            .web
            .map(|w| w.results)
            .unwrap_or_default()
            .into_iter()
            .take(max_results as usize)
            .enumerate()
            .map(|(rank, item)| {
                let kind = if item.url.to_lowercase().ends_with(".pdf") {
                    ResultKind::Document
                } else {
                    ResultKind::Page
                };
                RawResult {
                    title: html_escape::decode_html_entities(&item.title).to_string(),
                    url: item.url,
                    snippet: html_escape::decode_html_entities(&item.description).to_string(),
                    provider: PROVIDER_NAME.to_string(),
                    #[allow(clippy::cast_possible_truncation)]
                    rank: rank as u32,
                    kind,
                }
            })
            .collect()
    }
}

#[async_trait]
impl SearchProvider for BraveProvider {
    fn name(&self) -> &'static str {
        PROVIDER_NAME
    }

    async fn fetch(
        &self,
        query: &str,
        filters: &SearchFilters,
        max_results: u32,
    ) -> Result<Vec<RawResult>, SearchError> {
        let url = self.search_url(query, filters, max_results)?;

        let response = self
            .client
            .get(url)
            .header("X-Subscription-Token", &self.api_key)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| SearchError::provider(PROVIDER_NAME, e))?;

        if !response.status().is_success() {
            return Err(SearchError::provider(
                PROVIDER_NAME,
                format!("HTTP {}", response.status()),
            ));
        }

        let body: BraveResponse = response
            .json()
            .await
            .map_err(|e| SearchError::provider(PROVIDER_NAME, e))?;

        Ok(Self::into_raw_results(body, max_results))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_url_clamps_count_to_page_size() {
        let provider = BraveProvider::new(
            Client::new(),
            "https://api.search.brave.com/res/v1/web/search".to_string(),
            "key".to_string(),
        );
        let url = provider
            .search_url("rust", &SearchFilters::default(), 100)
            .unwrap();
        assert!(url.as_str().contains("count=20"));
    }

    #[test]
    fn test_response_mapping() {
        let body = r#"{
            "web": {
                "results": [
                    {"title": "Tokio &ndash; async runtime", "url": "https://tokio.rs", "description": "Runtime"}
                ]
            }
        }"#;
        let parsed: BraveResponse = serde_json::from_str(body).unwrap();
        let results = BraveProvider::into_raw_results(parsed, 10);

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].provider, "brave");
        assert_eq!(results[0].title, "Tokio – async runtime");
    }

    #[test]
    fn test_missing_web_section_is_empty() {
        let parsed: BraveResponse = serde_json::from_str("{}").unwrap();
        assert!(BraveProvider::into_raw_results(parsed, 10).is_empty());
    }
}
