use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use url::Url;

use crate::error::SearchError;
use crate::models::{RawResult, ResultKind, SearchFilters};

use super::{SearchProvider, query_with_filters};

pub const PROVIDER_NAME: &str = "searxng";

/// Adapter for a self-hosted SearxNG instance's JSON API.
#[derive(Clone)]
pub struct SearxngProvider {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct SearxngResponse {
    #[serde(default)]
    results: Vec<SearxngResult>,
}

#[derive(Debug, Deserialize)]
struct SearxngResult {
    #[serde(default)]
    title: String,
    url: String,
    #[serde(default)]
    content: String,
}

impl SearxngProvider {
    #[must_use]
    pub const fn new(client: Client, base_url: String) -> Self {
        Self { client, base_url }
    }

    fn search_url(&self, query: &str, filters: &SearchFilters) -> Result<Url, SearchError> {
        let mut url = Url::parse(&self.base_url)
            .and_then(|u| u.join("search"))
            .map_err(|e| SearchError::provider(PROVIDER_NAME, format!("bad base URL: {e}")))?;

        url.query_pairs_mut()
            .append_pair("q", &query_with_filters(query, filters))
            .append_pair("format", "json");

        Ok(url)
    }

    fn into_raw_results(response: SearxngResponse, max_results: u32) -> Vec<RawResult> {
        response
            .results
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
                    snippet: html_escape::decode_html_entities(&item.content).to_string(),
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
impl SearchProvider for SearxngProvider {
    fn name(&self) -> &'static str {
        PROVIDER_NAME
    }

    async fn fetch(
        &self,
        query: &str,
        filters: &SearchFilters,
        max_results: u32,
    ) -> Result<Vec<RawResult>, SearchError> {
        let url = self.search_url(query, filters)?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| SearchError::provider(PROVIDER_NAME, e))?;

        if !response.status().is_success() {
            return Err(SearchError::provider(
                PROVIDER_NAME,
                format!("HTTP {}", response.status()),
            ));
        }

        let body: SearxngResponse = response
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
    fn test_search_url_carries_query_and_format() {
        let provider = SearxngProvider::new(Client::new(), "http://localhost:8888/".to_string());
        let url = provider
            .search_url("rust async", &SearchFilters::default())
            .unwrap();
        assert!(url.as_str().starts_with("http://localhost:8888/search?"));
        assert!(url.as_str().contains("format=json"));
        assert!(url.as_str().contains("rust"));
    }

    #[test]
    fn test_response_mapping_ranks_and_decodes() {
        let body = r#"{
            "results": [
                {"title": "Rust &amp; Tokio", "url": "https://a.com/x", "content": "intro"},
                {"title": "Paper", "url": "https://b.com/paper.PDF", "content": ""}
            ]
        }"#;
        let parsed: SearxngResponse = serde_json::from_str(body).unwrap();
        let results = SearxngProvider::into_raw_results(parsed, 10);

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].title, "Rust & Tokio");
        assert_eq!(results[0].rank, 0);
        assert_eq!(results[1].rank, 1);
        assert_eq!(results[1].kind, ResultKind::Document);
    }

    #[test]
    fn test_max_results_truncates() {
        let body = r#"{"results": [
            {"title": "1", "url": "https://a.com/1", "content": ""},
            {"title": "2", "url": "https://a.com/2", "content": ""},
            {"title": "3", "url": "https://a.com/3", "content": ""}
        ]}"#;
        let parsed: SearxngResponse = serde_json::from_str(body).unwrap();
        assert_eq!(SearxngProvider::into_raw_results(parsed, 2).len(), 2);
    }

    #[test]
    fn test_empty_response_is_not_an_error() {
        let parsed: SearxngResponse = serde_json::from_str("{}").unwrap();
        assert!(SearxngProvider::into_raw_results(parsed, 10).is_empty());
    }
}
