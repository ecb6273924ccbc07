//! Provider fan-out for a single query.
//!
//! All configured providers are queried concurrently under one overall
//! deadline, with a shorter per-provider timeout so one slow provider cannot
//! starve the others out of contributing. Individual provider failures are
//! absorbed and logged; only the all-failed and deadline-elapsed cases are
//! fatal. On an overall timeout the partial results gathered so far are
//! discarded, never committed.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tracing::{debug, warn};

use crate::config::{ExecutorConfig, ProvidersConfig};
use crate::error::SearchError;
use crate::models::{RawResult, SearchRequest};
use crate::providers::{SearchProvider, build_providers};

#[derive(Clone)]
pub struct Executor {
    config: ExecutorConfig,
    providers_config: ProvidersConfig,
    client: reqwest::Client,
}

impl Executor {
    #[must_use]
    pub const fn new(
        config: ExecutorConfig,
        providers_config: ProvidersConfig,
        client: reqwest::Client,
    ) -> Self {
        Self {
            config,
            providers_config,
            client,
        }
    }

    /// Runs the request against its provider set under the configured
    /// overall timeout.
    pub async fn execute(&self, request: &SearchRequest) -> Result<Vec<RawResult>, SearchError> {
        self.execute_with_timeout(
            request,
            Duration::from_secs(self.config.overall_timeout_seconds),
        )
        .await
    }

    /// Same as [`execute`](Self::execute) with a caller-supplied deadline.
    pub async fn execute_with_timeout(
        &self,
        request: &SearchRequest,
        overall_timeout: Duration,
    ) -> Result<Vec<RawResult>, SearchError> {
        let providers = build_providers(&self.providers_config, &self.client, &request.providers)?;
        self.fan_out(&providers, request, overall_timeout).await
    }

    /// Fan-out core, callable with an explicit provider set.
    pub async fn fan_out(
        &self,
        providers: &[Arc<dyn SearchProvider>],
        request: &SearchRequest,
        overall_timeout: Duration,
    ) -> Result<Vec<RawResult>, SearchError> {
        let attempts = providers.len();
        let per_provider = Duration::from_secs(self.config.provider_timeout_seconds);

        let calls = providers.iter().map(|provider| {
            let provider = Arc::clone(provider);
            let query = request.query.clone();
            let filters = request.filters.clone();
            let max_results = request.max_results;
            async move {
                let name = provider.name();
                match tokio::time::timeout(
                    per_provider,
                    provider.fetch(&query, &filters, max_results),
                )
                .await
                {
                    Ok(Ok(results)) => Ok(results),
                    Ok(Err(e)) => Err(e),
                    Err(_) => Err(SearchError::provider(name, "provider timeout elapsed")),
                }
            }
        });

        let joined = tokio::time::timeout(overall_timeout, join_all(calls))
            .await
            .map_err(|_| SearchError::ExecutionFailed {
                attempts,
                reason: "overall timeout elapsed".to_string(),
            })?;

        let mut merged = Vec::new();
        let mut failures = 0usize;

        // Concatenate in provider-configuration order; each item keeps its
        // provider-local rank. Cross-provider re-ranking is not done here.
        for (provider, outcome) in providers.iter().zip(joined) {
            match outcome {
                Ok(results) => {
                    debug!(
                        provider = provider.name(),
                        count = results.len(),
                        "provider responded"
                    );
                    merged.extend(results);
                }
                Err(e) => {
                    failures += 1;
                    metrics::counter!("fetcharr_provider_failures_total").increment(1);
                    warn!(provider = provider.name(), error = %e, "provider failed");
                }
            }
        }

        if failures == attempts {
            return Err(SearchError::ExecutionFailed {
                attempts,
                reason: "all configured providers failed".to_string(),
            });
        }

        Ok(merged)
    }
}
