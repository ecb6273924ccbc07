//! Consolidation pipeline for one executed request.
//!
//! Runs fingerprint lookup, deduplication, persistence, and cache population
//! in that order. A cache hit short-circuits everything after the lookup. A
//! persistence failure marks the request `error` but still hands the caller
//! the consolidated batch; the cache is only populated from a persisted
//! batch, so a later identical request repeats the work instead of trusting
//! rows that never landed.

use tracing::{debug, warn};
use uuid::Uuid;

use crate::cache::SearchCache;
use crate::db::Store;
use crate::dedup::Deduplicator;
use crate::error::SearchError;
use crate::fingerprint::fingerprint;
use crate::models::{ProcessingResult, RawResult, RequestStatus, SearchRequest, SearchResult};

#[derive(Clone)]
pub struct ResultsProcessor {
    store: Store,
    cache: SearchCache,
}

impl ResultsProcessor {
    #[must_use]
    pub const fn new(store: Store, cache: SearchCache) -> Self {
        Self { store, cache }
    }

    pub async fn process(
        &self,
        raw_results: Vec<RawResult>,
        request: &SearchRequest,
    ) -> Result<ProcessingResult, SearchError> {
        let started = std::time::Instant::now();
        self.transition(request.id, RequestStatus::Processing).await;

        let fp = fingerprint(&request.query, &request.filters, &request.providers);

        match self.cache.get(&fp).await {
            Ok(Some(hit)) => {
                debug!(request_id = %request.id, fingerprint = %fp, "serving from cache");
                #[allow(clippy::cast_possible_wrap)]
                let count = hit.results.len() as i64;
                if let Err(e) = self.store.mark_request_completed(request.id, count).await {
                    warn!(request_id = %request.id, error = %e, "failed to mark request completed");
                }
                metrics::counter!("fetcharr_requests_processed_total").increment(1);
                metrics::histogram!("fetcharr_processing_duration_seconds")
                    .record(started.elapsed().as_secs_f64());
                #[allow(clippy::cast_sign_loss)]
                return Ok(ProcessingResult {
                    request_id: request.id,
                    unique_results: hit.results,
                    duplicates_removed: hit.duplicates_removed as u64,
                    cache_hit: true,
                });
            }
            Ok(None) => {}
            // A broken cache degrades to a full pipeline run.
            Err(e) => warn!(request_id = %request.id, error = %e, "cache lookup failed"),
        }

        let bound: Vec<SearchResult> = raw_results
            .into_iter()
            .map(|raw| SearchResult::from_raw(raw, request.id))
            .collect();

        let outcome = Deduplicator::new().dedupe(bound, &request.dedup);
        let duplicates_removed = outcome.duplicates.len() as u64;
        metrics::counter!("fetcharr_duplicates_removed_total").increment(duplicates_removed);

        #[allow(clippy::cast_possible_wrap)]
        let unique_count = outcome.unique.len() as i64;

        let mut rows = outcome.unique.clone();
        rows.extend(outcome.duplicates);

        let persisted = match self
            .store
            .insert_results(&rows, &outcome.relationships)
            .await
        {
            Ok(()) => {
                if let Err(e) = self
                    .store
                    .mark_request_completed(request.id, unique_count)
                    .await
                {
                    warn!(request_id = %request.id, error = %e, "failed to mark request completed");
                }
                true
            }
            Err(e) => {
                warn!(request_id = %request.id, error = %e, "failed to persist results");
                if let Err(e) = self
                    .store
                    .mark_request_error(request.id, &e.to_string())
                    .await
                {
                    warn!(request_id = %request.id, error = %e, "failed to mark request errored");
                }
                false
            }
        };

        if persisted {
            #[allow(clippy::cast_possible_wrap)]
            if let Err(e) = self
                .cache
                .put(&fp, &outcome.unique, duplicates_removed as i64)
                .await
            {
                warn!(request_id = %request.id, error = %e, "failed to populate cache");
            }
        }

        metrics::counter!("fetcharr_requests_processed_total").increment(1);
        metrics::histogram!("fetcharr_processing_duration_seconds")
            .record(started.elapsed().as_secs_f64());

        Ok(ProcessingResult {
            request_id: request.id,
            unique_results: outcome.unique,
            duplicates_removed,
            cache_hit: false,
        })
    }

    async fn transition(&self, id: Uuid, status: RequestStatus) {
        if let Err(e) = self.store.set_request_status(id, status).await {
            warn!(request_id = %id, error = %e, "failed to update request status");
        }
    }
}
