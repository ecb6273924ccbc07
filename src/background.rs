//! Queued execution of search requests.
//!
//! Requests accepted through the queue endpoint land on a bounded channel
//! drained by a small worker pool. The default pool size is 1, which keeps
//! processing order identical to arrival order. Workers share one receiver
//! behind a mutex; a watch channel tells them to finish the job in hand and
//! exit on shutdown. Failed jobs stay failed, there is no automatic retry.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{Mutex, RwLock, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::db::Store;
use crate::error::SearchError;
use crate::executor::Executor;
use crate::models::{ProcessingResult, SearchRequest};
use crate::processor::ResultsProcessor;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Queued,
    Running,
    Done,
    Failed,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct QueueSummary {
    pub queued: usize,
    pub running: usize,
    pub done: usize,
    pub failed: usize,
}

#[derive(Clone)]
pub struct BackgroundProcessor {
    executor: Executor,
    processor: ResultsProcessor,
    store: Store,
    tx: mpsc::Sender<SearchRequest>,
    // Also kept here so the channel stays open after the workers exit;
    // jobs queued after shutdown simply wait in the channel.
    rx: Arc<Mutex<mpsc::Receiver<SearchRequest>>>,
    statuses: Arc<RwLock<HashMap<Uuid, JobState>>>,
    shutdown_tx: watch::Sender<bool>,
    workers: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl BackgroundProcessor {
    #[must_use]
    pub fn new(
        executor: Executor,
        processor: ResultsProcessor,
        store: Store,
        worker_count: usize,
        queue_capacity: usize,
    ) -> Self {
        let (tx, rx) = mpsc::channel::<SearchRequest>(queue_capacity.max(1));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let this = Self {
            executor,
            processor,
            store,
            tx,
            rx: Arc::new(Mutex::new(rx)),
            statuses: Arc::new(RwLock::new(HashMap::new())),
            shutdown_tx,
            workers: Arc::new(Mutex::new(Vec::new())),
        };

        let handles: Vec<JoinHandle<()>> = (0..worker_count.max(1))
            .map(|worker_id| {
                let this = this.clone();
                let rx = Arc::clone(&this.rx);
                let shutdown_rx = shutdown_rx.clone();
                tokio::spawn(async move {
                    this.worker_loop(worker_id, rx, shutdown_rx).await;
                })
            })
            .collect();

        if let Ok(mut workers) = this.workers.try_lock() {
            *workers = handles;
        }

        this
    }

    /// Enqueues a request unless it is already queued or running. Returns
    /// whether a new job was actually added.
    pub async fn queue_for_processing(&self, request: SearchRequest) -> Result<bool, SearchError> {
        // Check and insert under one write lock so concurrent callers for
        // the same id cannot both pass the check and double-enqueue.
        {
            let mut statuses = self.statuses.write().await;
            if matches!(
                statuses.get(&request.id),
                Some(JobState::Queued | JobState::Running)
            ) {
                return Ok(false);
            }
            statuses.insert(request.id, JobState::Queued);
        }

        let id = request.id;
        if let Err(e) = self.tx.try_send(request) {
            self.statuses.write().await.remove(&id);
            metrics::counter!("fetcharr_queue_rejections_total").increment(1);
            let reason = match e {
                mpsc::error::TrySendError::Full(_) => "background queue is full",
                mpsc::error::TrySendError::Closed(_) => "background queue is closed",
            };
            return Err(SearchError::ExecutionFailed {
                attempts: 0,
                reason: reason.to_string(),
            });
        }

        metrics::gauge!("fetcharr_queue_depth").increment(1.0);
        Ok(true)
    }

    /// Runs the full pipeline inline, bypassing the queue. The status table
    /// is still updated so `get_status` sees ad-hoc runs too.
    pub async fn process_immediately(
        &self,
        request: &SearchRequest,
    ) -> Result<ProcessingResult, SearchError> {
        self.statuses
            .write()
            .await
            .insert(request.id, JobState::Running);

        let outcome = self.run_pipeline(request).await;

        let state = if outcome.is_ok() {
            JobState::Done
        } else {
            JobState::Failed
        };
        self.statuses.write().await.insert(request.id, state);

        outcome
    }

    pub async fn get_status(&self, id: Uuid) -> Option<JobState> {
        self.statuses.read().await.get(&id).cloned()
    }

    pub async fn status_summary(&self) -> QueueSummary {
        let statuses = self.statuses.read().await;
        let mut summary = QueueSummary::default();
        for state in statuses.values() {
            match state {
                JobState::Queued => summary.queued += 1,
                JobState::Running => summary.running += 1,
                JobState::Done => summary.done += 1,
                JobState::Failed => summary.failed += 1,
            }
        }
        summary
    }

    /// Signals workers to stop and waits for them to drain out. Jobs still
    /// queued are dropped; jobs in flight run to completion.
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
        let mut workers = self.workers.lock().await;
        for handle in workers.drain(..) {
            if let Err(e) = handle.await {
                warn!(error = %e, "background worker panicked");
            }
        }
        info!("Background workers stopped");
    }

    async fn worker_loop(
        &self,
        worker_id: usize,
        rx: Arc<Mutex<mpsc::Receiver<SearchRequest>>>,
        mut shutdown_rx: watch::Receiver<bool>,
    ) {
        loop {
            let job = {
                let mut rx = rx.lock().await;
                tokio::select! {
                    job = rx.recv() => job,
                    _ = shutdown_rx.changed() => None,
                }
            };

            let Some(request) = job else {
                info!(worker_id, "background worker exiting");
                break;
            };

            metrics::gauge!("fetcharr_queue_depth").decrement(1.0);
            self.statuses
                .write()
                .await
                .insert(request.id, JobState::Running);

            match self.run_pipeline(&request).await {
                Ok(outcome) => {
                    info!(
                        worker_id,
                        request_id = %request.id,
                        unique = outcome.unique_results.len(),
                        duplicates = outcome.duplicates_removed,
                        cache_hit = outcome.cache_hit,
                        "request processed"
                    );
                    self.statuses
                        .write()
                        .await
                        .insert(request.id, JobState::Done);
                }
                Err(e) => {
                    error!(worker_id, request_id = %request.id, error = %e, "request failed");
                    self.statuses
                        .write()
                        .await
                        .insert(request.id, JobState::Failed);
                }
            }
        }
    }

    async fn run_pipeline(&self, request: &SearchRequest) -> Result<ProcessingResult, SearchError> {
        match self.executor.execute(request).await {
            Ok(raws) => self.processor.process(raws, request).await,
            Err(e) => {
                // Processor never ran, so the terminal status is set here.
                if let Err(mark_err) = self
                    .store
                    .mark_request_error(request.id, &e.to_string())
                    .await
                {
                    warn!(request_id = %request.id, error = %mark_err, "failed to mark request errored");
                }
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::SearchCache;
    use crate::config::{ExecutorConfig, ProvidersConfig};

    async fn temp_store() -> Store {
        let path = std::env::temp_dir().join(format!("fetcharr-bg-{}.db", Uuid::new_v4()));
        Store::new(&format!("sqlite:{}", path.display()))
            .await
            .unwrap()
    }

    fn background(store: &Store, capacity: usize) -> BackgroundProcessor {
        let cache = SearchCache::new(store.clone(), 3600);
        let processor = ResultsProcessor::new(store.clone(), cache);
        let executor = Executor::new(
            ExecutorConfig::default(),
            ProvidersConfig::default(),
            reqwest::Client::new(),
        );
        BackgroundProcessor::new(executor, processor, store.clone(), 1, capacity)
    }

    #[tokio::test]
    async fn test_queueing_is_idempotent() {
        let store = temp_store().await;
        let bg = background(&store, 8);

        // Stop the workers first so the job stays queued and the second
        // attempt deterministically sees it pending.
        bg.shutdown().await;

        let request = SearchRequest::new("anything").with_providers(vec!["nope".to_string()]);

        let first = bg.queue_for_processing(request.clone()).await.unwrap();
        let second = bg.queue_for_processing(request.clone()).await.unwrap();
        assert!(first);
        assert!(!second);
        assert_eq!(bg.get_status(request.id).await, Some(JobState::Queued));
    }

    #[tokio::test]
    async fn test_concurrent_enqueue_adds_exactly_once() {
        let store = temp_store().await;
        let bg = background(&store, 32);

        // No workers, so none of the attempts can slip into Running.
        bg.shutdown().await;

        let request = SearchRequest::new("anything").with_providers(vec!["nope".to_string()]);

        let mut handles = Vec::new();
        for _ in 0..16 {
            let bg = bg.clone();
            let request = request.clone();
            handles.push(tokio::spawn(async move {
                bg.queue_for_processing(request).await.unwrap()
            }));
        }

        let mut added = 0;
        for handle in handles {
            if handle.await.unwrap() {
                added += 1;
            }
        }
        assert_eq!(added, 1);
        assert_eq!(bg.get_status(request.id).await, Some(JobState::Queued));
    }

    #[tokio::test]
    async fn test_failed_job_reaches_failed_state() {
        let store = temp_store().await;
        let bg = background(&store, 8);

        let request = SearchRequest::new("anything").with_providers(vec!["nope".to_string()]);
        store.create_request(&request).await.unwrap();

        bg.queue_for_processing(request.clone()).await.unwrap();

        // Poll until the single worker settles the job.
        for _ in 0..100 {
            if matches!(bg.get_status(request.id).await, Some(JobState::Failed)) {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert_eq!(bg.get_status(request.id).await, Some(JobState::Failed));

        let stored = store.get_request(request.id).await.unwrap().unwrap();
        assert_eq!(stored.status, crate::models::RequestStatus::Error);
        assert!(stored.error_message.is_some());

        let summary = bg.status_summary().await;
        assert_eq!(summary.failed, 1);

        bg.shutdown().await;
    }

    #[tokio::test]
    async fn test_full_queue_rejects() {
        let store = temp_store().await;
        let bg = background(&store, 1);

        // With no workers draining, the single slot fills immediately.
        bg.shutdown().await;

        let first = SearchRequest::new("anything").with_providers(vec!["nope".to_string()]);
        let second = SearchRequest::new("anything").with_providers(vec!["nope".to_string()]);

        assert!(bg.queue_for_processing(first).await.unwrap());
        let err = bg.queue_for_processing(second).await.unwrap_err();
        assert!(matches!(err, SearchError::ExecutionFailed { attempts: 0, .. }));
    }
}
