use std::sync::Arc;
use tokio::sync::RwLock;

use crate::background::BackgroundProcessor;
use crate::cache::SearchCache;
use crate::config::Config;
use crate::db::Store;
use crate::executor::Executor;
use crate::processor::ResultsProcessor;

/// Build a shared HTTP client with reasonable defaults for provider calls.
/// One client is reused across all providers to enable connection pooling
/// and avoid socket exhaustion.
fn build_shared_http_client(timeout_seconds: u64) -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_seconds))
        .user_agent("Fetcharr/1.0")
        .pool_max_idle_per_host(10)
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to build shared HTTP client: {e}"))
}

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<RwLock<Config>>,

    pub store: Store,

    pub cache: SearchCache,

    pub executor: Executor,

    pub processor: ResultsProcessor,

    pub background: Arc<BackgroundProcessor>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        let http_client = build_shared_http_client(config.executor.provider_timeout_seconds)?;

        let cache = SearchCache::new(store.clone(), config.cache.ttl_seconds);
        let executor = Executor::new(
            config.executor.clone(),
            config.providers.clone(),
            http_client,
        );
        let processor = ResultsProcessor::new(store.clone(), cache.clone());
        let background = Arc::new(BackgroundProcessor::new(
            executor.clone(),
            processor.clone(),
            store.clone(),
            config.processing.workers,
            config.processing.queue_capacity,
        ));

        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            store,
            cache,
            executor,
            processor,
            background,
        })
    }

    pub async fn config(&self) -> Config {
        self.config.read().await.clone()
    }

    /// Finishes in-flight background jobs and stops the workers.
    pub async fn shutdown(&self) {
        self.background.shutdown().await;
    }
}
