use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

use crate::models::{
    DuplicateRelationship, RequestStatus, SearchRequest, SearchResult,
};

pub mod migrator;
pub mod repositories;

pub use repositories::cache::CachedSearch;

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.starts_with(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn request_repo(&self) -> repositories::request::RequestRepository {
        repositories::request::RequestRepository::new(self.conn.clone())
    }

    fn result_repo(&self) -> repositories::result::ResultRepository {
        repositories::result::ResultRepository::new(self.conn.clone())
    }

    fn cache_repo(&self) -> repositories::cache::CacheRepository {
        repositories::cache::CacheRepository::new(self.conn.clone())
    }

    pub async fn create_request(&self, request: &SearchRequest) -> Result<()> {
        self.request_repo().create(request).await
    }

    pub async fn get_request(&self, id: Uuid) -> Result<Option<SearchRequest>> {
        self.request_repo().get(id).await
    }

    pub async fn list_requests_by_status(
        &self,
        status: RequestStatus,
    ) -> Result<Vec<SearchRequest>> {
        self.request_repo().list_by_status(status).await
    }

    pub async fn set_request_status(&self, id: Uuid, status: RequestStatus) -> Result<()> {
        self.request_repo().set_status(id, status).await
    }

    pub async fn mark_request_completed(&self, id: Uuid, result_count: i64) -> Result<()> {
        self.request_repo().mark_completed(id, result_count).await
    }

    pub async fn mark_request_error(&self, id: Uuid, message: &str) -> Result<()> {
        self.request_repo().mark_error(id, message).await
    }

    pub async fn delete_requests_older_than(&self, cutoff: &str) -> Result<u64> {
        self.request_repo().delete_older_than(cutoff).await
    }

    pub async fn insert_results(
        &self,
        results: &[SearchResult],
        relationships: &[DuplicateRelationship],
    ) -> Result<()> {
        self.result_repo().insert_batch(results, relationships).await
    }

    pub async fn get_unique_results(&self, request_id: Uuid) -> Result<Vec<SearchResult>> {
        self.result_repo().get_unique_for_request(request_id).await
    }

    pub async fn get_all_results(&self, request_id: Uuid) -> Result<Vec<SearchResult>> {
        self.result_repo().get_all_for_request(request_id).await
    }

    pub async fn get_duplicate_relationships(
        &self,
        request_id: Uuid,
    ) -> Result<Vec<DuplicateRelationship>> {
        self.result_repo()
            .get_relationships_for_request(request_id)
            .await
    }

    pub async fn get_cached_search(&self, fingerprint: &str) -> Result<Option<CachedSearch>> {
        self.cache_repo().get(fingerprint).await
    }

    pub async fn cache_search(
        &self,
        fingerprint: &str,
        results: &[SearchResult],
        duplicates_removed: i64,
        ttl_seconds: u64,
    ) -> Result<()> {
        self.cache_repo()
            .put(fingerprint, results, duplicates_removed, ttl_seconds)
            .await
    }

    pub async fn delete_cached_search(&self, fingerprint: &str) -> Result<bool> {
        self.cache_repo().delete(fingerprint).await
    }

    pub async fn delete_cache_created_before(&self, cutoff: &str) -> Result<u64> {
        self.cache_repo().delete_created_before(cutoff).await
    }

    pub async fn delete_expired_cache(&self) -> Result<u64> {
        self.cache_repo().delete_expired().await
    }
}
