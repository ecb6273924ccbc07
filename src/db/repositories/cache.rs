use anyhow::Result;
use chrono::{Duration, Utc};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    sea_query::{Expr, OnConflict},
};

use crate::entities::{prelude::*, search_cache};
use crate::models::SearchResult;

/// A consolidated batch pulled from the durable cache tier.
#[derive(Debug, Clone)]
pub struct CachedSearch {
    pub fingerprint: String,
    pub results: Vec<SearchResult>,
    pub duplicates_removed: i64,
    pub hit_count: i64,
}

pub struct CacheRepository {
    conn: DatabaseConnection,
}

impl CacheRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Looks up a live entry and bumps its hit counter. Expired rows are
    /// swept opportunistically on the way in.
    pub async fn get(&self, fingerprint: &str) -> Result<Option<CachedSearch>> {
        let now = Utc::now().to_rfc3339();

        let _ = SearchCache::delete_many()
            .filter(search_cache::Column::ExpiresAt.lt(&now))
            .exec(&self.conn)
            .await;

        let entry = SearchCache::find()
            .filter(search_cache::Column::Fingerprint.eq(fingerprint))
            .filter(search_cache::Column::ExpiresAt.gt(&now))
            .one(&self.conn)
            .await?;

        let Some(entry) = entry else {
            return Ok(None);
        };

        SearchCache::update_many()
            .col_expr(
                search_cache::Column::HitCount,
                Expr::col(search_cache::Column::HitCount).add(1),
            )
            .filter(search_cache::Column::Fingerprint.eq(fingerprint))
            .exec(&self.conn)
            .await?;

        let results: Vec<SearchResult> = serde_json::from_str(&entry.results_json)?;
        Ok(Some(CachedSearch {
            fingerprint: entry.fingerprint,
            results,
            duplicates_removed: entry.duplicates_removed,
            hit_count: entry.hit_count + 1,
        }))
    }

    /// Replaces any entry for this fingerprint wholesale. The hit counter
    /// restarts because the stored batch is new.
    pub async fn put(
        &self,
        fingerprint: &str,
        results: &[SearchResult],
        duplicates_removed: i64,
        ttl_seconds: u64,
    ) -> Result<()> {
        let results_json = serde_json::to_string(results)?;
        let now = Utc::now();
        #[allow(clippy::cast_possible_wrap)]
        let expires_at = (now + Duration::seconds(ttl_seconds as i64)).to_rfc3339();

        let active_model = search_cache::ActiveModel {
            fingerprint: Set(fingerprint.to_string()),
            results_json: Set(results_json),
            duplicates_removed: Set(duplicates_removed),
            hit_count: Set(0),
            created_at: Set(now.to_rfc3339()),
            expires_at: Set(expires_at),
        };

        SearchCache::insert(active_model)
            .on_conflict(
                OnConflict::column(search_cache::Column::Fingerprint)
                    .update_columns([
                        search_cache::Column::ResultsJson,
                        search_cache::Column::DuplicatesRemoved,
                        search_cache::Column::HitCount,
                        search_cache::Column::CreatedAt,
                        search_cache::Column::ExpiresAt,
                    ])
                    .to_owned(),
            )
            .exec(&self.conn)
            .await?;

        Ok(())
    }

    pub async fn delete(&self, fingerprint: &str) -> Result<bool> {
        let outcome = SearchCache::delete_many()
            .filter(search_cache::Column::Fingerprint.eq(fingerprint))
            .exec(&self.conn)
            .await?;
        Ok(outcome.rows_affected > 0)
    }

    /// Removes entries created before the cutoff, returning how many went.
    pub async fn delete_created_before(&self, cutoff: &str) -> Result<u64> {
        let outcome = SearchCache::delete_many()
            .filter(search_cache::Column::CreatedAt.lt(cutoff))
            .exec(&self.conn)
            .await?;
        Ok(outcome.rows_affected)
    }

    pub async fn delete_expired(&self) -> Result<u64> {
        let now = Utc::now().to_rfc3339();
        let outcome = SearchCache::delete_many()
            .filter(search_cache::Column::ExpiresAt.lt(&now))
            .exec(&self.conn)
            .await?;
        Ok(outcome.rows_affected)
    }
}
