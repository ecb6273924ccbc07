//! Two-tier cache for consolidated search batches.
//!
//! The memory tier answers repeat fingerprints within one process without
//! touching sqlite; the durable tier survives restarts. Reads fall through
//! memory to the durable tier and repopulate memory on a hit. Writes go to
//! both tiers, replacing any previous entry for the fingerprint wholesale.
//! Expiry is lazy: an entry past its TTL is treated as absent and evicted
//! when a lookup trips over it.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;
use tracing::debug;

use crate::db::Store;
use crate::models::SearchResult;

/// A live cached batch, whichever tier served it.
#[derive(Debug, Clone)]
pub struct CacheHit {
    pub results: Vec<SearchResult>,
    pub duplicates_removed: i64,
}

#[derive(Debug, Clone)]
struct MemoryEntry {
    results: Vec<SearchResult>,
    duplicates_removed: i64,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct SearchCache {
    store: Store,
    ttl_seconds: u64,
    memory: Arc<RwLock<HashMap<String, MemoryEntry>>>,
}

impl SearchCache {
    #[must_use]
    pub fn new(store: Store, ttl_seconds: u64) -> Self {
        Self {
            store,
            ttl_seconds,
            memory: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn get(&self, fingerprint: &str) -> Result<Option<CacheHit>> {
        let now = Utc::now();

        {
            let memory = self.memory.read().await;
            if let Some(entry) = memory.get(fingerprint) {
                if entry.expires_at > now {
                    metrics::counter!("fetcharr_cache_hits_total", "tier" => "memory")
                        .increment(1);
                    return Ok(Some(CacheHit {
                        results: entry.results.clone(),
                        duplicates_removed: entry.duplicates_removed,
                    }));
                }
            }
        }

        // Expired or absent in memory; evict before consulting sqlite so a
        // stale entry cannot be served by a later racing read.
        self.memory.write().await.remove(fingerprint);

        let Some(cached) = self.store.get_cached_search(fingerprint).await? else {
            metrics::counter!("fetcharr_cache_misses_total").increment(1);
            return Ok(None);
        };

        metrics::counter!("fetcharr_cache_hits_total", "tier" => "durable").increment(1);
        debug!(fingerprint, hits = cached.hit_count, "durable cache hit");

        self.remember(
            fingerprint,
            cached.results.clone(),
            cached.duplicates_removed,
        )
        .await;

        Ok(Some(CacheHit {
            results: cached.results,
            duplicates_removed: cached.duplicates_removed,
        }))
    }

    pub async fn put(
        &self,
        fingerprint: &str,
        results: &[SearchResult],
        duplicates_removed: i64,
    ) -> Result<()> {
        self.store
            .cache_search(fingerprint, results, duplicates_removed, self.ttl_seconds)
            .await?;
        self.remember(fingerprint, results.to_vec(), duplicates_removed)
            .await;
        Ok(())
    }

    pub async fn invalidate(&self, fingerprint: &str) -> Result<bool> {
        self.memory.write().await.remove(fingerprint);
        self.store.delete_cached_search(fingerprint).await
    }

    /// Drops entries older than `max_age_seconds` from both tiers, plus any
    /// already expired, returning how many durable rows went.
    pub async fn cleanup(&self, max_age_seconds: u64) -> Result<u64> {
        #[allow(clippy::cast_possible_wrap)]
        let cutoff = Utc::now() - Duration::seconds(max_age_seconds as i64);

        {
            let mut memory = self.memory.write().await;
            let now = Utc::now();
            memory.retain(|_, entry| entry.created_at >= cutoff && entry.expires_at > now);
        }

        let mut removed = self
            .store
            .delete_cache_created_before(&cutoff.to_rfc3339())
            .await?;
        removed += self.store.delete_expired_cache().await?;

        Ok(removed)
    }

    async fn remember(&self, fingerprint: &str, results: Vec<SearchResult>, duplicates: i64) {
        let now = Utc::now();
        #[allow(clippy::cast_possible_wrap)]
        let entry = MemoryEntry {
            results,
            duplicates_removed: duplicates,
            created_at: now,
            expires_at: now + Duration::seconds(self.ttl_seconds as i64),
        };
        self.memory
            .write()
            .await
            .insert(fingerprint.to_string(), entry);
    }
}
