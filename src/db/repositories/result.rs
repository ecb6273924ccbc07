use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set};
use uuid::Uuid;

use crate::entities::{duplicate_relationships, prelude::*, search_results};
use crate::models::{DuplicateMethod, DuplicateRelationship, ResultKind, SearchResult};

pub struct ResultRepository {
    conn: DatabaseConnection,
}

impl ResultRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Persists the full outcome of one request, uniques and duplicates alike.
    /// Duplicate rows carry `duplicate_of`; relationship rows record how each
    /// duplicate was detected.
    pub async fn insert_batch(
        &self,
        results: &[SearchResult],
        relationships: &[DuplicateRelationship],
    ) -> Result<()> {
        if !results.is_empty() {
            let rows: Vec<search_results::ActiveModel> = results
                .iter()
                .map(|r| search_results::ActiveModel {
                    id: Set(r.id.to_string()),
                    request_id: Set(r.request_id.to_string()),
                    title: Set(r.title.clone()),
                    url: Set(r.url.clone()),
                    snippet: Set(r.snippet.clone()),
                    provider: Set(r.provider.clone()),
                    #[allow(clippy::cast_possible_wrap)]
                    rank: Set(r.rank as i32),
                    kind: Set(r.kind.as_str().to_string()),
                    duplicate_of: Set(r.duplicate_of.map(|id| id.to_string())),
                    captured_at: Set(r.captured_at.to_rfc3339()),
                })
                .collect();

            SearchResults::insert_many(rows).exec(&self.conn).await?;
        }

        if !relationships.is_empty() {
            let now = Utc::now().to_rfc3339();
            let rows: Vec<duplicate_relationships::ActiveModel> = relationships
                .iter()
                .map(|rel| duplicate_relationships::ActiveModel {
                    result_id: Set(rel.result_id.to_string()),
                    duplicate_of: Set(rel.duplicate_of.to_string()),
                    request_id: Set(rel.request_id.to_string()),
                    similarity: Set(rel.similarity),
                    method: Set(rel.method.as_str().to_string()),
                    created_at: Set(now.clone()),
                })
                .collect();

            DuplicateRelationships::insert_many(rows)
                .exec(&self.conn)
                .await?;
        }

        Ok(())
    }

    pub async fn get_unique_for_request(&self, request_id: Uuid) -> Result<Vec<SearchResult>> {
        let rows = SearchResults::find()
            .filter(search_results::Column::RequestId.eq(request_id.to_string()))
            .filter(search_results::Column::DuplicateOf.is_null())
            .order_by_asc(search_results::Column::Rank)
            .all(&self.conn)
            .await?;

        rows.into_iter().map(from_row).collect()
    }

    pub async fn get_all_for_request(&self, request_id: Uuid) -> Result<Vec<SearchResult>> {
        let rows = SearchResults::find()
            .filter(search_results::Column::RequestId.eq(request_id.to_string()))
            .order_by_asc(search_results::Column::Rank)
            .all(&self.conn)
            .await?;

        rows.into_iter().map(from_row).collect()
    }

    pub async fn get_relationships_for_request(
        &self,
        request_id: Uuid,
    ) -> Result<Vec<DuplicateRelationship>> {
        let rows = DuplicateRelationships::find()
            .filter(duplicate_relationships::Column::RequestId.eq(request_id.to_string()))
            .all(&self.conn)
            .await?;

        rows.into_iter()
            .map(|row| {
                Ok(DuplicateRelationship {
                    result_id: Uuid::parse_str(&row.result_id)?,
                    duplicate_of: Uuid::parse_str(&row.duplicate_of)?,
                    request_id: Uuid::parse_str(&row.request_id)?,
                    similarity: row.similarity,
                    method: DuplicateMethod::parse(&row.method)
                        .with_context(|| format!("unknown duplicate method: {}", row.method))?,
                })
            })
            .collect()
    }
}

fn from_row(row: search_results::Model) -> Result<SearchResult> {
    Ok(SearchResult {
        id: Uuid::parse_str(&row.id)?,
        request_id: Uuid::parse_str(&row.request_id)?,
        title: row.title,
        url: row.url,
        snippet: row.snippet,
        provider: row.provider,
        #[allow(clippy::cast_sign_loss)]
        rank: row.rank as u32,
        kind: ResultKind::parse(&row.kind)
            .with_context(|| format!("unknown result kind: {}", row.kind))?,
        duplicate_of: row
            .duplicate_of
            .as_deref()
            .map(Uuid::parse_str)
            .transpose()?,
        captured_at: DateTime::parse_from_rfc3339(&row.captured_at)?.with_timezone(&Utc),
    })
}
