use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set};
use uuid::Uuid;

use crate::entities::{prelude::*, search_requests};
use crate::models::{DeduplicationOptions, RequestStatus, SearchFilters, SearchRequest};

pub struct RequestRepository {
    conn: DatabaseConnection,
}

impl RequestRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn create(&self, request: &SearchRequest) -> Result<()> {
        let active_model = search_requests::ActiveModel {
            id: Set(request.id.to_string()),
            user_id: Set(request.user_id.clone()),
            query: Set(request.query.clone()),
            title: Set(request.title.clone()),
            filters_json: Set(serde_json::to_string(&request.filters)?),
            providers_json: Set(serde_json::to_string(&request.providers)?),
            dedup_json: Set(serde_json::to_string(&request.dedup)?),
            #[allow(clippy::cast_possible_wrap)]
            max_results: Set(request.max_results as i32),
            status: Set(request.status.as_str().to_string()),
            result_count: Set(request.result_count),
            error_message: Set(request.error_message.clone()),
            created_at: Set(request.created_at.to_rfc3339()),
        };

        SearchRequests::insert(active_model).exec(&self.conn).await?;
        Ok(())
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<SearchRequest>> {
        let row = SearchRequests::find_by_id(id.to_string())
            .one(&self.conn)
            .await?;

        row.map(from_row).transpose()
    }

    pub async fn list_by_status(&self, status: RequestStatus) -> Result<Vec<SearchRequest>> {
        let rows = SearchRequests::find()
            .filter(search_requests::Column::Status.eq(status.as_str()))
            .order_by_asc(search_requests::Column::CreatedAt)
            .all(&self.conn)
            .await?;

        rows.into_iter().map(from_row).collect()
    }

    pub async fn set_status(&self, id: Uuid, status: RequestStatus) -> Result<()> {
        let active_model = search_requests::ActiveModel {
            id: Set(id.to_string()),
            status: Set(status.as_str().to_string()),
            ..Default::default()
        };
        SearchRequests::update(active_model).exec(&self.conn).await?;
        Ok(())
    }

    pub async fn mark_completed(&self, id: Uuid, result_count: i64) -> Result<()> {
        let active_model = search_requests::ActiveModel {
            id: Set(id.to_string()),
            status: Set(RequestStatus::Completed.as_str().to_string()),
            result_count: Set(Some(result_count)),
            error_message: Set(None),
            ..Default::default()
        };
        SearchRequests::update(active_model).exec(&self.conn).await?;
        Ok(())
    }

    pub async fn mark_error(&self, id: Uuid, message: &str) -> Result<()> {
        let active_model = search_requests::ActiveModel {
            id: Set(id.to_string()),
            status: Set(RequestStatus::Error.as_str().to_string()),
            error_message: Set(Some(message.to_string())),
            ..Default::default()
        };
        SearchRequests::update(active_model).exec(&self.conn).await?;
        Ok(())
    }

    pub async fn delete_older_than(&self, cutoff: &str) -> Result<u64> {
        let outcome = SearchRequests::delete_many()
            .filter(search_requests::Column::CreatedAt.lt(cutoff))
            .exec(&self.conn)
            .await?;
        Ok(outcome.rows_affected)
    }
}

fn from_row(row: search_requests::Model) -> Result<SearchRequest> {
    let filters: SearchFilters =
        serde_json::from_str(&row.filters_json).context("corrupt filters_json")?;
    let providers: Vec<String> =
        serde_json::from_str(&row.providers_json).context("corrupt providers_json")?;
    let dedup: DeduplicationOptions =
        serde_json::from_str(&row.dedup_json).context("corrupt dedup_json")?;

    let status = RequestStatus::parse(&row.status)
        .with_context(|| format!("unknown request status: {}", row.status))?;

    Ok(SearchRequest {
        id: Uuid::parse_str(&row.id)?,
        user_id: row.user_id,
        query: row.query,
        title: row.title,
        filters,
        providers,
        dedup,
        #[allow(clippy::cast_sign_loss)]
        max_results: row.max_results as u32,
        status,
        result_count: row.result_count,
        error_message: row.error_message,
        created_at: DateTime::parse_from_rfc3339(&row.created_at)?.with_timezone(&Utc),
    })
}
