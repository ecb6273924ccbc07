use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SearchRequests::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SearchRequests::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SearchRequests::UserId).string())
                    .col(ColumnDef::new(SearchRequests::Query).string().not_null())
                    .col(ColumnDef::new(SearchRequests::Title).string().not_null())
                    .col(
                        ColumnDef::new(SearchRequests::FiltersJson)
                            .text()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SearchRequests::ProvidersJson)
                            .text()
                            .not_null(),
                    )
                    .col(ColumnDef::new(SearchRequests::DedupJson).text().not_null())
                    .col(
                        ColumnDef::new(SearchRequests::MaxResults)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(SearchRequests::Status).string().not_null())
                    .col(ColumnDef::new(SearchRequests::ResultCount).big_integer())
                    .col(ColumnDef::new(SearchRequests::ErrorMessage).text())
                    .col(
                        ColumnDef::new(SearchRequests::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_search_requests_status")
                    .table(SearchRequests::Table)
                    .col(SearchRequests::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(SearchResults::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SearchResults::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(SearchResults::RequestId)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(SearchResults::Title).string().not_null())
                    .col(ColumnDef::new(SearchResults::Url).text().not_null())
                    .col(ColumnDef::new(SearchResults::Snippet).text().not_null())
                    .col(ColumnDef::new(SearchResults::Provider).string().not_null())
                    .col(ColumnDef::new(SearchResults::Rank).integer().not_null())
                    .col(ColumnDef::new(SearchResults::Kind).string().not_null())
                    .col(ColumnDef::new(SearchResults::DuplicateOf).string())
                    .col(
                        ColumnDef::new(SearchResults::CapturedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_search_results_request")
                            .from(SearchResults::Table, SearchResults::RequestId)
                            .to(SearchRequests::Table, SearchRequests::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_search_results_request_id")
                    .table(SearchResults::Table)
                    .col(SearchResults::RequestId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(DuplicateRelationships::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DuplicateRelationships::ResultId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DuplicateRelationships::DuplicateOf)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DuplicateRelationships::RequestId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DuplicateRelationships::Similarity)
                            .double()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DuplicateRelationships::Method)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DuplicateRelationships::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .col(DuplicateRelationships::ResultId)
                            .col(DuplicateRelationships::DuplicateOf),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_duplicate_relationships_request")
                            .from(
                                DuplicateRelationships::Table,
                                DuplicateRelationships::RequestId,
                            )
                            .to(SearchRequests::Table, SearchRequests::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_duplicate_relationships_request_id")
                    .table(DuplicateRelationships::Table)
                    .col(DuplicateRelationships::RequestId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(SearchCache::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SearchCache::Fingerprint)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SearchCache::ResultsJson).text().not_null())
                    .col(
                        ColumnDef::new(SearchCache::DuplicatesRemoved)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SearchCache::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(SearchCache::ExpiresAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_search_cache_expires_at")
                    .table(SearchCache::Table)
                    .col(SearchCache::ExpiresAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SearchCache::Table).to_owned())
            .await?;
        manager
            .drop_table(
                Table::drop()
                    .table(DuplicateRelationships::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(Table::drop().table(SearchResults::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(SearchRequests::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum SearchRequests {
    Table,
    Id,
    UserId,
    Query,
    Title,
    FiltersJson,
    ProvidersJson,
    DedupJson,
    MaxResults,
    Status,
    ResultCount,
    ErrorMessage,
    CreatedAt,
}

#[derive(DeriveIden)]
enum SearchResults {
    Table,
    Id,
    RequestId,
    Title,
    Url,
    Snippet,
    Provider,
    Rank,
    Kind,
    DuplicateOf,
    CapturedAt,
}

#[derive(DeriveIden)]
enum DuplicateRelationships {
    Table,
    ResultId,
    DuplicateOf,
    RequestId,
    Similarity,
    Method,
    CreatedAt,
}

#[derive(DeriveIden)]
enum SearchCache {
    Table,
    Fingerprint,
    ResultsJson,
    DuplicatesRemoved,
    CreatedAt,
    ExpiresAt,
}
