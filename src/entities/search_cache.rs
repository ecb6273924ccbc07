use sea_orm::entity::prelude::*;

/// Durable cache tier. Rows are replaced wholesale on write; the stored
/// batch is always the post-dedup unique set, never raw results.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "search_cache")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub fingerprint: String,
    #[sea_orm(column_type = "Text")]
    pub results_json: String,
    pub duplicates_removed: i64,
    pub hit_count: i64,
    pub created_at: String,
    pub expires_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
