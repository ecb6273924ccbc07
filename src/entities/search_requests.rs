use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "search_requests")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: Option<String>,
    pub query: String,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub filters_json: String,
    #[sea_orm(column_type = "Text")]
    pub providers_json: String,
    #[sea_orm(column_type = "Text")]
    pub dedup_json: String,
    pub max_results: i32,
    pub status: String,
    pub result_count: Option<i64>,
    pub error_message: Option<String>,
    pub created_at: String, // RFC3339; sqlite stores timestamps as text
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
