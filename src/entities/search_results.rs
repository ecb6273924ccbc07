use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "search_results")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub request_id: String,
    pub title: String,
    pub url: String,
    #[sea_orm(column_type = "Text")]
    pub snippet: String,
    pub provider: String,
    pub rank: i32,
    pub kind: String,
    /// Id of the unique this row duplicates, or null for uniques.
    /// Never points at more than one item; first-detected wins.
    pub duplicate_of: Option<String>,
    pub captured_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::search_requests::Entity",
        from = "Column::RequestId",
        to = "super::search_requests::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    SearchRequests,
}

impl Related<super::search_requests::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SearchRequests.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
