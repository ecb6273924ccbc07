use sea_orm::entity::prelude::*;

/// Created only during deduplication; never mutated afterward.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "duplicate_relationships")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub result_id: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub duplicate_of: String,
    pub request_id: String,
    pub similarity: f64,
    /// "exact-url" | "normalized-url" | "title-similarity"
    pub method: String,
    pub created_at: String,
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
