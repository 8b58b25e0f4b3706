use sea_orm::entity::prelude::*;

/// Append-only audit log. Rows are never updated or deleted.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "edits")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub timestamp: String,
    pub collection: String,
    pub op: String,
    pub target_id: String,
    /// JSON object of the changed fields
    pub changes: String,
    pub auth_user_id: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
