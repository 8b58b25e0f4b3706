use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "bugs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub title: String,
    pub description: String,
    pub steps_to_reproduce: String,
    /// Lowercased copies of the searchable text
    pub title_folded: String,
    pub description_folded: String,
    pub steps_to_reproduce_folded: String,
    pub classification: String,
    pub status: String,
    pub created_on: String,
    pub created_by_id: String,
    pub created_by_name: String,
    pub assigned_to_id: Option<String>,
    pub assigned_to_name: Option<String>,
    pub classified_on: Option<String>,
    pub closed_on: Option<String>,
    pub closed_by_id: Option<String>,
    pub closed_by_name: Option<String>,
    pub last_updated: Option<String>,
    pub last_updated_by: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::comments::Entity")]
    Comments,
}

impl Related<super::comments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Comments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
