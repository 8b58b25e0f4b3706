use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "comments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub bug_id: String,
    pub author_id: String,
    pub author_name: String,
    pub content: String,
    pub created_on: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::bugs::Entity",
        from = "Column::BugId",
        to = "super::bugs::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Bugs,
}

impl Related<super::bugs::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Bugs.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
