use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    /// 24-character hex identifier
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Stored trimmed and lowercased
    #[sea_orm(unique)]
    pub email: String,

    /// Argon2id PHC string, or a legacy plain-text password awaiting migration
    pub password: String,

    pub given_name: String,

    pub family_name: String,

    /// Lowercased copies for keyword search; SQLite only folds ASCII case
    pub given_name_folded: String,

    pub family_name_folded: String,

    pub role: String,

    pub created_on: String,

    pub last_updated: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
