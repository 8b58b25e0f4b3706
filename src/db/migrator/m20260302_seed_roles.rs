use crate::domain::UserRole;
use crate::entities::{prelude::*, roles};
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let mut insert = Query::insert()
            .into_table(Roles)
            .columns([roles::Column::Name, roles::Column::Permissions])
            .on_conflict(OnConflict::column(roles::Column::Name).do_nothing().to_owned())
            .to_owned();

        for role in UserRole::ALL {
            let permissions = serde_json::to_string(&role.default_permissions())
                .map_err(|e| DbErr::Custom(format!("Failed to encode permissions: {e}")))?;
            insert.values([role.as_str().into(), permissions.into()])
                .map_err(|e| DbErr::Custom(e.to_string()))?;
        }

        manager.exec_stmt(insert).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let delete = Query::delete()
            .from_table(Roles)
            .and_where(
                Expr::col(roles::Column::Name)
                    .is_in(UserRole::ALL.iter().map(UserRole::as_str)),
            )
            .to_owned();

        manager.exec_stmt(delete).await?;

        Ok(())
    }
}
