use crate::entities::prelude::*;
use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::Schema;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let backend = manager.get_database_backend();
        let schema = Schema::new(backend);

        manager
            .create_table(
                schema
                    .create_table_from_entity(Users)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(Bugs)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(Comments)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(Edits)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(Roles)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        for (name, table, column) in [
            ("idx_users_created_on", Collection::Users, Field::CreatedOn),
            ("idx_bugs_created_on", Collection::Bugs, Field::CreatedOn),
            ("idx_comments_bug_id", Collection::Comments, Field::BugId),
            ("idx_edits_target_id", Collection::Edits, Field::TargetId),
        ] {
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name(name)
                        .table(table)
                        .col(column)
                        .to_owned(),
                )
                .await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for table in [
            Collection::Edits,
            Collection::Comments,
            Collection::Bugs,
            Collection::Users,
            Collection::Roles,
        ] {
            manager
                .drop_table(
                    Table::drop()
                        .table(table)
                        .if_exists()
                        .to_owned(),
                )
                .await?;
        }

        Ok(())
    }
}

#[derive(DeriveIden, Clone, Copy)]
enum Collection {
    Users,
    Bugs,
    Comments,
    Edits,
    Roles,
}

#[derive(DeriveIden, Clone, Copy)]
enum Field {
    CreatedOn,
    BugId,
    TargetId,
}
