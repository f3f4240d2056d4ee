use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Builds::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Builds::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Builds::ProjectSlug).text().not_null())
                    .col(ColumnDef::new(Builds::VersionId).integer())
                    .col(
                        ColumnDef::new(Builds::State)
                            .custom(Alias::new("build_state"))
                            .not_null()
                            .default("triggered"),
                    )
                    .col(
                        ColumnDef::new(Builds::Success)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(Builds::Commit).text())
                    .col(
                        ColumnDef::new(Builds::Date)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_builds_project")
                            .from(Builds::Table, Builds::ProjectSlug)
                            .to(Projects::Table, Projects::Slug)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    // Builds outlive their version so the history stays queryable.
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_builds_version")
                            .from(Builds::Table, Builds::VersionId)
                            .to(Versions::Table, Versions::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_builds_project_version_date")
                    .table(Builds::Table)
                    .col(Builds::ProjectSlug)
                    .col(Builds::VersionId)
                    .col(Builds::Date)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_builds_version_date")
                    .table(Builds::Table)
                    .col(Builds::VersionId)
                    .col(Builds::Date)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Builds::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Builds {
    Table,
    Id,
    ProjectSlug,
    VersionId,
    State,
    Success,
    Commit,
    Date,
}

#[derive(DeriveIden)]
enum Projects {
    Table,
    Slug,
}

#[derive(DeriveIden)]
enum Versions {
    Table,
    Id,
}
