use sea_orm_migration::prelude::extension::postgres::Type;
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_type(
                Type::create()
                    .as_enum(Alias::new("build_state"))
                    .values(vec![
                        Alias::new("triggered"),
                        Alias::new("cloning"),
                        Alias::new("building"),
                        Alias::new("finished"),
                        Alias::new("cancelled"),
                    ])
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_type(Type::drop().name(Alias::new("build_state")).to_owned())
            .await
    }
}
