pub use sea_orm_migration::prelude::*;

mod m20261002_101500_create_enums;
mod m20261002_101512_create_projects;
mod m20261002_101524_create_versions;
mod m20261002_101536_create_builds;
mod m20261002_101548_create_triggers;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20261002_101500_create_enums::Migration),
            Box::new(m20261002_101512_create_projects::Migration),
            Box::new(m20261002_101524_create_versions::Migration),
            Box::new(m20261002_101536_create_builds::Migration),
            Box::new(m20261002_101548_create_triggers::Migration),
        ]
    }
}
