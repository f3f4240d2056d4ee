pub mod builds;
pub mod error;
pub mod stale;
pub mod versions;

pub use error::{Result, StoreError};
pub use stale::StaleBuildGroup;

use sea_orm::DatabaseConnection;

pub struct Store {
    db: DatabaseConnection,
}

impl Store {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    pub fn versions(&self) -> versions::VersionRepository<'_> {
        versions::VersionRepository::new(&self.db)
    }

    pub fn builds(&self) -> builds::BuildRepository<'_> {
        builds::BuildRepository::new(&self.db)
    }
}
