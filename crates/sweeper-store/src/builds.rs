use ::entity::{builds, prelude::*};
use sea_orm::*;

pub struct BuildRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> BuildRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Most recent build of a version by date, read directly from the table.
    pub async fn latest_for_version(&self, version_id: i32) -> Result<Option<builds::Model>, DbErr> {
        Builds::find()
            .filter(builds::Column::VersionId.eq(version_id))
            .order_by_desc(builds::Column::Date)
            .order_by_desc(builds::Column::Id)
            .one(self.db)
            .await
    }
}
