use ::entity::{prelude::*, versions};
use sea_orm::*;

pub struct VersionRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> VersionRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn find_by_id(&self, id: i32) -> Result<Option<versions::Model>, DbErr> {
        Versions::find_by_id(id).one(self.db).await
    }
}
