use crate::Result;
use async_trait::async_trait;
use chrono::NaiveDateTime;
use entity::{builds, versions};
use sweeper_store::{StaleBuildGroup, Store};

/// Read access to builds and versions.
///
/// The aggregate query and the per-version lookups are separate calls so
/// the live latest build can be compared against the aggregate snapshot.
#[async_trait]
pub trait BuildCatalog: Send + Sync {
    async fn stale_groups(&self, cutoff: NaiveDateTime) -> Result<Vec<StaleBuildGroup>>;

    async fn find_version(&self, version_id: i32) -> Result<Option<versions::Model>>;

    async fn latest_build(&self, version_id: i32) -> Result<Option<builds::Model>>;
}

#[async_trait]
impl BuildCatalog for Store {
    async fn stale_groups(&self, cutoff: NaiveDateTime) -> Result<Vec<StaleBuildGroup>> {
        Ok(self.find_stale_build_groups(cutoff).await?)
    }

    async fn find_version(&self, version_id: i32) -> Result<Option<versions::Model>> {
        Ok(self.versions().find_by_id(version_id).await?)
    }

    async fn latest_build(&self, version_id: i32) -> Result<Option<builds::Model>> {
        Ok(self.builds().latest_for_version(version_id).await?)
    }
}
