use crate::{Result, Store};
use ::entity::{builds, prelude::*};
use chrono::{NaiveDateTime, TimeDelta};
use sea_orm::sea_query::Expr;
use sea_orm::*;

/// One `(project, version)` pair from the builds table with the date of its
/// newest build.
///
/// `version_id` is `None` for builds whose version row has been deleted.
#[derive(Debug, Clone, PartialEq, Eq, FromQueryResult)]
pub struct StaleBuildGroup {
    pub project_slug: String,
    pub version_id: Option<i32>,
    pub latest_date: NaiveDateTime,
}

/// `now - days`, saturating at the earliest representable timestamp.
pub fn retention_cutoff(now: NaiveDateTime, days: u32) -> NaiveDateTime {
    TimeDelta::try_days(i64::from(days))
        .and_then(|window| now.checked_sub_signed(window))
        .unwrap_or(NaiveDateTime::MIN)
}

impl Store {
    /// Group builds by project and version and return the groups whose
    /// newest build is strictly older than `cutoff`, newest first.
    ///
    /// Versions without builds never show up here since the groups are
    /// derived from build rows.
    pub async fn find_stale_build_groups(
        &self,
        cutoff: NaiveDateTime,
    ) -> Result<Vec<StaleBuildGroup>> {
        Ok(Builds::find()
            .select_only()
            .column(builds::Column::ProjectSlug)
            .column(builds::Column::VersionId)
            .column_as(builds::Column::Date.max(), "latest_date")
            .group_by(builds::Column::ProjectSlug)
            .group_by(builds::Column::VersionId)
            .having(Expr::expr(builds::Column::Date.max()).lt(cutoff))
            .order_by_desc(builds::Column::Date.max())
            .into_model::<StaleBuildGroup>()
            .all(self.db())
            .await?)
    }
}
