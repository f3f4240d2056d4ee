use chrono::NaiveDateTime;
use std::path::Path;
use tracing::{info, warn};

/// Sink for the events a cleanup run reports.
pub trait CleanupEvents: Send + Sync {
    /// The live latest build of a version is not older than the cutoff,
    /// although the aggregate query said it was.
    fn newer_build(&self, build_id: i32, date: NaiveDateTime, cutoff: NaiveDateTime);

    /// A version's build path is stale and is (or, on a dry run, would be) removed.
    fn stale_path(&self, version_slug: &str, path: &Path, date: NaiveDateTime);
}

/// Emits events as structured `tracing` records.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEvents;

impl CleanupEvents for TracingEvents {
    fn newer_build(&self, build_id: i32, date: NaiveDateTime, cutoff: NaiveDateTime) {
        warn!(
            build_id,
            date = %date,
            max_date = %cutoff,
            "Latest build is newer"
        );
    }

    fn stale_path(&self, version_slug: &str, path: &Path, date: NaiveDateTime) {
        info!(
            version_slug,
            path = %path.display(),
            date = %date,
            "Found stale build path for version, last used on date"
        );
    }
}
