use crate::{BuildArtifacts, BuildCatalog, CleanupEvents, Result};
use chrono::{NaiveDateTime, Utc};
use std::sync::Arc;
use sweeper_store::StaleBuildGroup;
use sweeper_store::stale::retention_cutoff;
use tracing::{debug, info};

/// Counters from one cleanup run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CleanupSummary {
    pub dry_run: bool,
    pub candidates: usize,
    pub missing_versions: usize,
    pub newer_builds: usize,
    pub missing_paths: usize,
    pub stale_paths: usize,
    pub removed: usize,
}

/// Removes the build paths of versions whose latest build predates the
/// retention window.
///
/// Groups are processed one at a time with no surrounding transaction. A
/// build created between the aggregate query and the per-version check is
/// reported through [`CleanupEvents::newer_build`] but does not stop the
/// cleanup of that version.
pub struct StaleBuildCleaner {
    catalog: Arc<dyn BuildCatalog>,
    artifacts: Arc<dyn BuildArtifacts>,
    events: Arc<dyn CleanupEvents>,
}

impl StaleBuildCleaner {
    pub fn new(
        catalog: Arc<dyn BuildCatalog>,
        artifacts: Arc<dyn BuildArtifacts>,
        events: Arc<dyn CleanupEvents>,
    ) -> Self {
        Self {
            catalog,
            artifacts,
            events,
        }
    }

    pub async fn run(&self, max_age_days: u32, dry_run: bool) -> Result<CleanupSummary> {
        self.run_at(Utc::now().naive_utc(), max_age_days, dry_run).await
    }

    /// Same as [`run`](Self::run) with an explicit notion of "now".
    pub async fn run_at(
        &self,
        now: NaiveDateTime,
        max_age_days: u32,
        dry_run: bool,
    ) -> Result<CleanupSummary> {
        let cutoff = retention_cutoff(now, max_age_days);

        info!(
            max_age_days,
            cutoff = %cutoff,
            dry_run,
            "Searching for stale build paths"
        );

        let groups = self.catalog.stale_groups(cutoff).await?;

        let mut summary = CleanupSummary {
            dry_run,
            candidates: groups.len(),
            ..Default::default()
        };

        for group in &groups {
            self.process_group(group, cutoff, dry_run, &mut summary).await?;
        }

        info!(
            candidates = summary.candidates,
            missing_versions = summary.missing_versions,
            newer_builds = summary.newer_builds,
            missing_paths = summary.missing_paths,
            stale_paths = summary.stale_paths,
            removed = summary.removed,
            dry_run,
            "Stale build cleanup finished"
        );

        Ok(summary)
    }

    async fn process_group(
        &self,
        group: &StaleBuildGroup,
        cutoff: NaiveDateTime,
        dry_run: bool,
        summary: &mut CleanupSummary,
    ) -> Result<()> {
        // Builds keep their project after the version row is gone.
        let Some(version_id) = group.version_id else {
            summary.missing_versions += 1;
            return Ok(());
        };

        let Some(version) = self.catalog.find_version(version_id).await? else {
            summary.missing_versions += 1;
            return Ok(());
        };

        let last_used = match self.catalog.latest_build(version.id).await? {
            Some(build) => {
                if build.date >= cutoff {
                    self.events.newer_build(build.id, build.date, cutoff);
                    summary.newer_builds += 1;
                }
                build.date
            }
            None => group.latest_date,
        };

        let Some(path) = self.artifacts.build_path(&version).await? else {
            debug!(
                "No build path for {}/{}, nothing to clean",
                version.project_slug, version.slug
            );
            summary.missing_paths += 1;
            return Ok(());
        };

        self.events.stale_path(&version.slug, &path, last_used);
        summary.stale_paths += 1;

        if !dry_run && self.artifacts.clean_build_path(&version).await? {
            summary.removed += 1;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CheckoutArtifacts, CleanerError};
    use async_trait::async_trait;
    use chrono::{Duration, NaiveDate};
    use entity::{builds, sea_orm_active_enums::BuildState, versions};
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;
    use tempfile::TempDir;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 16)
            .unwrap()
            .and_hms_opt(3, 0, 0)
            .unwrap()
    }

    fn days_ago(days: i64) -> NaiveDateTime {
        now() - Duration::days(days)
    }

    /// In-memory builds table with the same grouping semantics as the store.
    #[derive(Default)]
    struct MemoryCatalog {
        versions: Mutex<Vec<versions::Model>>,
        builds: Mutex<Vec<builds::Model>>,
        // Builds inserted after the aggregate query has run.
        late_builds: Mutex<Vec<builds::Model>>,
        // Versions whose builds are deleted after the aggregate query has run.
        purged_versions: Mutex<Vec<i32>>,
        fail_lookups: bool,
    }

    impl MemoryCatalog {
        fn add_version(&self, id: i32, project_slug: &str, slug: &str) {
            self.versions.lock().unwrap().push(versions::Model {
                id,
                project_slug: project_slug.to_string(),
                slug: slug.to_string(),
                verbose_name: slug.to_string(),
                active: true,
                built: true,
                created_at: days_ago(1000),
                updated_at: days_ago(1000),
            });
        }

        fn build(id: i32, project_slug: &str, version_id: Option<i32>, days: i64) -> builds::Model {
            builds::Model {
                id,
                project_slug: project_slug.to_string(),
                version_id,
                state: BuildState::Finished,
                success: true,
                commit: None,
                date: days_ago(days),
            }
        }

        fn add_build(&self, id: i32, project_slug: &str, version_id: Option<i32>, days: i64) {
            self.builds
                .lock()
                .unwrap()
                .push(Self::build(id, project_slug, version_id, days));
        }

        fn add_late_build(&self, id: i32, project_slug: &str, version_id: i32, days: i64) {
            self.late_builds
                .lock()
                .unwrap()
                .push(Self::build(id, project_slug, Some(version_id), days));
        }

        fn purge_builds_after_query(&self, version_id: i32) {
            self.purged_versions.lock().unwrap().push(version_id);
        }
    }

    #[async_trait]
    impl BuildCatalog for MemoryCatalog {
        async fn stale_groups(&self, cutoff: NaiveDateTime) -> Result<Vec<StaleBuildGroup>> {
            let mut groups: Vec<StaleBuildGroup> = Vec::new();
            for build in self.builds.lock().unwrap().iter() {
                let existing = groups.iter().position(|g| {
                    g.project_slug == build.project_slug && g.version_id == build.version_id
                });
                match existing {
                    Some(i) => groups[i].latest_date = groups[i].latest_date.max(build.date),
                    None => groups.push(StaleBuildGroup {
                        project_slug: build.project_slug.clone(),
                        version_id: build.version_id,
                        latest_date: build.date,
                    }),
                }
            }
            groups.retain(|g| g.latest_date < cutoff);
            groups.sort_by(|a, b| b.latest_date.cmp(&a.latest_date));

            let late = std::mem::take(&mut *self.late_builds.lock().unwrap());
            self.builds.lock().unwrap().extend(late);

            let purged = std::mem::take(&mut *self.purged_versions.lock().unwrap());
            self.builds
                .lock()
                .unwrap()
                .retain(|b| !b.version_id.is_some_and(|id| purged.contains(&id)));

            Ok(groups)
        }

        async fn find_version(&self, version_id: i32) -> Result<Option<versions::Model>> {
            if self.fail_lookups {
                return Err(CleanerError::Database(sea_orm::DbErr::Conn(
                    sea_orm::RuntimeErr::Internal("connection reset".to_string()),
                )));
            }
            Ok(self
                .versions
                .lock()
                .unwrap()
                .iter()
                .find(|v| v.id == version_id)
                .cloned())
        }

        async fn latest_build(&self, version_id: i32) -> Result<Option<builds::Model>> {
            Ok(self
                .builds
                .lock()
                .unwrap()
                .iter()
                .filter(|b| b.version_id == Some(version_id))
                .max_by_key(|b| (b.date, b.id))
                .cloned())
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    enum Event {
        NewerBuild {
            build_id: i32,
            date: NaiveDateTime,
            cutoff: NaiveDateTime,
        },
        StalePath {
            version_slug: String,
            path: PathBuf,
            date: NaiveDateTime,
        },
    }

    #[derive(Default)]
    struct RecordingEvents {
        events: Mutex<Vec<Event>>,
    }

    impl RecordingEvents {
        fn take(&self) -> Vec<Event> {
            std::mem::take(&mut *self.events.lock().unwrap())
        }
    }

    impl CleanupEvents for RecordingEvents {
        fn newer_build(&self, build_id: i32, date: NaiveDateTime, cutoff: NaiveDateTime) {
            self.events.lock().unwrap().push(Event::NewerBuild {
                build_id,
                date,
                cutoff,
            });
        }

        fn stale_path(&self, version_slug: &str, path: &Path, date: NaiveDateTime) {
            self.events.lock().unwrap().push(Event::StalePath {
                version_slug: version_slug.to_string(),
                path: path.to_path_buf(),
                date,
            });
        }
    }

    struct Harness {
        docroot: TempDir,
        catalog: Arc<MemoryCatalog>,
        events: Arc<RecordingEvents>,
    }

    impl Harness {
        fn new() -> Self {
            Self::with_catalog(MemoryCatalog::default())
        }

        fn with_catalog(catalog: MemoryCatalog) -> Self {
            Self {
                docroot: tempfile::tempdir().unwrap(),
                catalog: Arc::new(catalog),
                events: Arc::new(RecordingEvents::default()),
            }
        }

        fn checkout(&self, project_slug: &str, version_slug: &str) -> PathBuf {
            let path = self
                .docroot
                .path()
                .join(project_slug)
                .join("checkouts")
                .join(version_slug);
            std::fs::create_dir_all(path.join("docs")).unwrap();
            std::fs::write(path.join("docs/index.rst"), "Welcome\n").unwrap();
            path
        }

        fn cleaner(&self) -> StaleBuildCleaner {
            StaleBuildCleaner::new(
                self.catalog.clone(),
                Arc::new(CheckoutArtifacts::new(self.docroot.path())),
                self.events.clone(),
            )
        }

        async fn run(&self, days: u32, dry_run: bool) -> CleanupSummary {
            self.cleaner()
                .run_at(now(), days, dry_run)
                .await
                .expect("cleanup run failed")
        }
    }

    #[tokio::test]
    async fn test_removes_checkout_when_all_builds_are_old() {
        let h = Harness::new();
        h.catalog.add_version(1, "pip", "1.0");
        h.catalog.add_build(10, "pip", Some(1), 400);
        h.catalog.add_build(11, "pip", Some(1), 380);
        let checkout = h.checkout("pip", "1.0");

        let summary = h.run(365, false).await;

        assert!(!checkout.exists());
        assert_eq!(summary.candidates, 1);
        assert_eq!(summary.stale_paths, 1);
        assert_eq!(summary.removed, 1);
        assert_eq!(
            h.events.take(),
            vec![Event::StalePath {
                version_slug: "1.0".to_string(),
                path: checkout,
                date: days_ago(380),
            }]
        );
    }

    #[tokio::test]
    async fn test_keeps_checkout_with_a_recent_build() {
        let h = Harness::new();
        h.catalog.add_version(1, "pip", "stable");
        h.catalog.add_build(10, "pip", Some(1), 400);
        h.catalog.add_build(11, "pip", Some(1), 200);
        let checkout = h.checkout("pip", "stable");

        let summary = h.run(365, false).await;

        assert!(checkout.exists());
        assert_eq!(summary.candidates, 0);
        assert!(h.events.take().is_empty());
    }

    #[tokio::test]
    async fn test_recent_builds_are_excluded() {
        let h = Harness::new();
        h.catalog.add_version(1, "pip", "latest");
        h.catalog.add_build(10, "pip", Some(1), 10);
        h.catalog.add_build(11, "pip", Some(1), 5);
        let checkout = h.checkout("pip", "latest");

        let summary = h.run(365, false).await;

        assert!(checkout.exists());
        assert_eq!(summary, CleanupSummary::default());
    }

    #[tokio::test]
    async fn test_dry_run_logs_but_keeps_checkout() {
        let h = Harness::new();
        h.catalog.add_version(1, "pip", "1.0");
        h.catalog.add_build(10, "pip", Some(1), 400);
        let checkout = h.checkout("pip", "1.0");

        let dry = h.run(365, true).await;
        let dry_events = h.events.take();

        assert!(checkout.exists());
        assert!(dry.dry_run);
        assert_eq!(dry.stale_paths, 1);
        assert_eq!(dry.removed, 0);

        let wet = h.run(365, false).await;
        assert!(!checkout.exists());
        assert_eq!(wet.removed, 1);
        assert_eq!(h.events.take(), dry_events);
    }

    #[tokio::test]
    async fn test_version_without_builds_is_never_a_candidate() {
        let h = Harness::new();
        h.catalog.add_version(1, "pip", "unbuilt");
        let checkout = h.checkout("pip", "unbuilt");

        let summary = h.run(0, false).await;

        assert!(checkout.exists());
        assert_eq!(summary.candidates, 0);
    }

    #[tokio::test]
    async fn test_deleted_version_is_skipped_quietly() {
        let h = Harness::new();
        // Version 2 was deleted; its builds kept the reference.
        h.catalog.add_build(20, "pip", Some(2), 500);
        // Version row gone and the foreign key nulled out.
        h.catalog.add_build(21, "pip", None, 600);
        h.catalog.add_version(1, "pip", "1.0");
        h.catalog.add_build(10, "pip", Some(1), 400);
        let checkout = h.checkout("pip", "1.0");

        let summary = h.run(365, false).await;

        assert_eq!(summary.candidates, 3);
        assert_eq!(summary.missing_versions, 2);
        assert_eq!(summary.removed, 1);
        assert!(!checkout.exists());
        assert_eq!(h.events.take().len(), 1);
    }

    #[tokio::test]
    async fn test_newer_build_warns_and_still_cleans() {
        let h = Harness::new();
        h.catalog.add_version(1, "pip", "1.0");
        h.catalog.add_build(10, "pip", Some(1), 400);
        h.catalog.add_late_build(99, "pip", 1, 1);
        let checkout = h.checkout("pip", "1.0");

        let summary = h.run(365, false).await;

        assert!(!checkout.exists());
        assert_eq!(summary.newer_builds, 1);
        assert_eq!(summary.removed, 1);
        assert_eq!(
            h.events.take(),
            vec![
                Event::NewerBuild {
                    build_id: 99,
                    date: days_ago(1),
                    cutoff: days_ago(365),
                },
                Event::StalePath {
                    version_slug: "1.0".to_string(),
                    path: checkout,
                    date: days_ago(1),
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_missing_checkout_is_skipped() {
        let h = Harness::new();
        h.catalog.add_version(1, "pip", "0.9");
        h.catalog.add_build(10, "pip", Some(1), 700);

        let summary = h.run(365, false).await;

        assert_eq!(summary.candidates, 1);
        assert_eq!(summary.missing_paths, 1);
        assert_eq!(summary.removed, 0);
        assert!(h.events.take().is_empty());
    }

    #[tokio::test]
    async fn test_groups_are_processed_newest_first() {
        let h = Harness::new();
        h.catalog.add_version(1, "pip", "0.1");
        h.catalog.add_version(2, "pip", "0.2");
        h.catalog.add_version(3, "requests", "0.3");
        h.catalog.add_build(10, "pip", Some(1), 900);
        h.catalog.add_build(20, "pip", Some(2), 500);
        h.catalog.add_build(30, "requests", Some(3), 700);
        h.checkout("pip", "0.1");
        h.checkout("pip", "0.2");
        h.checkout("requests", "0.3");

        h.run(365, true).await;

        let slugs: Vec<String> = h
            .events
            .take()
            .into_iter()
            .filter_map(|e| match e {
                Event::StalePath { version_slug, .. } => Some(version_slug),
                Event::NewerBuild { .. } => None,
            })
            .collect();
        assert_eq!(slugs, vec!["0.2", "0.3", "0.1"]);
    }

    #[tokio::test]
    async fn test_zero_day_window_covers_every_past_build() {
        let h = Harness::new();
        h.catalog.add_version(1, "pip", "main");
        h.catalog.add_build(10, "pip", Some(1), 1);
        let checkout = h.checkout("pip", "main");

        let summary = h.run(0, false).await;

        assert_eq!(summary.removed, 1);
        assert!(!checkout.exists());
    }

    #[tokio::test]
    async fn test_lookup_failure_aborts_the_run() {
        let h = Harness::with_catalog(MemoryCatalog {
            fail_lookups: true,
            ..Default::default()
        });
        h.catalog.add_version(1, "pip", "1.0");
        h.catalog.add_build(10, "pip", Some(1), 400);
        let checkout = h.checkout("pip", "1.0");

        let err = h.cleaner().run_at(now(), 365, false).await.unwrap_err();

        assert!(matches!(err, CleanerError::Database(_)));
        assert!(checkout.exists());
    }
    /// Checkouts that all exist but cannot be removed.
    struct UndeletableArtifacts {
        docroot: PathBuf,
    }

    #[async_trait]
    impl BuildArtifacts for UndeletableArtifacts {
        async fn build_path(&self, version: &versions::Model) -> Result<Option<PathBuf>> {
            Ok(Some(self.docroot.join(&version.project_slug).join(&version.slug)))
        }

        async fn clean_build_path(&self, version: &versions::Model) -> Result<bool> {
            Err(CleanerError::RemovePath {
                path: self.docroot.join(&version.project_slug).join(&version.slug),
                source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
            })
        }
    }

    #[tokio::test]
    async fn test_removal_failure_aborts_the_run() {
        let h = Harness::new();
        h.catalog.add_version(1, "pip", "a");
        h.catalog.add_version(2, "pip", "b");
        h.catalog.add_build(10, "pip", Some(1), 400);
        h.catalog.add_build(20, "pip", Some(2), 500);

        let cleaner = StaleBuildCleaner::new(
            h.catalog.clone(),
            Arc::new(UndeletableArtifacts {
                docroot: PathBuf::from("/x"),
            }),
            h.events.clone(),
        );

        let err = cleaner.run_at(now(), 365, false).await.unwrap_err();

        match err {
            CleanerError::RemovePath { path, source } => {
                assert_eq!(path, PathBuf::from("/x/pip/a"));
                assert_eq!(source.kind(), std::io::ErrorKind::PermissionDenied);
            }
            other => panic!("unexpected error: {other:?}"),
        }

        // Version "b" comes after "a" and is never reached.
        assert_eq!(
            h.events.take(),
            vec![Event::StalePath {
                version_slug: "a".to_string(),
                path: PathBuf::from("/x/pip/a"),
                date: days_ago(400),
            }]
        );
    }

    #[tokio::test]
    async fn test_purged_builds_fall_back_to_aggregate_date() {
        let h = Harness::new();
        h.catalog.add_version(1, "pip", "1.0");
        h.catalog.add_build(10, "pip", Some(1), 400);
        h.catalog.add_build(11, "pip", Some(1), 420);
        h.catalog.purge_builds_after_query(1);
        let checkout = h.checkout("pip", "1.0");

        let summary = h.run(365, false).await;

        assert!(!checkout.exists());
        assert_eq!(summary.newer_builds, 0);
        assert_eq!(summary.removed, 1);
        assert_eq!(
            h.events.take(),
            vec![Event::StalePath {
                version_slug: "1.0".to_string(),
                path: checkout,
                date: days_ago(400),
            }]
        );
    }
}
