use crate::{CleanerError, Result};
use async_trait::async_trait;
use entity::versions;
use std::path::{Component, Path, PathBuf};
use sweeper_config::constants;
use tracing::{debug, warn};

/// On-disk build output of a version.
#[async_trait]
pub trait BuildArtifacts: Send + Sync {
    /// Path of the version's build output, or `None` when there is nothing on disk.
    async fn build_path(&self, version: &versions::Model) -> Result<Option<PathBuf>>;

    /// Removes the version's build output. Returns `false` when it was already gone.
    async fn clean_build_path(&self, version: &versions::Model) -> Result<bool>;
}

/// Version checkouts laid out as `<docroot>/<project>/checkouts/<version>`.
#[derive(Debug, Clone)]
pub struct CheckoutArtifacts {
    docroot: PathBuf,
}

impl CheckoutArtifacts {
    pub fn new(docroot: impl Into<PathBuf>) -> Self {
        Self {
            docroot: docroot.into(),
        }
    }

    /// Checkout location for a version, whether or not it exists.
    ///
    /// Returns `None` when either slug is not a single plain path component.
    pub fn checkout_path(&self, project_slug: &str, version_slug: &str) -> Option<PathBuf> {
        if !is_single_component(project_slug) || !is_single_component(version_slug) {
            return None;
        }

        Some(
            self.docroot
                .join(project_slug)
                .join(constants::CHECKOUTS_DIR)
                .join(version_slug),
        )
    }

    fn version_checkout(&self, version: &versions::Model) -> Option<PathBuf> {
        let path = self.checkout_path(&version.project_slug, &version.slug);
        if path.is_none() {
            warn!(
                project_slug = %version.project_slug,
                version_slug = %version.slug,
                "Refusing to build a checkout path from unsafe slugs"
            );
        }
        path
    }
}

fn is_single_component(slug: &str) -> bool {
    let mut components = Path::new(slug).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

#[async_trait]
impl BuildArtifacts for CheckoutArtifacts {
    async fn build_path(&self, version: &versions::Model) -> Result<Option<PathBuf>> {
        let Some(path) = self.version_checkout(version) else {
            return Ok(None);
        };

        match tokio::fs::try_exists(&path).await {
            Ok(true) => Ok(Some(path)),
            Ok(false) => Ok(None),
            Err(source) => Err(CleanerError::InspectPath { path, source }),
        }
    }

    async fn clean_build_path(&self, version: &versions::Model) -> Result<bool> {
        let Some(path) = self.version_checkout(version) else {
            return Ok(false);
        };

        let metadata = match tokio::fs::symlink_metadata(&path).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("Build path {:?} already removed", path);
                return Ok(false);
            }
            Err(source) => return Err(CleanerError::RemovePath { path, source }),
        };

        let removed = if metadata.is_dir() {
            tokio::fs::remove_dir_all(&path).await
        } else {
            tokio::fs::remove_file(&path).await
        };

        match removed {
            Ok(()) => {
                debug!("Removed build path {:?}", path);
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(CleanerError::RemovePath { path, source }),
        }
    }
}
