use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CleanerError {
    #[error("failed to remove build path {path:?}: {source}")]
    RemovePath {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to inspect build path {path:?}: {source}")]
    InspectPath {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Store(#[from] sweeper_store::StoreError),

    #[error(transparent)]
    Database(#[from] sea_orm::DbErr),
}

pub type Result<T> = std::result::Result<T, CleanerError>;
