mod artifacts;
mod catalog;
mod cleaner;
mod error;
mod events;

pub use artifacts::{BuildArtifacts, CheckoutArtifacts};
pub use catalog::BuildCatalog;
pub use cleaner::{CleanupSummary, StaleBuildCleaner};
pub use error::{CleanerError, Result};
pub use events::{CleanupEvents, TracingEvents};
