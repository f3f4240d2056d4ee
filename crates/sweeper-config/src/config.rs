use crate::constants;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct SweeperConfig {
    #[serde(default)]
    pub database_url: Option<String>,

    #[serde(default = "default_docroot")]
    pub docroot: PathBuf,

    #[serde(default)]
    pub retention_days: Option<u32>,
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            docroot: default_docroot(),
            retention_days: None,
        }
    }
}

impl SweeperConfig {
    pub fn retention_days(&self) -> u32 {
        self.retention_days.unwrap_or(constants::DEFAULT_RETENTION_DAYS)
    }
}

fn default_docroot() -> PathBuf {
    PathBuf::from(constants::DEFAULT_DOCROOT)
}

/// Reads `sweeper.toml` from `config_path`. A missing file yields the defaults.
pub async fn parse_sweeper_toml(config_path: &Path) -> std::io::Result<SweeperConfig> {
    if !config_path.exists() {
        debug!("No config file at {:?}, using defaults", config_path);
        return Ok(SweeperConfig::default());
    }

    let content = tokio::fs::read_to_string(config_path).await?;
    let config: SweeperConfig = toml::from_str(&content)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

    Ok(config)
}
