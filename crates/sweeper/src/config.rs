use crate::cli::Cli;
use anyhow::Context;
use std::path::PathBuf;
use sweeper_config::{SweeperConfig, parse_sweeper_toml};

/// Effective settings after layering CLI flags, environment and config file.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub database_url: String,
    pub docroot: PathBuf,
    pub days: u32,
}

pub async fn load_settings(cli: &Cli) -> anyhow::Result<Settings> {
    let file = parse_sweeper_toml(&cli.config)
        .await
        .with_context(|| format!("Failed to read config file {:?}", cli.config))?;

    resolve(
        cli,
        file,
        std::env::var("DATABASE_URL").ok(),
        std::env::var("DOCROOT").ok(),
    )
}

fn resolve(
    cli: &Cli,
    file: SweeperConfig,
    env_database_url: Option<String>,
    env_docroot: Option<String>,
) -> anyhow::Result<Settings> {
    let database_url = env_database_url
        .or_else(|| file.database_url.clone())
        .context("DATABASE_URL must be set")?;

    Ok(Settings {
        database_url,
        docroot: env_docroot
            .map(PathBuf::from)
            .unwrap_or_else(|| file.docroot.clone()),
        days: cli.days.unwrap_or_else(|| file.retention_days()),
    })
}
