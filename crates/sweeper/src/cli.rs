use clap::Parser;
use std::path::PathBuf;
use sweeper_config::constants;

/// Clean up stale build paths per project version.
#[derive(Parser, Debug)]
#[command(name = "sweeper", version, about)]
pub struct Cli {
    /// Find builds older than DAYS days [default: 365, or retention_days from the config file]
    #[arg(long, value_name = "DAYS")]
    pub days: Option<u32>,

    /// Perform dry run on build cleanup
    #[arg(long)]
    pub dryrun: bool,

    /// Apply pending database migrations before cleaning
    #[arg(long)]
    pub migrate: bool,

    /// Path to sweeper.toml
    #[arg(long, env = "SWEEPER_CONFIG", default_value = constants::DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,
}
