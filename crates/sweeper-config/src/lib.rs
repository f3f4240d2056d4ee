mod config;
pub mod constants;

pub use config::{SweeperConfig, parse_sweeper_toml};
