pub const DEFAULT_RETENTION_DAYS: u32 = 365;

pub const DEFAULT_DOCROOT: &str = "/var/lib/sweeper/docs";
pub const CHECKOUTS_DIR: &str = "checkouts";

pub const DEFAULT_CONFIG_PATH: &str = "/etc/sweeper/sweeper.toml";
