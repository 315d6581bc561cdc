use std::path::PathBuf;

use anyhow::{Context, Result};
use config::{Config, Environment};
use serde::Deserialize;

pub const ENV_PREFIX: &str = "FORMABLES";

/// Run configuration: built-in defaults, overridden by `FORMABLES_*`
/// environment variables, then by command-line flags.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub host: String,
    pub listing_path: String,
    pub cache_dir: PathBuf,
    pub output: PathBuf,
    pub max_retries: u32,
    pub base_backoff_ms: u64,
    pub min_interval_ms: u64,
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Settings {
    pub fn load() -> Result<Self> {
        Self::from_env(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
    }

    fn from_env(env: Environment) -> Result<Self> {
        Config::builder()
            .set_default("host", "https://eu4.paradoxwikis.com")?
            .set_default("listing_path", "/Formable_countries")?
            .set_default("cache_dir", "_temp")?
            .set_default("output", "results.csv")?
            .set_default("max_retries", 3_i64)?
            .set_default("base_backoff_ms", 2000_i64)?
            .set_default("min_interval_ms", 500_i64)?
            .set_default("timeout_secs", 30_i64)?
            .set_default(
                "user_agent",
                concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")),
            )?
            .add_source(env)
            .build()
            .and_then(Config::try_deserialize)
            .context("Invalid settings")
    }
}
