pub mod config;
pub mod once;
pub mod run;
pub mod version;

use anyhow::{Context, Result};
use repomirror_core::AppConfig;

pub(crate) fn load_config() -> Result<AppConfig> {
    AppConfig::from_env().context("invalid configuration")
}
