//! `repomirror run` — foreground scheduler.

use anyhow::{Context, Result};

use repomirror_daemon::{init_tracing, start_blocking};

pub fn run() -> Result<()> {
    let config = super::load_config()?;
    init_tracing(&config.log).context("failed to set up logging")?;
    start_blocking(config).context("daemon exited with error")
}
