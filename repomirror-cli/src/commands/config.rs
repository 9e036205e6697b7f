//! `repomirror config` — show the resolved configuration.

use anyhow::{Context, Result};
use clap::Args;
use tabled::{settings::Style, Table, Tabled};

use repomirror_core::{AppConfig, InstanceConfig};

/// Arguments for `repomirror config`.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Tabled)]
struct SettingRow {
    #[tabled(rename = "setting")]
    key: String,
    #[tabled(rename = "value")]
    value: String,
}

impl ConfigArgs {
    pub fn run(self) -> Result<()> {
        let config = super::load_config()?;

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&config.redacted())
                    .context("failed to serialize configuration JSON")?
            );
            return Ok(());
        }

        let mut table = Table::new(setting_rows(&config));
        table.with(Style::rounded());
        println!("{table}");
        Ok(())
    }
}

fn setting_rows(config: &AppConfig) -> Vec<SettingRow> {
    let row = |key: &str, value: String| SettingRow {
        key: key.to_string(),
        value,
    };

    let mut rows = vec![row("source", describe_instance(&config.source))];
    for target in &config.targets {
        rows.push(row("target", describe_instance(target)));
    }
    rows.extend([
        row("repo name prefix", config.sync.repo_name_prefix.clone()),
        row("sync interval", format!("{}s", config.sync_interval.as_secs())),
        row("drain attempts", config.sync.drain_max_attempts.to_string()),
        row(
            "drain retry delay",
            format!("{}ms", config.sync.drain_retry_delay.as_millis()),
        ),
        row("settle delay", format!("{}ms", config.sync.settle_delay.as_millis())),
        row("parallel targets", config.sync.parallel_targets.to_string()),
        row(
            "request timeout",
            format!("{}s", config.request_timeout.as_secs()),
        ),
        row("console log level", config.log.console_level.clone()),
        row("log dir", config.log.dir.display().to_string()),
        row("log file cap", format!("{} bytes", config.log.max_file_bytes)),
    ]);
    rows
}

fn describe_instance(instance: &InstanceConfig) -> String {
    let credentials = &instance.credentials;
    let password = if credentials.password.is_empty() {
        "no password"
    } else {
        "password <redacted>"
    };
    if credentials.username.is_empty() {
        format!("{} {} (anonymous, {password})", instance.name, instance.url)
    } else {
        format!(
            "{} {} (user {}, {password})",
            instance.name, instance.url, credentials.username
        )
    }
}
