//! Application configuration loaded from environment variables.
//!
//! [`AppConfig::from_env`] reads the process environment;
//! [`AppConfig::from_lookup`] takes any key lookup so tests can feed a map.

use std::path::PathBuf;
use std::time::Duration;

use serde_json::{json, Value};

use crate::error::ConfigError;
use crate::types::Credentials;

pub const DEFAULT_REPO_NAME_PREFIX: &str = "remote-";
pub const DEFAULT_SYNC_INTERVAL: Duration = Duration::from_secs(300);
pub const DEFAULT_DRAIN_MAX_ATTEMPTS: u32 = 10;
pub const DEFAULT_DRAIN_RETRY_DELAY: Duration = Duration::from_millis(3000);
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(500);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_LOG_DIR: &str = "./server-logs";
pub const DEFAULT_LOG_MAX_FILE_SIZE_MB: u64 = 10;

/// Name the source instance is logged under.
pub const SOURCE_INSTANCE_NAME: &str = "MAIN";

/// Connection details for one instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceConfig {
    pub name: String,
    /// Base URL without trailing slash.
    pub url: String,
    pub credentials: Credentials,
}

/// Knobs of the reconciliation engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncSettings {
    pub repo_name_prefix: String,
    /// Polls of a workspace's repository list before a drain is abandoned.
    pub drain_max_attempts: u32,
    /// Fixed pause between drain polls.
    pub drain_retry_delay: Duration,
    /// Pause between workspace and repository reconciliation of a target.
    pub settle_delay: Duration,
    /// Reconcile targets on one thread each instead of one after another.
    pub parallel_targets: bool,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            repo_name_prefix: DEFAULT_REPO_NAME_PREFIX.to_string(),
            drain_max_attempts: DEFAULT_DRAIN_MAX_ATTEMPTS,
            drain_retry_delay: DEFAULT_DRAIN_RETRY_DELAY,
            settle_delay: DEFAULT_SETTLE_DELAY,
            parallel_targets: false,
        }
    }
}

/// Console verbosity and on-disk log limits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    /// A `tracing` level directive: `error`, `warn`, `info`, `debug` or `trace`.
    pub console_level: String,
    pub dir: PathBuf,
    pub max_file_bytes: u64,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            console_level: "info".to_string(),
            dir: PathBuf::from(DEFAULT_LOG_DIR),
            max_file_bytes: DEFAULT_LOG_MAX_FILE_SIZE_MB * 1024 * 1024,
        }
    }
}

/// Fully resolved configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub source: InstanceConfig,
    pub targets: Vec<InstanceConfig>,
    pub sync: SyncSettings,
    pub log: LogSettings,
    pub sync_interval: Duration,
    pub request_timeout: Duration,
    pub print_env: bool,
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// Required:
    /// - `MAIN_INSTANCE_URL`, `MAIN_INSTANCE_USERNAME`, `MAIN_INSTANCE_PASSWORD`
    /// - `TARGET_INSTANCES`: comma-separated names; each `NAME` needs `NAME_URL`
    ///   and may set `NAME_USERNAME` / `NAME_PASSWORD`
    ///
    /// Optional: `REPO_NAME_PREFIX`, `SYNC_INTERVAL_SECONDS`,
    /// `DRAIN_MAX_ATTEMPTS`, `DRAIN_RETRY_DELAY_MS`, `SETTLE_DELAY_MS`,
    /// `REQUEST_TIMEOUT_SECONDS`, `PARALLEL_TARGETS`, `CONSOLE_LOG_LEVEL`,
    /// `LOG_DIR`, `LOG_MAX_FILE_SIZE_MB`, `IS_PRINT_ENV`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env { lookup };

        let source = InstanceConfig {
            name: SOURCE_INSTANCE_NAME.to_string(),
            url: normalize_url(&env.required("MAIN_INSTANCE_URL")?),
            credentials: Credentials::new(
                env.required("MAIN_INSTANCE_USERNAME")?,
                env.required("MAIN_INSTANCE_PASSWORD")?,
            ),
        };
        if source.url.is_empty() {
            return Err(ConfigError::Invalid {
                key: "MAIN_INSTANCE_URL".to_string(),
                value: String::new(),
                reason: "must not be empty".to_string(),
            });
        }

        let targets = parse_target_names(&env.required("TARGET_INSTANCES")?)
            .into_iter()
            .map(|name| env.target(name))
            .collect::<Result<Vec<_>, _>>()?;

        let sync = SyncSettings {
            repo_name_prefix: env
                .optional("REPO_NAME_PREFIX")
                .unwrap_or_else(|| DEFAULT_REPO_NAME_PREFIX.to_string()),
            drain_max_attempts: env
                .parsed("DRAIN_MAX_ATTEMPTS", DEFAULT_DRAIN_MAX_ATTEMPTS as u64)?
                .try_into()
                .map_err(|_| ConfigError::Invalid {
                    key: "DRAIN_MAX_ATTEMPTS".to_string(),
                    value: env.optional("DRAIN_MAX_ATTEMPTS").unwrap_or_default(),
                    reason: "out of range".to_string(),
                })?,
            drain_retry_delay: Duration::from_millis(env.parsed(
                "DRAIN_RETRY_DELAY_MS",
                DEFAULT_DRAIN_RETRY_DELAY.as_millis() as u64,
            )?),
            settle_delay: Duration::from_millis(
                env.parsed("SETTLE_DELAY_MS", DEFAULT_SETTLE_DELAY.as_millis() as u64)?,
            ),
            parallel_targets: env.flag("PARALLEL_TARGETS", false)?,
        };

        let max_file_mb = env.parsed("LOG_MAX_FILE_SIZE_MB", DEFAULT_LOG_MAX_FILE_SIZE_MB)?;
        let max_file_bytes = max_file_mb
            .checked_mul(1024 * 1024)
            .ok_or_else(|| ConfigError::Invalid {
                key: "LOG_MAX_FILE_SIZE_MB".to_string(),
                value: max_file_mb.to_string(),
                reason: "out of range".to_string(),
            })?;

        let log = LogSettings {
            console_level: parse_log_level(
                env.optional("CONSOLE_LOG_LEVEL").as_deref().unwrap_or("info"),
            )?,
            dir: env
                .optional("LOG_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_DIR)),
            max_file_bytes,
        };

        let sync_interval = Duration::from_secs(
            env.parsed("SYNC_INTERVAL_SECONDS", DEFAULT_SYNC_INTERVAL.as_secs())?,
        );
        if sync_interval.is_zero() {
            return Err(ConfigError::Invalid {
                key: "SYNC_INTERVAL_SECONDS".to_string(),
                value: "0".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }

        let request_timeout = Duration::from_secs(
            env.parsed("REQUEST_TIMEOUT_SECONDS", DEFAULT_REQUEST_TIMEOUT.as_secs())?,
        );

        Ok(Self {
            source,
            targets,
            sync,
            log,
            sync_interval,
            request_timeout,
            print_env: env.flag("IS_PRINT_ENV", false)?,
        })
    }

    /// JSON view with every password replaced, for `IS_PRINT_ENV` and
    /// `repomirror config`.
    pub fn redacted(&self) -> Value {
        let instance = |i: &InstanceConfig| {
            json!({
                "name": i.name,
                "url": i.url,
                "username": i.credentials.username,
                "password": if i.credentials.password.is_empty() { "" } else { "<redacted>" },
            })
        };
        json!({
            "source": instance(&self.source),
            "targets": self.targets.iter().map(instance).collect::<Vec<_>>(),
            "repo_name_prefix": self.sync.repo_name_prefix,
            "sync_interval_seconds": self.sync_interval.as_secs(),
            "drain_max_attempts": self.sync.drain_max_attempts,
            "drain_retry_delay_ms": self.sync.drain_retry_delay.as_millis() as u64,
            "settle_delay_ms": self.sync.settle_delay.as_millis() as u64,
            "parallel_targets": self.sync.parallel_targets,
            "request_timeout_seconds": self.request_timeout.as_secs(),
            "console_log_level": self.log.console_level,
            "log_dir": self.log.dir.display().to_string(),
            "log_max_file_bytes": self.log.max_file_bytes,
        })
    }
}

struct Env<F> {
    lookup: F,
}

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn optional(&self, key: &str) -> Option<String> {
        (self.lookup)(key)
    }

    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.optional(key).ok_or_else(|| ConfigError::Missing {
            key: key.to_string(),
        })
    }

    fn parsed(&self, key: &str, default: u64) -> Result<u64, ConfigError> {
        match self.optional(key) {
            None => Ok(default),
            Some(raw) => raw.trim().parse::<u64>().map_err(|err| ConfigError::Invalid {
                key: key.to_string(),
                value: raw.clone(),
                reason: err.to_string(),
            }),
        }
    }

    fn flag(&self, key: &str, default: bool) -> Result<bool, ConfigError> {
        let Some(raw) = self.optional(key) else {
            return Ok(default);
        };
        match raw.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => Ok(true),
            "false" | "0" | "" => Ok(false),
            _ => Err(ConfigError::Invalid {
                key: key.to_string(),
                value: raw,
                reason: "expected true or false".to_string(),
            }),
        }
    }

    fn target(&self, name: String) -> Result<InstanceConfig, ConfigError> {
        let upper = name.to_uppercase();
        let url_key = format!("{upper}_URL");
        let url = normalize_url(&self.required(&url_key)?);
        if url.is_empty() {
            return Err(ConfigError::Invalid {
                key: url_key,
                value: String::new(),
                reason: "must not be empty".to_string(),
            });
        }
        Ok(InstanceConfig {
            url,
            credentials: Credentials::new(
                self.optional(&format!("{upper}_USERNAME")).unwrap_or_default(),
                self.optional(&format!("{upper}_PASSWORD")).unwrap_or_default(),
            ),
            name,
        })
    }
}

/// Split `TARGET_INSTANCES`: trimmed, blanks dropped, order kept.
pub fn parse_target_names(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

fn normalize_url(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_string()
}

fn parse_log_level(raw: &str) -> Result<String, ConfigError> {
    let level = match raw.trim().to_ascii_lowercase().as_str() {
        "error" => "error",
        "warn" | "warning" => "warn",
        "info" => "info",
        "debug" => "debug",
        "trace" | "verbose" => "trace",
        _ => {
            return Err(ConfigError::Invalid {
                key: "CONSOLE_LOG_LEVEL".to_string(),
                value: raw.to_string(),
                reason: "expected error, warn, info, debug, trace or verbose".to_string(),
            })
        }
    };
    Ok(level.to_string())
}
