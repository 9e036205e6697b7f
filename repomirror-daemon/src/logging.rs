use std::fs;

use tracing_subscriber::filter::{filter_fn, LevelFilter};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer, Registry};

use repomirror_core::LogSettings;

use crate::error::{io_err, DaemonError};
use crate::log_rotation::SizeCappedFile;
use crate::paths::{combined_log_path, LEVEL_LOGS};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Install the global subscriber: console output on stderr filtered by
/// `RUST_LOG` (or the configured console level), `combined.log` with every
/// event, and one file per level (`error.log` … `verbose.log`).
pub fn init_tracing(settings: &LogSettings) -> Result<(), DaemonError> {
    fs::create_dir_all(&settings.dir).map_err(|e| io_err(&settings.dir, e))?;

    let mut files: Vec<BoxedLayer> = Vec::with_capacity(LEVEL_LOGS.len() + 1);
    let combined = SizeCappedFile::open(combined_log_path(&settings.dir), settings.max_file_bytes)?;
    files.push(
        fmt::layer()
            .with_ansi(false)
            .with_writer(combined)
            .with_filter(LevelFilter::TRACE)
            .boxed(),
    );
    for (level, name) in LEVEL_LOGS {
        let file = SizeCappedFile::open(settings.dir.join(name), settings.max_file_bytes)?;
        files.push(
            fmt::layer()
                .with_ansi(false)
                .with_writer(file)
                .with_filter(filter_fn(move |meta| *meta.level() == level))
                .boxed(),
        );
    }

    tracing_subscriber::registry()
        .with(files)
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr)
                .with_filter(console_filter(&settings.console_level)),
        )
        .try_init()
        .map_err(|err| DaemonError::Logging(err.to_string()))
}

fn console_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}
