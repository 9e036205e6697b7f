//! Size-capped log files.
//!
//! `combined.log` and the per-level files never grow past the configured size. When a
//! write would cross the cap, the live file is renamed to `<name>.1` (the
//! previous backup is replaced) and a fresh file is opened.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use tracing_subscriber::fmt::MakeWriter;

use crate::error::{io_err, DaemonError};

/// Rotate `log_path` to `<name>.1` if its size is at least `max_bytes`.
///
/// Returns `true` if rotation occurred, `false` if the file was under the
/// threshold or did not exist yet.
pub fn rotate_if_needed(log_path: &Path, max_bytes: u64) -> io::Result<bool> {
    let size = match fs::metadata(log_path) {
        Ok(meta) => meta.len(),
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(err) => return Err(err),
    };

    if size < max_bytes {
        return Ok(false);
    }

    rotate(log_path)?;
    Ok(true)
}

/// Replace the single backup with the live file.
fn rotate(log_path: &Path) -> io::Result<()> {
    let backup = backup_path(log_path);
    if backup.exists() {
        fs::remove_file(&backup)?;
    }
    fs::rename(log_path, backup)
}

/// Path of the rotated copy of `base` (e.g. `error.log.1`).
pub fn backup_path(base: &Path) -> PathBuf {
    let name = base
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("repomirror.log");
    base.with_file_name(format!("{name}.1"))
}

struct CappedState {
    path: PathBuf,
    file: File,
    written: u64,
    max_bytes: u64,
}

impl CappedState {
    fn write_record(&mut self, buf: &[u8]) -> io::Result<()> {
        let incoming = buf.len() as u64;
        if self.written > 0 && self.written + incoming > self.max_bytes {
            self.file.flush()?;
            rotate(&self.path)?;
            self.file = open_append(&self.path)?;
            self.written = 0;
        }
        self.file.write_all(buf)?;
        self.written += incoming;
        Ok(())
    }
}

/// Append-only log file that rotates itself before crossing `max_bytes`.
///
/// Implements [`MakeWriter`] so it can back a `tracing_subscriber` fmt layer
/// directly. One record is never split across files; a single record larger
/// than the cap is written to an otherwise empty file.
pub struct SizeCappedFile {
    state: Mutex<CappedState>,
}

impl SizeCappedFile {
    /// Open (or create) `path` for appending. A leftover file that is already
    /// at the cap is rotated first.
    pub fn open(path: impl Into<PathBuf>, max_bytes: u64) -> Result<Self, DaemonError> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
            }
        }
        rotate_if_needed(&path, max_bytes).map_err(|e| io_err(&path, e))?;

        let file = open_append(&path).map_err(|e| io_err(&path, e))?;
        let written = file.metadata().map_err(|e| io_err(&path, e))?.len();
        Ok(Self {
            state: Mutex::new(CappedState {
                path,
                file,
                written,
                max_bytes,
            }),
        })
    }

    fn lock(&self) -> MutexGuard<'_, CappedState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Write for &SizeCappedFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.lock().write_record(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.lock().file.flush()
    }
}

pub struct CappedWriter<'a>(MutexGuard<'a, CappedState>);

impl Write for CappedWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.write_record(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.0.file.flush()
    }
}

impl<'a> MakeWriter<'a> for SizeCappedFile {
    type Writer = CappedWriter<'a>;

    fn make_writer(&'a self) -> Self::Writer {
        CappedWriter(self.lock())
    }
}

fn open_append(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}
