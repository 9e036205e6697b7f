use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use crate::paths::VERSION_FILE;

pub const UNKNOWN_VERSION: &str = "unknown";

static VERSION: OnceLock<String> = OnceLock::new();

/// Version string from `repoflow-version.txt` in the working directory,
/// read once and cached for the life of the process.
pub fn version() -> &'static str {
    VERSION.get_or_init(|| read_version(Path::new(VERSION_FILE)))
}

/// Trimmed contents of `path`, or `unknown` when it is missing, unreadable
/// or blank.
pub fn read_version(path: &Path) -> String {
    match fs::read_to_string(path) {
        Ok(raw) if !raw.trim().is_empty() => raw.trim().to_string(),
        Ok(_) => UNKNOWN_VERSION.to_string(),
        Err(err) => {
            tracing::debug!(path = %path.display(), error = %err, "version file not readable");
            UNKNOWN_VERSION.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn version_is_trimmed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(VERSION_FILE);
        fs::write(&path, "  2.4.1\n").unwrap();
        assert_eq!(read_version(&path), "2.4.1");
    }

    #[test]
    fn missing_file_reads_as_unknown() {
        let dir = TempDir::new().unwrap();
        assert_eq!(read_version(&dir.path().join(VERSION_FILE)), UNKNOWN_VERSION);
    }

    #[test]
    fn blank_file_reads_as_unknown() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(VERSION_FILE);
        fs::write(&path, "\n\t \n").unwrap();
        assert_eq!(read_version(&path), UNKNOWN_VERSION);
    }

    #[test]
    fn cached_version_is_stable() {
        assert_eq!(version(), version());
    }
}
