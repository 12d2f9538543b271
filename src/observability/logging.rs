//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the global tracing subscriber
//! - Route log output to a size-rotated file
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - Log level configurable via `RUST_LOG`, default `modhost=info`
//! - A second initialization keeps the first subscriber

use std::path::PathBuf;
use std::sync::Mutex;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::error::Result;
use crate::observability::rotation::RotatingFile;

/// Filter used when `RUST_LOG` is not set.
pub const DEFAULT_FILTER: &str = "modhost=info";

/// Where and how much to log.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    pub folder: PathBuf,
    pub file_name: String,
    /// Rotate once the active file reaches this size in bytes.
    pub max_file_size: u64,
    /// Files kept, the active one included.
    pub max_files: usize,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            folder: PathBuf::from("./log"),
            file_name: "modhost.log".to_string(),
            max_file_size: 10 * 1024 * 1024,
            max_files: 3,
        }
    }
}

impl LoggingSettings {
    pub fn file_path(&self) -> PathBuf {
        self.folder.join(&self.file_name)
    }
}

/// Install the global subscriber writing to the rotating log file.
pub fn init_logging(settings: &LoggingSettings) -> Result<()> {
    std::fs::create_dir_all(&settings.folder)?;
    let file = RotatingFile::open(settings.file_path(), settings.max_file_size, settings.max_files)?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_ansi(false)
                .with_target(true)
                .with_thread_names(true)
                .with_writer(Mutex::new(file)),
        )
        .try_init();

    match installed {
        Ok(()) => tracing::info!(
            path = %settings.file_path().display(),
            max_file_size = settings.max_file_size,
            max_files = settings.max_files,
            "Logging initialized"
        ),
        Err(e) => tracing::debug!(error = %e, "Global subscriber already installed, keeping it"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_creates_folder_and_tolerates_reinit() {
        let dir = tempfile::tempdir().unwrap();
        let settings = LoggingSettings {
            folder: dir.path().join("nested").join("log"),
            file_name: "test.log".into(),
            max_file_size: 1024,
            max_files: 2,
        };

        init_logging(&settings).unwrap();
        init_logging(&settings).unwrap();
        assert!(settings.file_path().exists());
    }
}
