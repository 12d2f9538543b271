//! Active configuration file watcher for hot reload.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};

use crate::config::active::ActiveConfig;

/// Reloads an [`ActiveConfig`] whenever its backing file changes.
///
/// The parent directory is watched rather than the file itself, since writes
/// replace the file by rename.
pub struct ConfigWatcher {
    path: PathBuf,
    config: Weak<ActiveConfig>,
}

impl ConfigWatcher {
    pub fn new(path: &Path, config: &Arc<ActiveConfig>) -> Self {
        Self {
            path: path.to_path_buf(),
            config: Arc::downgrade(config),
        }
    }

    /// Start watching in the notify backend thread. Dropping the returned
    /// watcher stops it.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let config = self.config.clone();
        let file_name = self.path.file_name().map(|n| n.to_os_string());
        let directory = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if !(event.kind.is_modify() || event.kind.is_create()) {
                        return;
                    }
                    let touches_file = event
                        .paths
                        .iter()
                        .any(|p| p.file_name().map(|n| n.to_os_string()) == file_name);
                    if !touches_file {
                        return;
                    }
                    let Some(config) = config.upgrade() else {
                        return;
                    };
                    tracing::info!("Active config change detected, reloading...");
                    if let Err(e) = config.reload() {
                        tracing::error!(error = %e, "Failed to reload active config. Keeping current values.");
                    }
                }
                Err(e) => tracing::error!("Watch error: {:?}", e),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&directory, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?self.path, "Active config watcher started");
        Ok(watcher)
    }
}
