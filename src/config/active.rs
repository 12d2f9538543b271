//! Active (runtime-mutable) configuration.
//!
//! Values live in one `[group]` table of a TOML file, keyed by the decimal
//! key id. Other tables in the same file are preserved on write. Readers see
//! an immutable snapshot swapped in atomically on every write or reload.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use parking_lot::Mutex;

use crate::config::loader::{load_document, save_document};
use crate::config::schema::{ActiveKeyMap, ConfigKey, ConfigValue};
use crate::config::store::ConfigStore;
use crate::error::{HostError, Result, Severity};

struct Snapshot {
    keys: Arc<ActiveKeyMap>,
    values: HashMap<ConfigKey, ConfigValue>,
}

#[derive(Debug, Clone)]
struct Location {
    path: PathBuf,
    group: String,
}

/// TOML-backed key/value store with hot reload.
pub struct ActiveConfig {
    snapshot: ArcSwapOption<Snapshot>,
    /// Serializes writers; `None` while uninitialized.
    location: Mutex<Option<Location>>,
}

impl Default for ActiveConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ActiveConfig {
    pub fn new() -> Self {
        Self {
            snapshot: ArcSwapOption::empty(),
            location: Mutex::new(None),
        }
    }

    /// Open (creating if needed) the store at `path` and read `group`.
    pub fn initialize(&self, keys: ActiveKeyMap, path: &Path, group: &str) -> Result<()> {
        let mut location = self.location.lock();
        if location.is_some() {
            return Err(HostError::AlreadyInitialized);
        }

        if !path.exists() {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            let mut document = toml::Table::new();
            document.insert(group.to_string(), toml::Value::Table(toml::Table::new()));
            save_document(path, &document)?;
            tracing::info!(path = %path.display(), "Created active configuration file");
        }

        let document = load_document(path)?;
        let values = read_group(&keys, &document, group);
        tracing::info!(
            path = %path.display(),
            group,
            keys = keys.len(),
            stored = values.len(),
            "Active configuration initialized"
        );

        self.snapshot.store(Some(Arc::new(Snapshot {
            keys: Arc::new(keys),
            values,
        })));
        *location = Some(Location {
            path: path.to_path_buf(),
            group: group.to_string(),
        });
        Ok(())
    }

    /// Release the store. Reads fail with `NotInitialized` afterwards.
    pub fn uninitialize(&self) -> Result<()> {
        let mut location = self.location.lock();
        if location.take().is_none() {
            return Err(HostError::NotInitialized(Severity::Info));
        }
        self.snapshot.store(None);
        tracing::debug!("Active configuration released");
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.location.lock().is_some()
    }

    /// Backing file, if initialized.
    pub fn path(&self) -> Option<PathBuf> {
        self.location.lock().as_ref().map(|l| l.path.clone())
    }

    /// Store `value` under `key` and persist it.
    pub fn set_value(&self, key: ConfigKey, value: impl Into<ConfigValue>) -> Result<()> {
        let value = value.into();
        let location = self.location.lock();
        let location = location
            .as_ref()
            .ok_or(HostError::NotInitialized(Severity::Error))?;
        let current = self
            .snapshot
            .load_full()
            .ok_or(HostError::NotInitialized(Severity::Error))?;
        if !current.keys.contains(key) {
            return Err(HostError::NotFound(format!("active config key {key}")));
        }

        let mut document = load_document(&location.path)?;
        let group = document
            .entry(location.group.clone())
            .or_insert_with(|| toml::Value::Table(toml::Table::new()));
        let Some(table) = group.as_table_mut() else {
            return Err(HostError::InvalidArgument(format!(
                "[{}] is not a table",
                location.group
            )));
        };
        table.insert(key.to_string(), value.to_toml());
        save_document(&location.path, &document)?;

        let mut values = current.values.clone();
        values.insert(key, value);
        self.snapshot.store(Some(Arc::new(Snapshot {
            keys: current.keys.clone(),
            values,
        })));
        tracing::debug!(key, "Active configuration value stored");
        Ok(())
    }

    /// Re-read the backing file. On failure the previous values stay.
    pub fn reload(&self) -> Result<()> {
        let location = self.location.lock();
        let location = location
            .as_ref()
            .ok_or(HostError::NotInitialized(Severity::Error))?;
        let current = self
            .snapshot
            .load_full()
            .ok_or(HostError::NotInitialized(Severity::Error))?;

        let document = load_document(&location.path)?;
        let values = read_group(&current.keys, &document, &location.group);
        self.snapshot.store(Some(Arc::new(Snapshot {
            keys: current.keys.clone(),
            values,
        })));
        tracing::info!(path = %location.path.display(), "Active configuration reloaded");
        Ok(())
    }
}

impl ConfigStore for ActiveConfig {
    fn value(&self, key: ConfigKey) -> Result<ConfigValue> {
        let guard = self.snapshot.load();
        let Some(snapshot) = &*guard else {
            return Err(HostError::NotInitialized(Severity::Error));
        };
        let Some(entry) = snapshot.keys.get(key) else {
            return Err(HostError::NotFound(format!("active config key {key}")));
        };
        if let Some(value) = snapshot.values.get(&key) {
            return Ok(value.clone());
        }
        entry
            .default
            .clone()
            .ok_or_else(|| HostError::DoesNotExist(format!("active config key {key}")))
    }
}

fn read_group(keys: &ActiveKeyMap, document: &toml::Table, group: &str) -> HashMap<ConfigKey, ConfigValue> {
    let mut values = HashMap::new();
    let Some(table) = document.get(group).and_then(toml::Value::as_table) else {
        tracing::warn!(group, "Active configuration group missing, using defaults");
        return values;
    };

    for (name, raw) in table {
        let Ok(key) = name.parse::<ConfigKey>() else {
            tracing::warn!(group, entry = %name, "Ignoring non-numeric active configuration key");
            continue;
        };
        if !keys.contains(key) {
            continue;
        }
        match ConfigValue::from_toml(raw) {
            Some(value) => {
                values.insert(key, value);
            }
            None => {
                tracing::warn!(group, key, found = raw.type_str(), "Ignoring unsupported active configuration value");
            }
        }
    }
    values
}
