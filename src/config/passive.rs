//! Passive (static) configuration.
//!
//! Read once at startup from a TOML file and immutable afterwards. Values are
//! addressed by key id; the key map names the `[group]` table and entry each
//! id is read from.

use std::collections::{BTreeMap, HashMap};
use std::io::ErrorKind as IoErrorKind;
use std::path::Path;

use crate::config::loader::{load_document, ConfigError};
use crate::config::schema::{ConfigKey, ConfigValue, PassiveKeyMap};
use crate::config::store::ConfigStore;
use crate::config::validation::validate_passive;
use crate::error::{HostError, Result};

#[derive(Debug, Clone)]
pub struct PassiveConfig {
    keys: PassiveKeyMap,
    values: HashMap<ConfigKey, ConfigValue>,
}

impl PassiveConfig {
    /// Load values for `keys` from `path`.
    ///
    /// A missing file is not an error: every key resolves to its default.
    pub fn load(keys: PassiveKeyMap, path: &Path) -> std::result::Result<Self, ConfigError> {
        match load_document(path) {
            Ok(document) => {
                tracing::info!(path = %path.display(), "Passive configuration loaded");
                Self::from_document(keys, &document)
            }
            Err(ConfigError::Io(e)) if e.kind() == IoErrorKind::NotFound => {
                tracing::warn!(path = %path.display(), "Passive configuration file not found, using defaults");
                Ok(Self::defaults(keys))
            }
            Err(e) => Err(e),
        }
    }

    /// Only the key defaults.
    pub fn defaults(keys: PassiveKeyMap) -> Self {
        Self {
            keys,
            values: HashMap::new(),
        }
    }

    /// Resolve `keys` against an already parsed document.
    pub fn from_document(keys: PassiveKeyMap, document: &toml::Table) -> std::result::Result<Self, ConfigError> {
        validate_passive(&keys, document).map_err(ConfigError::Validation)?;

        let mut values = HashMap::new();
        for (id, key) in keys.iter() {
            let stored = document
                .get(&key.group)
                .and_then(toml::Value::as_table)
                .and_then(|table| table.get(&key.name))
                .and_then(ConfigValue::from_toml);
            if let Some(value) = stored {
                values.insert(id, value);
            }
        }

        Ok(Self { keys, values })
    }

    /// Effective values as `group.name`, for display. Keys without a value
    /// are left out.
    pub fn effective(&self) -> BTreeMap<String, ConfigValue> {
        self.keys
            .iter()
            .filter_map(|(id, key)| {
                self.value(id)
                    .ok()
                    .map(|value| (format!("{}.{}", key.group, key.name), value))
            })
            .collect()
    }
}

impl ConfigStore for PassiveConfig {
    fn value(&self, key: ConfigKey) -> Result<ConfigValue> {
        let Some(entry) = self.keys.get(key) else {
            return Err(HostError::NotFound(format!("passive config key {key}")));
        };
        if let Some(value) = self.values.get(&key) {
            return Ok(value.clone());
        }
        entry
            .default
            .clone()
            .ok_or_else(|| HostError::DoesNotExist(format!("[{}] {}", entry.group, entry.name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::PassiveKey;
    use crate::config::store::ConfigStoreExt;
    use crate::error::ErrorKind;

    fn keys() -> PassiveKeyMap {
        let mut keys = PassiveKeyMap::new();
        keys.insert(0, PassiveKey::new("Logging", "LogFolder", "./log")).unwrap();
        keys.insert(1, PassiveKey::new("Logging", "MaxLogFiles", 3i64)).unwrap();
        keys.insert(2, PassiveKey::required("Active", "Path")).unwrap();
        keys
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = PassiveConfig::load(keys(), &dir.path().join("absent.toml")).unwrap();

        assert_eq!(config.get::<String>(0).unwrap(), "./log");
        assert_eq!(config.get::<u32>(1).unwrap(), 3);
        assert_eq!(config.value(2).unwrap_err().kind(), ErrorKind::DoesNotExist);
        assert_eq!(config.value(42).unwrap_err().kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("host.toml");
        std::fs::write(&path, "[Logging]\nMaxLogFiles = 7\n[Active]\nPath = \"a.toml\"\n").unwrap();

        let config = PassiveConfig::load(keys(), &path).unwrap();
        assert_eq!(config.get::<u32>(1).unwrap(), 7);
        assert_eq!(config.get::<String>(2).unwrap(), "a.toml");

        let effective = config.effective();
        assert_eq!(effective.get("Logging.LogFolder"), Some(&ConfigValue::from("./log")));
        assert_eq!(effective.get("Active.Path"), Some(&ConfigValue::from("a.toml")));
    }

    #[test]
    fn test_invalid_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("host.toml");
        std::fs::write(&path, "[Logging]\nMaxLogFiles = \"many\"\n").unwrap();

        let err = PassiveConfig::load(keys(), &path).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(ref errors) if errors.len() == 1));
    }
}
