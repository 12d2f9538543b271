//! Installed/enabled flags of one module.

use std::sync::Arc;

use crate::config::{ConfigKey, ConfigStore, ConfigStoreExt};
use crate::error::ErrorKind;

/// Decides whether a module takes part in the running system.
///
/// A module that is not installed is never initialized. A module that is
/// installed but not enabled is initialized but never started.
pub trait ModuleConfigurator: Send + Sync {
    fn is_installed(&self) -> bool;

    fn is_enabled(&self) -> bool;
}

/// Reads both flags from a configuration store on every call.
pub struct ConfigModuleConfigurator {
    store: Arc<dyn ConfigStore>,
    installed_key: ConfigKey,
    enabled_key: ConfigKey,
    installed_default: bool,
    enabled_default: bool,
}

impl ConfigModuleConfigurator {
    pub fn new(store: Arc<dyn ConfigStore>, installed_key: ConfigKey, enabled_key: ConfigKey) -> Self {
        Self {
            store,
            installed_key,
            enabled_key,
            installed_default: false,
            enabled_default: false,
        }
    }

    /// Values used when a key cannot be read.
    pub fn with_defaults(mut self, installed: bool, enabled: bool) -> Self {
        self.installed_default = installed;
        self.enabled_default = enabled;
        self
    }

    fn flag(&self, key: ConfigKey, default: bool) -> bool {
        match self.store.get::<bool>(key) {
            Ok(value) => value,
            Err(e) if matches!(e.kind(), ErrorKind::NotFound | ErrorKind::DoesNotExist) => default,
            Err(e) => {
                tracing::warn!(key, error = %e, fallback = default, "Failed to read module flag, using default");
                default
            }
        }
    }
}

impl ModuleConfigurator for ConfigModuleConfigurator {
    fn is_installed(&self) -> bool {
        self.flag(self.installed_key, self.installed_default)
    }

    fn is_enabled(&self) -> bool {
        self.flag(self.enabled_key, self.enabled_default)
    }
}

/// Fixed flags, for modules that are not configurable.
#[derive(Debug, Clone, Copy)]
pub struct FixedConfigurator {
    pub installed: bool,
    pub enabled: bool,
}

impl FixedConfigurator {
    pub fn always() -> Self {
        Self {
            installed: true,
            enabled: true,
        }
    }
}

impl ModuleConfigurator for FixedConfigurator {
    fn is_installed(&self) -> bool {
        self.installed
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ActiveConfig, ActiveKey, ActiveKeyMap, ConfigValue};
    use crate::error::{HostError, Result};

    struct Broken;
    impl ConfigStore for Broken {
        fn value(&self, _key: ConfigKey) -> Result<ConfigValue> {
            Err(HostError::Allocation("store offline".into()))
        }
    }

    #[test]
    fn test_reads_store_on_every_call() {
        let dir = tempfile::tempdir().unwrap();
        let mut keys = ActiveKeyMap::new();
        keys.insert(1, ActiveKey::with_default(true)).unwrap();
        keys.insert(2, ActiveKey::with_default(false)).unwrap();
        let config = Arc::new(ActiveConfig::new());
        config.initialize(keys, &dir.path().join("a.toml"), "Modules").unwrap();

        let configurator = ConfigModuleConfigurator::new(config.clone(), 1, 2);
        assert!(configurator.is_installed());
        assert!(!configurator.is_enabled());

        config.set_value(2, true).unwrap();
        assert!(configurator.is_enabled());
    }

    #[test]
    fn test_defaults_on_missing_or_bad_values() {
        let configurator = ConfigModuleConfigurator::new(Arc::new(Broken), 1, 2).with_defaults(true, false);
        assert!(configurator.is_installed());
        assert!(!configurator.is_enabled());

        let dir = tempfile::tempdir().unwrap();
        let mut keys = ActiveKeyMap::new();
        keys.insert(1, ActiveKey::with_default("yes")).unwrap();
        let config = Arc::new(ActiveConfig::new());
        config.initialize(keys, &dir.path().join("a.toml"), "Modules").unwrap();

        let configurator = ConfigModuleConfigurator::new(config, 1, 99).with_defaults(false, true);
        assert!(!configurator.is_installed());
        assert!(configurator.is_enabled());
    }
}
