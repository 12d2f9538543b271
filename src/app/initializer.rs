//! Main initializer of the example application.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::app::keys::{
    ActiveKeys, PassiveKeys, DYNAMIC_MODULES, EXAMPLE_LIBRARY_ID, EXAMPLE_LIBRARY_NAME, STATIC_MODULES,
};
use crate::bootstrap::MainInitializer;
use crate::config::{
    ActiveConfig, ActiveKey, ActiveKeyMap, ConfigStore, ConfigStoreExt, PassiveConfig, PassiveKey, PassiveKeyMap,
};
use crate::error::{ErrorKind, Result};
use crate::factory::loader::library_file_name;
use crate::factory::{DllFactory, LibraryList};
use crate::modules::{ConfigModuleConfigurator, DllModule, ExampleModule, ModuleManager};
use crate::observability::LoggingSettings;

const LOGGING: &str = "Logging";
const ACTIVE_CONFIG: &str = "ActiveConfig";
const LIBRARIES: &str = "Libraries";

/// Two static and two library-backed example modules, all installed and
/// enabled unless the active configuration says otherwise.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExampleInitializer;

impl ExampleInitializer {
    pub fn new() -> Self {
        Self
    }

    /// Passive keys with their defaults.
    pub fn passive_keys() -> Result<PassiveKeyMap> {
        let defaults = LoggingSettings::default();
        let mut keys = PassiveKeyMap::new();
        keys.insert(
            PassiveKeys::LogFolder.id(),
            PassiveKey::new(LOGGING, "Folder", defaults.folder.to_string_lossy().into_owned()),
        )?;
        keys.insert(
            PassiveKeys::LogFile.id(),
            PassiveKey::new(LOGGING, "File", defaults.file_name.as_str()),
        )?;
        keys.insert(
            PassiveKeys::MaxLogFileSize.id(),
            PassiveKey::new(LOGGING, "MaxFileSize", defaults.max_file_size as i64),
        )?;
        keys.insert(
            PassiveKeys::MaxLogFiles.id(),
            PassiveKey::new(LOGGING, "MaxFiles", defaults.max_files as i64),
        )?;
        keys.insert(
            PassiveKeys::ActiveConfigPath.id(),
            PassiveKey::new(ACTIVE_CONFIG, "Path", "./active.toml"),
        )?;
        keys.insert(
            PassiveKeys::ActiveConfigGroup.id(),
            PassiveKey::new(ACTIVE_CONFIG, "Group", "Modules"),
        )?;
        keys.insert(
            PassiveKeys::ActiveConfigWatch.id(),
            PassiveKey::new(ACTIVE_CONFIG, "Watch", false),
        )?;
        keys.insert(
            PassiveKeys::LibraryFolder.id(),
            PassiveKey::required(LIBRARIES, "Folder"),
        )?;
        Ok(keys)
    }
}

/// Directory of the running executable, where the example library is built.
fn executable_folder() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}

impl MainInitializer for ExampleInitializer {
    fn passive_key_map(&self) -> Result<PassiveKeyMap> {
        Self::passive_keys()
    }

    fn logging_settings(&self, passive: &PassiveConfig) -> Result<LoggingSettings> {
        Ok(LoggingSettings {
            folder: passive.get(PassiveKeys::LogFolder.id())?,
            file_name: passive.get(PassiveKeys::LogFile.id())?,
            max_file_size: passive.get(PassiveKeys::MaxLogFileSize.id())?,
            max_files: passive.get(PassiveKeys::MaxLogFiles.id())?,
        })
    }

    fn library_list(&self, passive: &PassiveConfig) -> Result<LibraryList> {
        let folder = match passive.get::<PathBuf>(PassiveKeys::LibraryFolder.id()) {
            Ok(folder) => folder,
            Err(e) if e.kind() == ErrorKind::DoesNotExist => executable_folder(),
            Err(e) => return Err(e),
        };
        let path = folder.join(library_file_name(EXAMPLE_LIBRARY_NAME));

        let mut libraries = LibraryList::new();
        libraries.insert(EXAMPLE_LIBRARY_ID, &path.to_string_lossy())?;
        Ok(libraries)
    }

    fn active_key_map(&self) -> Result<ActiveKeyMap> {
        let mut keys = ActiveKeyMap::new();
        for module in STATIC_MODULES.iter().chain(DYNAMIC_MODULES.iter()) {
            keys.insert(module.installed.id(), ActiveKey::with_default(true))?;
            keys.insert(module.enabled.id(), ActiveKey::with_default(true))?;
        }
        Ok(keys)
    }

    fn active_config_location(&self, passive: &PassiveConfig) -> Result<(PathBuf, String)> {
        Ok((
            passive.get(PassiveKeys::ActiveConfigPath.id())?,
            passive.get(PassiveKeys::ActiveConfigGroup.id())?,
        ))
    }

    fn active_config_watch(&self, passive: &PassiveConfig) -> bool {
        passive.get(PassiveKeys::ActiveConfigWatch.id()).unwrap_or(false)
    }

    fn add_modules(
        &self,
        manager: &ModuleManager,
        factory: &Arc<DllFactory>,
        config: &Arc<ActiveConfig>,
    ) -> Result<()> {
        let store: Arc<dyn ConfigStore> = config.clone();
        let configurator = |installed: ActiveKeys, enabled: ActiveKeys| {
            Arc::new(ConfigModuleConfigurator::new(store.clone(), installed.id(), enabled.id()).with_defaults(true, true))
        };

        for module in &STATIC_MODULES {
            manager.add_module(
                module.id,
                Arc::new(ExampleModule::new(module.name)),
                configurator(module.installed, module.enabled),
            )?;
        }
        for module in &DYNAMIC_MODULES {
            manager.add_module(
                module.id,
                Arc::new(DllModule::new(EXAMPLE_LIBRARY_ID, module.name, factory.clone())),
                configurator(module.installed, module.enabled),
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_resolve() {
        let passive = PassiveConfig::defaults(ExampleInitializer::passive_keys().unwrap());
        let initializer = ExampleInitializer::new();

        let logging = initializer.logging_settings(&passive).unwrap();
        assert_eq!(logging, LoggingSettings::default());

        let (path, group) = initializer.active_config_location(&passive).unwrap();
        assert_eq!(path, PathBuf::from("./active.toml"));
        assert_eq!(group, "Modules");
        assert!(!initializer.active_config_watch(&passive));

        let libraries = initializer.library_list(&passive).unwrap();
        assert!(libraries.path(EXAMPLE_LIBRARY_ID).unwrap().contains(EXAMPLE_LIBRARY_NAME));
        assert_eq!(initializer.active_key_map().unwrap().len(), 8);
    }
}
