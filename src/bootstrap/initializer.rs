//! Application hooks consulted while the bootstrap initializes.

use std::path::PathBuf;
use std::sync::Arc;

use crate::config::{ActiveConfig, ActiveKeyMap, PassiveConfig, PassiveKeyMap};
use crate::error::Result;
use crate::factory::{DllFactory, LibraryList, LibraryLoader, StaticLoader};
use crate::modules::ModuleManager;
use crate::observability::LoggingSettings;

/// Supplies everything application specific the bootstrap needs.
///
/// Called once, in bootstrap step order, and released after a successful
/// initialize.
pub trait MainInitializer: Send {
    /// Keys of the passive configuration file.
    fn passive_key_map(&self) -> Result<PassiveKeyMap>;

    fn logging_settings(&self, passive: &PassiveConfig) -> Result<LoggingSettings>;

    /// Libraries available to the factory. The system services library is
    /// added when missing.
    fn library_list(&self, passive: &PassiveConfig) -> Result<LibraryList>;

    fn library_loader(&self) -> Arc<dyn LibraryLoader> {
        Arc::new(StaticLoader::builtin())
    }

    fn active_key_map(&self) -> Result<ActiveKeyMap>;

    /// Active configuration file and the group holding this application's
    /// values.
    fn active_config_location(&self, passive: &PassiveConfig) -> Result<(PathBuf, String)>;

    /// Whether to reload the active configuration when its file changes.
    fn active_config_watch(&self, _passive: &PassiveConfig) -> bool {
        false
    }

    /// Register the application's modules.
    fn add_modules(
        &self,
        manager: &ModuleManager,
        factory: &Arc<DllFactory>,
        config: &Arc<ActiveConfig>,
    ) -> Result<()>;
}
