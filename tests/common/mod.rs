//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

use modhost::bootstrap::MainInitializer;
use modhost::config::{
    ActiveConfig, ActiveKey, ActiveKeyMap, ConfigKey, ConfigStore, ConfigStoreExt, ConfigValue, PassiveConfig,
    PassiveKey, PassiveKeyMap,
};
use modhost::factory::{DllFactory, LibraryList, LibraryLoader, ObjectProvider, StaticLoader};
use modhost::lifecycle::{Lifecycle, LifecycleState, StateMachine};
use modhost::modules::{ConfigModuleConfigurator, DllModule, ModuleManager};
use modhost::observability::LoggingSettings;
use modhost::{DllObject, HostError, Result, SharedObject};

/// Ordered record of `(unit, operation)` pairs across all spies.
#[derive(Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<(String, &'static str)>>>);

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, unit: &str, op: &'static str) {
        self.0.lock().push((unit.to_string(), op));
    }

    pub fn entries(&self) -> Vec<(String, &'static str)> {
        self.0.lock().clone()
    }

    /// Operations seen by `unit`, in order.
    pub fn ops_of(&self, unit: &str) -> Vec<&'static str> {
        self.0
            .lock()
            .iter()
            .filter(|(name, _)| name == unit)
            .map(|(_, op)| *op)
            .collect()
    }

    /// Units that saw `op`, in order.
    pub fn units_for(&self, op: &str) -> Vec<String> {
        self.0
            .lock()
            .iter()
            .filter(|(_, seen)| *seen == op)
            .map(|(name, _)| name.clone())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.0.lock().is_empty()
    }
}

/// Lifecycle unit that records every hook it runs and can be told to fail one.
pub struct SpyUnit {
    name: String,
    machine: StateMachine,
    journal: Journal,
    fail_on: Option<&'static str>,
}

impl SpyUnit {
    pub fn new(name: &str, journal: &Journal) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            machine: StateMachine::new(name),
            journal: journal.clone(),
            fail_on: None,
        })
    }

    pub fn failing(name: &str, journal: &Journal, op: &'static str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            machine: StateMachine::new(name),
            journal: journal.clone(),
            fail_on: Some(op),
        })
    }

    fn hook(&self, op: &'static str) -> Result<()> {
        self.journal.record(&self.name, op);
        if self.fail_on == Some(op) {
            return Err(HostError::Allocation(format!("{} failed to {op}", self.name)));
        }
        Ok(())
    }
}

impl Lifecycle for SpyUnit {
    fn initialize(&self) -> Result<()> {
        self.machine.initialize(|| self.hook("initialize"))
    }

    fn uninitialize(&self) -> Result<()> {
        self.machine.uninitialize(|| self.hook("uninitialize"))
    }

    fn start(&self) -> Result<()> {
        self.machine.start(|| self.hook("start"))
    }

    fn stop(&self) -> Result<()> {
        self.machine.stop(|| self.hook("stop"))
    }

    fn state(&self) -> LifecycleState {
        self.machine.state()
    }
}

impl DllObject for SpyUnit {
    fn as_lifecycle(self: Arc<Self>) -> Option<Arc<dyn Lifecycle>> {
        Some(self)
    }
}

/// Library object that is not a lifecycle unit.
pub struct PlainObject;

impl DllObject for PlainObject {}

/// Provider for a library of spies: ids starting with `spy` or `dynamic`
/// produce a [`SpyUnit`] named after the id, `plain` a [`PlainObject`].
pub fn spy_provider(journal: &Journal) -> Arc<dyn ObjectProvider> {
    let journal = journal.clone();
    Arc::new(move |id: &str| -> Result<SharedObject> {
        if id.starts_with("spy") || id.starts_with("dynamic") {
            let unit: SharedObject = SpyUnit::new(id, &journal);
            Ok(unit)
        } else if id == "plain" {
            Ok(Arc::new(PlainObject))
        } else {
            Err(HostError::NotFound(id.to_string()))
        }
    })
}

/// Configuration store backed by a map.
#[derive(Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<ConfigKey, ConfigValue>>,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set(&self, key: ConfigKey, value: impl Into<ConfigValue>) {
        self.values.lock().insert(key, value.into());
    }
}

impl ConfigStore for MemoryStore {
    fn value(&self, key: ConfigKey) -> Result<ConfigValue> {
        self.values
            .lock()
            .get(&key)
            .cloned()
            .ok_or_else(|| HostError::NotFound(format!("key {key}")))
    }
}

/// Configurator reading `installed = 2 * slot` and `enabled = 2 * slot + 1`
/// from `store`, both defaulting to true.
pub fn configurator(store: &Arc<MemoryStore>, slot: ConfigKey) -> Arc<ConfigModuleConfigurator> {
    Arc::new(ConfigModuleConfigurator::new(store.clone(), 2 * slot, 2 * slot + 1).with_defaults(true, true))
}

pub const SPY_LIBRARY_ID: &str = "spies";
pub const SPY_LIBRARY_PATH: &str = "mem:spies";

/// Factory with the spy library mapped under [`SPY_LIBRARY_ID`].
pub fn spy_factory(journal: &Journal) -> Arc<DllFactory> {
    let mut libraries = LibraryList::new();
    libraries.insert(SPY_LIBRARY_ID, SPY_LIBRARY_PATH).unwrap();
    let loader = StaticLoader::new().with_provider(SPY_LIBRARY_PATH, spy_provider(journal));
    Arc::new(DllFactory::new(libraries, Arc::new(loader)))
}

/// Bootstrap step at which [`TestInitializer`] fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailAt {
    PassiveKeys,
    Libraries,
    ActiveKeys,
    AddModules,
    ModuleInitialize,
}

pub const STATIC_UNITS: [&str; 2] = ["static-1", "static-2"];
pub const DYNAMIC_UNITS: [&str; 2] = ["dynamic-1", "dynamic-2"];

const LOG_FOLDER: ConfigKey = 0;
const ACTIVE_PATH: ConfigKey = 1;
const ACTIVE_GROUP: ConfigKey = 2;

/// Main initializer registering two static and two library-backed spies.
///
/// Module slot `n` (registration order) is controlled by active keys `2n`
/// (installed) and `2n + 1` (enabled).
pub struct TestInitializer {
    pub journal: Journal,
    pub fail_at: Option<FailAt>,
}

impl TestInitializer {
    pub fn new(journal: &Journal) -> Self {
        Self {
            journal: journal.clone(),
            fail_at: None,
        }
    }

    pub fn failing_at(journal: &Journal, step: FailAt) -> Self {
        Self {
            journal: journal.clone(),
            fail_at: Some(step),
        }
    }

    fn check(&self, step: FailAt) -> Result<()> {
        if self.fail_at == Some(step) {
            return Err(HostError::InvalidArgument(format!("injected failure at {step:?}")));
        }
        Ok(())
    }
}

impl MainInitializer for TestInitializer {
    fn passive_key_map(&self) -> Result<PassiveKeyMap> {
        self.check(FailAt::PassiveKeys)?;
        let mut keys = PassiveKeyMap::new();
        keys.insert(LOG_FOLDER, PassiveKey::required("Logging", "Folder"))?;
        keys.insert(ACTIVE_PATH, PassiveKey::required("Active", "Path"))?;
        keys.insert(ACTIVE_GROUP, PassiveKey::new("Active", "Group", "Spies"))?;
        Ok(keys)
    }

    fn logging_settings(&self, passive: &PassiveConfig) -> Result<LoggingSettings> {
        Ok(LoggingSettings {
            folder: passive.get(LOG_FOLDER)?,
            file_name: "test.log".into(),
            max_file_size: 1024 * 1024,
            max_files: 2,
        })
    }

    fn library_list(&self, _passive: &PassiveConfig) -> Result<LibraryList> {
        self.check(FailAt::Libraries)?;
        let mut libraries = LibraryList::new();
        libraries.insert(SPY_LIBRARY_ID, SPY_LIBRARY_PATH)?;
        Ok(libraries)
    }

    fn library_loader(&self) -> Arc<dyn LibraryLoader> {
        Arc::new(StaticLoader::builtin().with_provider(SPY_LIBRARY_PATH, spy_provider(&self.journal)))
    }

    fn active_key_map(&self) -> Result<ActiveKeyMap> {
        self.check(FailAt::ActiveKeys)?;
        let mut keys = ActiveKeyMap::new();
        for key in 0..8 {
            keys.insert(key, ActiveKey::with_default(true))?;
        }
        Ok(keys)
    }

    fn active_config_location(&self, passive: &PassiveConfig) -> Result<(PathBuf, String)> {
        Ok((passive.get(ACTIVE_PATH)?, passive.get(ACTIVE_GROUP)?))
    }

    fn add_modules(
        &self,
        manager: &ModuleManager,
        factory: &Arc<DllFactory>,
        config: &Arc<ActiveConfig>,
    ) -> Result<()> {
        self.check(FailAt::AddModules)?;
        let store: Arc<dyn ConfigStore> = config.clone();
        let configurator = |slot: ConfigKey| {
            Arc::new(ConfigModuleConfigurator::new(store.clone(), 2 * slot, 2 * slot + 1).with_defaults(true, true))
        };

        for (slot, name) in STATIC_UNITS.iter().enumerate() {
            let unit: Arc<dyn Lifecycle> = if self.fail_at == Some(FailAt::ModuleInitialize) && slot == 1 {
                SpyUnit::failing(name, &self.journal, "initialize")
            } else {
                SpyUnit::new(name, &self.journal)
            };
            manager.add_module(slot as i32 + 1, unit, configurator(slot as ConfigKey))?;
        }
        for (offset, name) in DYNAMIC_UNITS.iter().enumerate() {
            let slot = STATIC_UNITS.len() + offset;
            manager.add_module(
                slot as i32 + 1,
                Arc::new(DllModule::new(SPY_LIBRARY_ID, name, factory.clone())),
                configurator(slot as ConfigKey),
            )?;
        }
        Ok(())
    }
}

/// Write a passive file under `dir` pointing logs and the active
/// configuration into it. Returns the passive file path.
pub fn write_passive(dir: &Path) -> PathBuf {
    let mut logging = toml::Table::new();
    logging.insert(
        "Folder".into(),
        toml::Value::String(dir.join("log").to_string_lossy().into_owned()),
    );
    let mut active = toml::Table::new();
    active.insert(
        "Path".into(),
        toml::Value::String(dir.join("active.toml").to_string_lossy().into_owned()),
    );
    let mut document = toml::Table::new();
    document.insert("Logging".into(), toml::Value::Table(logging));
    document.insert("Active".into(), toml::Value::Table(active));

    let path = dir.join("passive.toml");
    std::fs::write(&path, toml::to_string(&document).unwrap()).unwrap();
    path
}

/// Read a boolean flag straight from a store, for assertions.
pub fn flag(store: &dyn ConfigStore, key: ConfigKey) -> bool {
    store.get::<bool>(key).unwrap()
}
