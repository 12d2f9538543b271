//! Ordered registry of modules driven as one lifecycle unit.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::{ignore_info, HostError, Result};
use crate::lifecycle::{Lifecycle, LifecycleState, StateMachine};
use crate::modules::configurator::ModuleConfigurator;

/// Key of a module within one manager.
pub type ModuleId = i32;

/// Manager-side progress of one registered module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModuleStatus {
    /// Registered, not initialized yet.
    Pending,
    /// Not installed. Skipped for the rest of the process run.
    Inert,
    Initialized,
    Running,
}

impl fmt::Display for ModuleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModuleStatus::Pending => write!(f, "pending"),
            ModuleStatus::Inert => write!(f, "inert"),
            ModuleStatus::Initialized => write!(f, "initialized"),
            ModuleStatus::Running => write!(f, "running"),
        }
    }
}

struct ModuleRecord {
    id: ModuleId,
    unit: Arc<dyn Lifecycle>,
    configurator: Arc<dyn ModuleConfigurator>,
    status: ModuleStatus,
}

type Entry = (ModuleId, Arc<dyn Lifecycle>, Arc<dyn ModuleConfigurator>, ModuleStatus);

/// Holds modules in registration order and applies lifecycle transitions to
/// all of them.
///
/// Initialize and start go in registration order and stop at the first
/// failure without rolling back. Stop and uninitialize go in reverse order,
/// visit every module and report the first failure. Modules initialized
/// before a failing one stay initialized until the next uninitialize.
///
/// The registry lock is never held while a module runs, so modules may query
/// the manager from their own callbacks.
pub struct ModuleManager {
    machine: StateMachine,
    records: Mutex<Vec<ModuleRecord>>,
}

impl ModuleManager {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            machine: StateMachine::new(name),
            records: Mutex::new(Vec::new()),
        }
    }

    pub fn name(&self) -> &str {
        self.machine.name()
    }

    /// Register a module. Fails with `AlreadyExists` for a duplicate id and
    /// `StillRunning` once the manager is started.
    pub fn add_module(
        &self,
        id: ModuleId,
        unit: Arc<dyn Lifecycle>,
        configurator: Arc<dyn ModuleConfigurator>,
    ) -> Result<()> {
        self.machine.with_state(|state| {
            if state == LifecycleState::Running {
                tracing::error!(manager = %self.name(), module_id = id, "Can not add a module while running");
                return Err(HostError::StillRunning);
            }
            let mut records = self.records.lock();
            if records.iter().any(|r| r.id == id) {
                return Err(HostError::AlreadyExists(format!("module {id}")));
            }
            records.push(ModuleRecord {
                id,
                unit,
                configurator,
                status: ModuleStatus::Pending,
            });
            tracing::debug!(manager = %self.name(), module_id = id, "Module added");
            Ok(())
        })
    }

    /// Unregister a module, uninitializing it first if needed. Fails with
    /// `StillRunning` while the manager runs and `NotFound` for unknown ids.
    pub fn remove_module(&self, id: ModuleId) -> Result<()> {
        self.machine.with_state(|state| {
            if state == LifecycleState::Running {
                return Err(HostError::StillRunning);
            }
            let record = {
                let mut records = self.records.lock();
                let position = records
                    .iter()
                    .position(|r| r.id == id)
                    .ok_or_else(|| HostError::NotFound(format!("module {id}")))?;
                records.remove(position)
            };
            if record.status == ModuleStatus::Initialized {
                if let Err(e) = ignore_info(record.unit.uninitialize()) {
                    tracing::warn!(manager = %self.name(), module_id = id, error = %e, "Removed module failed to uninitialize");
                }
            }
            tracing::debug!(manager = %self.name(), module_id = id, "Module removed");
            Ok(())
        })
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    pub fn contains(&self, id: ModuleId) -> bool {
        self.records.lock().iter().any(|r| r.id == id)
    }

    /// Ids in registration order.
    pub fn module_ids(&self) -> Vec<ModuleId> {
        self.records.lock().iter().map(|r| r.id).collect()
    }

    pub fn module_state(&self, id: ModuleId) -> Option<ModuleStatus> {
        self.records.lock().iter().find(|r| r.id == id).map(|r| r.status)
    }

    fn entries(&self, wanted: &[ModuleStatus]) -> Vec<Entry> {
        self.records
            .lock()
            .iter()
            .filter(|r| wanted.contains(&r.status))
            .map(|r| (r.id, r.unit.clone(), r.configurator.clone(), r.status))
            .collect()
    }

    fn set_status(&self, id: ModuleId, status: ModuleStatus) {
        if let Some(record) = self.records.lock().iter_mut().find(|r| r.id == id) {
            record.status = status;
        }
    }

    fn has_leftovers(&self) -> bool {
        self.records
            .lock()
            .iter()
            .any(|r| matches!(r.status, ModuleStatus::Initialized | ModuleStatus::Running))
    }

    fn initialize_modules(&self) -> Result<()> {
        for (id, unit, configurator, _) in self.entries(&[ModuleStatus::Pending]) {
            if !configurator.is_installed() {
                tracing::info!(manager = %self.name(), module_id = id, "Module not installed, skipping");
                self.set_status(id, ModuleStatus::Inert);
                continue;
            }
            if let Err(e) = ignore_info(unit.initialize()) {
                tracing::error!(manager = %self.name(), module_id = id, error = %e, "Module failed to initialize");
                return Err(e);
            }
            self.set_status(id, ModuleStatus::Initialized);
        }
        Ok(())
    }

    fn start_modules(&self) -> Result<()> {
        for (id, unit, configurator, _) in self.entries(&[ModuleStatus::Initialized]) {
            if !configurator.is_enabled() {
                tracing::info!(manager = %self.name(), module_id = id, "Module not enabled, not starting");
                continue;
            }
            if let Err(e) = ignore_info(unit.start()) {
                tracing::error!(manager = %self.name(), module_id = id, error = %e, "Module failed to start");
                return Err(e);
            }
            self.set_status(id, ModuleStatus::Running);
        }
        Ok(())
    }

    fn stop_modules(&self) -> Result<()> {
        let mut first = None;
        for (id, unit, _, _) in self.entries(&[ModuleStatus::Running]).into_iter().rev() {
            let result = ignore_info(unit.stop());
            self.set_status(id, ModuleStatus::Initialized);
            if let Err(e) = result {
                tracing::error!(manager = %self.name(), module_id = id, error = %e, "Module failed to stop");
                first.get_or_insert(e);
            }
        }
        first.map_or(Ok(()), Err)
    }

    fn uninitialize_modules(&self) -> Result<()> {
        let mut first = None;
        let left = self.entries(&[ModuleStatus::Initialized, ModuleStatus::Running]);
        for (id, unit, _, status) in left.into_iter().rev() {
            // Running here only after a start that failed part way.
            if status == ModuleStatus::Running {
                if let Err(e) = ignore_info(unit.stop()) {
                    tracing::warn!(manager = %self.name(), module_id = id, error = %e, "Module failed to stop before uninitialize");
                }
            }
            let result = ignore_info(unit.uninitialize());
            self.set_status(id, ModuleStatus::Pending);
            if let Err(e) = result {
                tracing::error!(manager = %self.name(), module_id = id, error = %e, "Module failed to uninitialize");
                first.get_or_insert(e);
            }
        }
        first.map_or(Ok(()), Err)
    }
}

impl Lifecycle for ModuleManager {
    fn initialize(&self) -> Result<()> {
        self.machine.initialize(|| self.initialize_modules())
    }

    /// Also releases modules left initialized by a failed initialize, in
    /// which case the manager itself was never initialized.
    fn uninitialize(&self) -> Result<()> {
        self.machine.with_state(|state| {
            if state == LifecycleState::Uninitialized && self.has_leftovers() {
                tracing::info!(manager = %self.name(), "Releasing modules of a failed initialize");
                return self.uninitialize_modules();
            }
            self.machine.uninitialize(|| self.uninitialize_modules())
        })
    }

    fn start(&self) -> Result<()> {
        self.machine.start(|| self.start_modules())
    }

    fn stop(&self) -> Result<()> {
        self.machine.stop(|| self.stop_modules())
    }

    fn state(&self) -> LifecycleState {
        self.machine.state()
    }
}

impl fmt::Debug for ModuleManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleManager")
            .field("name", &self.name())
            .field("state", &self.state())
            .field("modules", &self.module_ids())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::modules::configurator::FixedConfigurator;

    struct Quiet {
        machine: StateMachine,
    }

    impl Quiet {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                machine: StateMachine::new("quiet"),
            })
        }
    }

    impl Lifecycle for Quiet {
        fn initialize(&self) -> Result<()> {
            self.machine.initialize(|| Ok(()))
        }
        fn uninitialize(&self) -> Result<()> {
            self.machine.uninitialize(|| Ok(()))
        }
        fn start(&self) -> Result<()> {
            self.machine.start(|| Ok(()))
        }
        fn stop(&self) -> Result<()> {
            self.machine.stop(|| Ok(()))
        }
        fn state(&self) -> LifecycleState {
            self.machine.state()
        }
    }

    #[test]
    fn test_registry_queries() {
        let manager = ModuleManager::new("test");
        let always = Arc::new(FixedConfigurator::always());
        manager.add_module(3, Quiet::new(), always.clone()).unwrap();
        manager.add_module(1, Quiet::new(), always.clone()).unwrap();

        let err = manager.add_module(3, Quiet::new(), always).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyExists);
        assert_eq!(manager.module_ids(), vec![3, 1]);
        assert_eq!(manager.module_state(1), Some(ModuleStatus::Pending));
        assert_eq!(manager.module_state(2), None);
    }

    #[test]
    fn test_remove_uninitializes_module() {
        let manager = ModuleManager::new("test");
        let unit = Quiet::new();
        manager.add_module(1, unit.clone(), Arc::new(FixedConfigurator::always())).unwrap();
        manager.initialize().unwrap();
        manager.start().unwrap();
        assert_eq!(manager.remove_module(1).unwrap_err().kind(), ErrorKind::StillRunning);

        manager.stop().unwrap();
        manager.remove_module(1).unwrap();
        assert_eq!(unit.state(), LifecycleState::Uninitialized);
        assert_eq!(manager.remove_module(1).unwrap_err().kind(), ErrorKind::NotFound);
        assert!(manager.is_empty());
    }

    #[test]
    fn test_inert_module_stays_inert() {
        let manager = ModuleManager::new("test");
        let unit = Quiet::new();
        let configurator = Arc::new(FixedConfigurator {
            installed: false,
            enabled: true,
        });
        manager.add_module(1, unit.clone(), configurator).unwrap();

        manager.initialize().unwrap();
        manager.uninitialize().unwrap();
        manager.initialize().unwrap();
        assert_eq!(manager.module_state(1), Some(ModuleStatus::Inert));
        assert_eq!(unit.state(), LifecycleState::Uninitialized);
    }
}
