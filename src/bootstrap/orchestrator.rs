//! Ordered process bring-up and teardown.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use notify::RecommendedWatcher;
use parking_lot::Mutex;
use uuid::Uuid;

use crate::bootstrap::initializer::MainInitializer;
use crate::config::{ActiveConfig, ConfigWatcher, PassiveConfig};
use crate::error::{ignore_info, HostError, Result, Severity};
use crate::factory::{DllFactory, SharedSlot, SysServices, SYS_LIBRARY_ID, SYS_LIBRARY_PATH, SYS_OBJECT_ID};
use crate::lifecycle::{Lifecycle, LifecycleState, StateMachine, StopEvent};
use crate::modules::ModuleManager;
use crate::observability::init_logging;

/// Everything acquired by a successful initialize.
struct Resources {
    passive: Arc<PassiveConfig>,
    factory: Arc<DllFactory>,
    active_config: Arc<ActiveConfig>,
    watcher: Option<RecommendedWatcher>,
    stop_event: Arc<StopEvent>,
    manager: Arc<ModuleManager>,
}

/// Drives the process through its subsystems.
///
/// `initialize` runs these steps in order and stops at the first failure,
/// releasing whatever the earlier steps acquired:
///
/// 1. load the passive configuration
/// 2. initialize logging
/// 3. create the library factory and resolve the system services
/// 4. initialize the active configuration (and its watcher)
/// 5. create the stop event
/// 6. register the modules and initialize the module manager
pub struct Bootstrap {
    machine: StateMachine,
    run_id: Uuid,
    passive_path: PathBuf,
    initializer: Mutex<Option<Box<dyn MainInitializer>>>,
    sys: SharedSlot<SysServices>,
    resources: Mutex<Option<Resources>>,
}

impl Bootstrap {
    pub fn new(initializer: Box<dyn MainInitializer>, passive_path: impl Into<PathBuf>) -> Self {
        Self {
            machine: StateMachine::new("bootstrap"),
            run_id: Uuid::new_v4(),
            passive_path: passive_path.into(),
            initializer: Mutex::new(Some(initializer)),
            sys: SharedSlot::new(),
            resources: Mutex::new(None),
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn passive_path(&self) -> &Path {
        &self.passive_path
    }

    pub fn module_manager(&self) -> Option<Arc<ModuleManager>> {
        self.resources.lock().as_ref().map(|r| r.manager.clone())
    }

    pub fn active_config(&self) -> Option<Arc<ActiveConfig>> {
        self.resources.lock().as_ref().map(|r| r.active_config.clone())
    }

    pub fn passive_config(&self) -> Option<Arc<PassiveConfig>> {
        self.resources.lock().as_ref().map(|r| r.passive.clone())
    }

    pub fn factory(&self) -> Option<Arc<DllFactory>> {
        self.resources.lock().as_ref().map(|r| r.factory.clone())
    }

    /// Whether the main initializer is still held (not yet consumed by a
    /// successful initialize).
    pub fn has_initializer(&self) -> bool {
        self.initializer.lock().is_some()
    }

    fn stop_event(&self) -> Option<Arc<StopEvent>> {
        self.resources.lock().as_ref().map(|r| r.stop_event.clone())
    }

    fn manager(&self) -> Result<Arc<ModuleManager>> {
        self.module_manager()
            .ok_or(HostError::NotInitialized(Severity::Error))
    }

    /// Set the stop event if initialized. Repeated signals are no-ops.
    pub fn on_signal(&self, signal: i32) {
        match self.stop_event() {
            Some(event) => {
                if event.set() {
                    tracing::info!(run_id = %self.run_id, signal, "Stop requested by signal");
                }
            }
            None => tracing::debug!(signal, "Signal ignored, bootstrap not initialized"),
        }
    }

    /// Set the stop event from code.
    pub fn request_stop(&self) -> Result<()> {
        let event = self
            .stop_event()
            .ok_or(HostError::NotInitialized(Severity::Error))?;
        if event.set() {
            tracing::info!(run_id = %self.run_id, "Stop requested");
        }
        Ok(())
    }

    pub fn stop_requested(&self) -> bool {
        self.stop_event().is_some_and(|event| event.is_set())
    }

    /// Block until a stop is requested by signal or [`Bootstrap::request_stop`].
    pub fn wait_for_stop_request(&self) -> Result<()> {
        let event = self
            .stop_event()
            .ok_or(HostError::NotInitialized(Severity::Error))?;
        tracing::info!(run_id = %self.run_id, "Waiting for stop request");
        event.wait();
        Ok(())
    }

    fn acquire(&self, initializer: &dyn MainInitializer) -> Result<Resources> {
        let result = self.acquire_steps(initializer);
        if result.is_err() {
            self.sys.reset();
        }
        result
    }

    fn acquire_steps(&self, initializer: &dyn MainInitializer) -> Result<Resources> {
        let passive = Arc::new(PassiveConfig::load(
            initializer.passive_key_map()?,
            &self.passive_path,
        )?);

        init_logging(&initializer.logging_settings(&passive)?)?;
        tracing::info!(run_id = %self.run_id, passive = %self.passive_path.display(), "Bootstrap configuration loaded");

        let mut libraries = initializer.library_list(&passive)?;
        if libraries.path(SYS_LIBRARY_ID).is_none() {
            libraries.insert(SYS_LIBRARY_ID, SYS_LIBRARY_PATH)?;
        }
        let factory = Arc::new(DllFactory::new(libraries, initializer.library_loader()));
        let sys = self
            .sys
            .get_or_try_init(|| factory.get_shared_typed::<SysServices>(SYS_LIBRARY_ID, SYS_OBJECT_ID))?;

        let (path, group) = initializer.active_config_location(&passive)?;
        let active_config = sys.shared_active_config();
        active_config.initialize(initializer.active_key_map()?, &path, &group)?;

        let remaining = (|| -> Result<(Option<RecommendedWatcher>, Arc<StopEvent>, Arc<ModuleManager>)> {
            let watcher = if initializer.active_config_watch(&passive) {
                match ConfigWatcher::new(&path, &active_config).run() {
                    Ok(watcher) => Some(watcher),
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e, "Active config watcher not started");
                        None
                    }
                }
            } else {
                None
            };

            let stop_event = sys.stop_event();

            let manager = sys.shared_module_manager();
            initializer.add_modules(&manager, &factory, &active_config)?;
            if let Err(e) = manager.initialize() {
                if let Err(release) = ignore_info(manager.uninitialize()) {
                    tracing::warn!(error = %release, "Failed to release partially initialized modules");
                }
                return Err(e);
            }
            Ok((watcher, stop_event, manager))
        })();

        match remaining {
            Ok((watcher, stop_event, manager)) => Ok(Resources {
                passive,
                factory,
                active_config,
                watcher,
                stop_event,
                manager,
            }),
            Err(e) => {
                if let Err(release) = ignore_info(active_config.uninitialize()) {
                    tracing::warn!(error = %release, "Failed to release active configuration");
                }
                Err(e)
            }
        }
    }

    fn release(&self) -> Result<()> {
        let Some(resources) = self.resources.lock().take() else {
            return Ok(());
        };
        let Resources {
            manager,
            watcher,
            active_config,
            ..
        } = resources;

        let mut first = None;
        if let Err(e) = ignore_info(manager.uninitialize()) {
            tracing::error!(error = %e, "Module manager failed to uninitialize");
            first.get_or_insert(e);
        }
        drop(watcher);
        if let Err(e) = ignore_info(active_config.uninitialize()) {
            tracing::error!(error = %e, "Active configuration failed to uninitialize");
            first.get_or_insert(e);
        }
        self.sys.reset();
        first.map_or(Ok(()), Err)
    }
}

impl Lifecycle for Bootstrap {
    fn initialize(&self) -> Result<()> {
        let _span = tracing::info_span!("bootstrap", run_id = %self.run_id).entered();
        self.machine.initialize(|| {
            let initializer = self
                .initializer
                .lock()
                .take()
                .ok_or_else(|| HostError::InvalidArgument("main initializer already released".into()))?;
            match self.acquire(initializer.as_ref()) {
                Ok(resources) => {
                    *self.resources.lock() = Some(resources);
                    Ok(())
                }
                Err(e) => {
                    *self.initializer.lock() = Some(initializer);
                    Err(e)
                }
            }
        })
    }

    fn uninitialize(&self) -> Result<()> {
        let _span = tracing::info_span!("bootstrap", run_id = %self.run_id).entered();
        self.machine.uninitialize(|| self.release())
    }

    fn start(&self) -> Result<()> {
        let _span = tracing::info_span!("bootstrap", run_id = %self.run_id).entered();
        self.machine.start(|| self.manager()?.start())
    }

    fn stop(&self) -> Result<()> {
        let _span = tracing::info_span!("bootstrap", run_id = %self.run_id).entered();
        self.machine.stop(|| self.manager()?.stop())
    }

    fn state(&self) -> LifecycleState {
        self.machine.state()
    }
}

#[cfg(unix)]
impl crate::lifecycle::signals::SignalHandler for Bootstrap {
    fn on_signal(&self, signal: i32) {
        Bootstrap::on_signal(self, signal);
    }
}
