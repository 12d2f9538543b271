//! Built-in system services library.
//!
//! The bootstrap resolves its runtime services through the library factory
//! like any other object, from the in-process library mapped at
//! [`SYS_LIBRARY_PATH`].

use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::config::ActiveConfig;
use crate::error::{HostError, Result};
use crate::factory::loader::ObjectProvider;
use crate::factory::object::{DllObject, SharedObject};
use crate::lifecycle::StopEvent;
use crate::modules::ModuleManager;
use crate::threading::UniqueWorker;

/// Logical id of the system services library.
pub const SYS_LIBRARY_ID: &str = "sys";
/// Path the built-in loader serves the system services library under.
pub const SYS_LIBRARY_PATH: &str = "builtin:sys";
/// Object id of [`SysServices`].
pub const SYS_OBJECT_ID: &str = "9d8a4c52-3f0e-4b7a-a1c6-5e2f7b0d1c3a";

/// Return the live instance held in `slot` or create a new one.
fn weak_shared<T>(slot: &Mutex<Weak<T>>, make: impl FnOnce() -> T) -> Arc<T> {
    let mut slot = slot.lock();
    if let Some(existing) = slot.upgrade() {
        return existing;
    }
    let created = Arc::new(make());
    *slot = Arc::downgrade(&created);
    created
}

/// Factory for the runtime services modules and the bootstrap depend on.
///
/// The `shared_*` getters return one instance for as long as somebody holds
/// it; the others always construct a new one.
pub struct SysServices {
    active_config: Mutex<Weak<ActiveConfig>>,
    module_manager: Mutex<Weak<ModuleManager>>,
}

impl SysServices {
    pub fn new() -> Self {
        Self {
            active_config: Mutex::new(Weak::new()),
            module_manager: Mutex::new(Weak::new()),
        }
    }

    pub fn shared_active_config(&self) -> Arc<ActiveConfig> {
        weak_shared(&self.active_config, ActiveConfig::new)
    }

    pub fn active_config(&self) -> Arc<ActiveConfig> {
        Arc::new(ActiveConfig::new())
    }

    pub fn shared_module_manager(&self) -> Arc<ModuleManager> {
        weak_shared(&self.module_manager, || ModuleManager::new("modules"))
    }

    pub fn module_manager(&self, name: &str) -> Arc<ModuleManager> {
        Arc::new(ModuleManager::new(name))
    }

    pub fn stop_event(&self) -> Arc<StopEvent> {
        Arc::new(StopEvent::new())
    }

    pub fn unique_worker(&self, name: &str) -> UniqueWorker {
        UniqueWorker::new(name)
    }
}

impl Default for SysServices {
    fn default() -> Self {
        Self::new()
    }
}

impl DllObject for SysServices {}

/// Provider of the system services library.
pub struct SysLibrary {
    services: Mutex<Weak<SysServices>>,
}

impl SysLibrary {
    pub fn new() -> Self {
        Self {
            services: Mutex::new(Weak::new()),
        }
    }
}

impl Default for SysLibrary {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectProvider for SysLibrary {
    fn get_object(&self, object_id: &str) -> Result<SharedObject> {
        if object_id != SYS_OBJECT_ID {
            return Err(HostError::NotFound(format!("{SYS_LIBRARY_ID}/{object_id}")));
        }
        let services: Arc<SysServices> = weak_shared(&self.services, SysServices::new);
        Ok(services)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::factory::object::downcast_object;

    #[test]
    fn test_services_shared_while_held() {
        let library = SysLibrary::new();
        let first = downcast_object::<SysServices>(library.get_object(SYS_OBJECT_ID).unwrap()).unwrap();
        let second = downcast_object::<SysServices>(library.get_object(SYS_OBJECT_ID).unwrap()).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(library.get_object("other").unwrap_err().kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_shared_getters() {
        let services = SysServices::new();
        let a = services.shared_module_manager();
        let b = services.shared_module_manager();
        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &services.module_manager("other")));

        let config = services.shared_active_config();
        drop(config);
        let fresh = services.shared_active_config();
        assert!(!fresh.is_initialized());
    }
}
