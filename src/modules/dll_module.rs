//! Module backed by an object from a shared library.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::{HostError, Result, Severity};
use crate::factory::DllFactory;
use crate::lifecycle::{Lifecycle, LifecycleState, StateMachine};

/// Resolves its implementation from the library factory on initialize and
/// forwards every transition to it. The object is released on uninitialize.
pub struct DllModule {
    machine: StateMachine,
    library_id: String,
    object_id: String,
    factory: Arc<DllFactory>,
    inner: Mutex<Option<Arc<dyn Lifecycle>>>,
}

impl DllModule {
    pub fn new(library_id: &str, object_id: &str, factory: Arc<DllFactory>) -> Self {
        Self {
            machine: StateMachine::new(format!("{library_id}/{object_id}")),
            library_id: library_id.to_string(),
            object_id: object_id.to_string(),
            factory,
            inner: Mutex::new(None),
        }
    }

    fn inner(&self) -> Result<Arc<dyn Lifecycle>> {
        self.inner
            .lock()
            .clone()
            .ok_or(HostError::NotInitialized(Severity::Error))
    }

    fn load(&self) -> Result<()> {
        let object = self.factory.get_object(&self.library_id, &self.object_id)?;
        let unit = object.as_lifecycle().ok_or_else(|| {
            HostError::InvalidArgument(format!(
                "{}/{} is not a lifecycle unit",
                self.library_id, self.object_id
            ))
        })?;
        unit.initialize()?;
        *self.inner.lock() = Some(unit);
        Ok(())
    }
}

impl Lifecycle for DllModule {
    fn initialize(&self) -> Result<()> {
        self.machine.initialize(|| self.load())
    }

    fn uninitialize(&self) -> Result<()> {
        self.machine.uninitialize(|| {
            let inner = self.inner.lock().take();
            match inner {
                Some(unit) => unit.uninitialize(),
                None => Ok(()),
            }
        })
    }

    fn start(&self) -> Result<()> {
        self.machine.start(|| self.inner()?.start())
    }

    fn stop(&self) -> Result<()> {
        self.machine.stop(|| self.inner()?.stop())
    }

    fn state(&self) -> LifecycleState {
        self.machine.state()
    }
}
