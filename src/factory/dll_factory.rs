//! Object factory over logically named libraries.

use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::{Arc, Weak};

use parking_lot::ReentrantMutex;

use crate::error::{HostError, Result};
use crate::factory::library::LibraryList;
use crate::factory::loader::{LibraryLoader, ObjectProvider};
use crate::factory::object::{downcast_object, DllObject, SharedObject};

#[derive(Default)]
struct FactoryState {
    libraries: LibraryList,
    loaded: HashMap<String, Arc<dyn ObjectProvider>>,
    shared: HashMap<(String, String), Weak<dyn DllObject>>,
}

/// Loads libraries on first use and hands out their objects.
///
/// All calls are serialized by one re-entrant lock, so an object constructor
/// may call back into the factory from the same thread. The `RefCell` inside
/// is never borrowed across a call into a loader or provider.
pub struct DllFactory {
    loader: Arc<dyn LibraryLoader>,
    state: ReentrantMutex<RefCell<FactoryState>>,
}

impl DllFactory {
    pub fn new(libraries: LibraryList, loader: Arc<dyn LibraryLoader>) -> Self {
        tracing::debug!(libraries = libraries.len(), "Library factory created");
        Self {
            loader,
            state: ReentrantMutex::new(RefCell::new(FactoryState {
                libraries,
                ..FactoryState::default()
            })),
        }
    }

    /// Map another logical id. Fails with `AlreadyExists` for a known id.
    pub fn register_library(&self, logical_id: &str, path: &str) -> Result<()> {
        let state = self.state.lock();
        let mut current = state.borrow_mut();
        current.libraries.insert(logical_id, path)
    }

    pub fn is_loaded(&self, logical_id: &str) -> bool {
        self.state.lock().borrow().loaded.contains_key(logical_id)
    }

    fn provider(&self, logical_id: &str) -> Result<Arc<dyn ObjectProvider>> {
        let state = self.state.lock();
        let path = {
            let current = state.borrow();
            if let Some(provider) = current.loaded.get(logical_id) {
                return Ok(provider.clone());
            }
            current
                .libraries
                .path(logical_id)
                .ok_or_else(|| HostError::NotFound(format!("library {logical_id}")))?
                .to_string()
        };

        let provider = match self.loader.load(&path) {
            Ok(provider) => provider,
            Err(e) => {
                tracing::error!(library = logical_id, path = %path, error = %e, "Failed to load library");
                return Err(e);
            }
        };
        state
            .borrow_mut()
            .loaded
            .insert(logical_id.to_string(), provider.clone());
        tracing::info!(library = logical_id, path = %path, "Library loaded");
        Ok(provider)
    }

    /// Construct a new object `object_id` from library `logical_id`.
    pub fn get_object(&self, logical_id: &str, object_id: &str) -> Result<SharedObject> {
        let _serialized = self.state.lock();
        let provider = self.provider(logical_id)?;
        provider.get_object(object_id).map_err(|e| {
            tracing::warn!(library = logical_id, object_id, error = %e, "Object not created");
            e
        })
    }

    /// Return the live shared instance of `object_id`, creating it when no
    /// one holds it anymore. The factory itself keeps only a weak reference.
    pub fn get_shared_object(&self, logical_id: &str, object_id: &str) -> Result<SharedObject> {
        let state = self.state.lock();
        let key = (logical_id.to_string(), object_id.to_string());
        let cached = state.borrow().shared.get(&key).and_then(Weak::upgrade);
        if let Some(object) = cached {
            return Ok(object);
        }

        let object = self.get_object(logical_id, object_id)?;
        let mut current = state.borrow_mut();
        current.shared.retain(|_, weak| weak.strong_count() > 0);
        current.shared.insert(key, Arc::downgrade(&object));
        tracing::debug!(library = logical_id, object_id, "Shared object created");
        Ok(object)
    }

    pub fn get_typed<T: Any + Send + Sync>(&self, logical_id: &str, object_id: &str) -> Result<Arc<T>> {
        downcast_object(self.get_object(logical_id, object_id)?)
    }

    pub fn get_shared_typed<T: Any + Send + Sync>(&self, logical_id: &str, object_id: &str) -> Result<Arc<T>> {
        downcast_object(self.get_shared_object(logical_id, object_id)?)
    }

    /// Number of live entries in the shared-object cache.
    pub fn shared_count(&self) -> usize {
        self.state
            .lock()
            .borrow()
            .shared
            .values()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    }
}
