//! Library loading.
//!
//! # Responsibilities
//! - Turn a library path into an [`ObjectProvider`]
//! - Keep native libraries resident for the rest of the process
//!
//! # Design Decisions
//! - Native libraries are never unloaded: objects they produced may outlive
//!   every handle the host holds
//! - In-process providers can be registered under a path so that built-in
//!   services and tests use the same factory code path as real libraries

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use libloading::Library;

use crate::error::{HostError, Result};
use crate::factory::abi::{call_get_object, GetObjectFn, ENTRY_SYMBOL};
use crate::factory::object::SharedObject;
use crate::factory::sys::{SysLibrary, SYS_LIBRARY_PATH};

/// A loaded library: constructs objects by id.
pub trait ObjectProvider: Send + Sync {
    /// Unknown ids fail with `NotFound`.
    fn get_object(&self, object_id: &str) -> Result<SharedObject>;
}

impl fmt::Debug for dyn ObjectProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ObjectProvider")
    }
}

impl<F> ObjectProvider for F
where
    F: Fn(&str) -> Result<SharedObject> + Send + Sync,
{
    fn get_object(&self, object_id: &str) -> Result<SharedObject> {
        self(object_id)
    }
}

/// Resolves a library path into a provider.
pub trait LibraryLoader: Send + Sync {
    fn load(&self, path: &str) -> Result<Arc<dyn ObjectProvider>>;
}

/// Loads shared libraries from disk.
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeLoader;

struct NativeLibrary {
    path: String,
    entry: GetObjectFn,
    _library: &'static Library,
}

impl ObjectProvider for NativeLibrary {
    fn get_object(&self, object_id: &str) -> Result<SharedObject> {
        // SAFETY: the entry point comes from a library that is never unloaded.
        unsafe { call_get_object(self.entry, &self.path, object_id) }
    }
}

impl LibraryLoader for NativeLoader {
    fn load(&self, path: &str) -> Result<Arc<dyn ObjectProvider>> {
        let load_error = |reason: String| HostError::Load {
            library: path.to_string(),
            reason,
        };

        // SAFETY: running the library's initializers is inherent to loading it.
        let library = unsafe { Library::new(path) }.map_err(|e| load_error(e.to_string()))?;
        let entry = {
            // SAFETY: the symbol is generated by `export_objects!` with this signature.
            let symbol = unsafe { library.get::<GetObjectFn>(ENTRY_SYMBOL) }
                .map_err(|e| load_error(e.to_string()))?;
            *symbol
        };
        let library: &'static Library = Box::leak(Box::new(library));

        tracing::debug!(path, "Native library loaded");
        Ok(Arc::new(NativeLibrary {
            path: path.to_string(),
            entry,
            _library: library,
        }))
    }
}

/// Serves in-process providers registered by path, delegating other paths to
/// an optional fallback loader.
#[derive(Default)]
pub struct StaticLoader {
    providers: HashMap<String, Arc<dyn ObjectProvider>>,
    fallback: Option<Arc<dyn LibraryLoader>>,
}

impl StaticLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// The system services library, falling back to native loading.
    pub fn builtin() -> Self {
        Self::new()
            .with_provider(SYS_LIBRARY_PATH, Arc::new(SysLibrary::new()))
            .with_fallback(Arc::new(NativeLoader))
    }

    /// Register `provider` under `path`, replacing any earlier one.
    pub fn with_provider(mut self, path: &str, provider: Arc<dyn ObjectProvider>) -> Self {
        self.providers.insert(path.to_string(), provider);
        self
    }

    pub fn with_fallback(mut self, fallback: Arc<dyn LibraryLoader>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    /// Register `provider` under `path`. A taken path fails with
    /// `AlreadyExists`.
    pub fn register(&mut self, path: &str, provider: Arc<dyn ObjectProvider>) -> Result<()> {
        if self.providers.contains_key(path) {
            return Err(HostError::AlreadyExists(format!("provider {path}")));
        }
        self.providers.insert(path.to_string(), provider);
        Ok(())
    }
}

impl LibraryLoader for StaticLoader {
    fn load(&self, path: &str) -> Result<Arc<dyn ObjectProvider>> {
        if let Some(provider) = self.providers.get(path) {
            return Ok(provider.clone());
        }
        match &self.fallback {
            Some(fallback) => fallback.load(path),
            None => Err(HostError::Load {
                library: path.to_string(),
                reason: "no provider registered".into(),
            }),
        }
    }
}

/// Platform file name of a library called `name`, e.g. `libname.so`.
pub fn library_file_name(name: &str) -> String {
    libloading::library_filename(name).to_string_lossy().into_owned()
}
