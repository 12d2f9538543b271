//! Objects handed out by libraries.

use std::any::{type_name, Any};
use std::fmt;
use std::sync::Arc;

use crate::error::{HostError, Result};
use crate::lifecycle::Lifecycle;

/// Upcast to `Any` so shared objects can be downcast to their concrete type.
pub trait AsAnyArc {
    fn into_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

impl<T: Any + Send + Sync> AsAnyArc for T {
    fn into_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

/// An object produced by a library's entry point.
///
/// Objects that can be hosted as modules override [`DllObject::as_lifecycle`].
pub trait DllObject: AsAnyArc + Send + Sync {
    fn as_lifecycle(self: Arc<Self>) -> Option<Arc<dyn Lifecycle>> {
        None
    }
}

impl fmt::Debug for dyn DllObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DllObject")
    }
}

pub type SharedObject = Arc<dyn DllObject>;

/// Downcast a library object to `T`. Fails with `InvalidArgument` when the
/// object has another type.
pub fn downcast_object<T: Any + Send + Sync>(object: SharedObject) -> Result<Arc<T>> {
    object
        .into_any_arc()
        .downcast::<T>()
        .map_err(|_| HostError::InvalidArgument(format!("object is not a {}", type_name::<T>())))
}
