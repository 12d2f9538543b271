//! Entry point ABI between the host and shared libraries.
//!
//! A library exports one function, `modhost_get_object`, usually generated
//! with [`export_objects!`](crate::export_objects). The host passes the object
//! id as a C string together with a [`HostContext`]; the library writes a boxed
//! [`SharedObject`] to `out` and returns `0`, or returns the exit code of the
//! failure kind and leaves `out` null.
//!
//! Objects cross the boundary as Rust trait objects, so host and library must
//! be built by the same compiler against the same version of this crate.

use std::ffi::{c_char, c_void, CStr};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::ptr;
use std::sync::Once;

use crate::error::{ErrorKind, HostError, Result};
use crate::factory::object::SharedObject;

/// Exported symbol name, NUL terminated.
pub const ENTRY_SYMBOL: &[u8] = b"modhost_get_object\0";

/// Status returned on success.
pub const STATUS_OK: i32 = 0;

pub type GetObjectFn =
    unsafe extern "C" fn(id: *const c_char, host: *const HostContext, out: *mut *mut c_void) -> i32;

/// Host state handed to the library on every call.
pub struct HostContext {
    /// The host's tracing dispatcher. A library built as its own image
    /// installs it as its global default so its events reach the host's
    /// subscriber.
    pub dispatch: tracing::Dispatch,
    image: usize,
}

impl HostContext {
    /// Capture the dispatcher active on the calling thread.
    pub fn current() -> Self {
        Self {
            dispatch: tracing::dispatcher::get_default(|dispatch| dispatch.clone()),
            image: image_marker(),
        }
    }

    /// Whether the context comes from another copy of this crate, i.e. the
    /// entry point runs inside a separately loaded library.
    pub fn is_foreign(&self) -> bool {
        self.image != image_marker()
    }
}

/// One per loaded copy of this crate; its address tells the copies apart.
static IMAGE_MARKER: u8 = 0;

fn image_marker() -> usize {
    ptr::addr_of!(IMAGE_MARKER) as usize
}

static HOST_DISPATCH: Once = Once::new();

/// Library side of the entry point.
///
/// # Safety
/// `id` must be null or a valid NUL-terminated string, `host` null or a valid
/// [`HostContext`], and `out` null or valid for writes.
pub unsafe fn dispatch_get_object<F>(
    id: *const c_char,
    host: *const HostContext,
    out: *mut *mut c_void,
    constructor: F,
) -> i32
where
    F: FnOnce(&str) -> Result<SharedObject>,
{
    let invalid = ErrorKind::InvalidArgument.exit_code() as i32;
    if id.is_null() || out.is_null() {
        return invalid;
    }
    *out = ptr::null_mut();

    // In-process callers already share the host's dispatcher.
    if let Some(host) = host.as_ref().filter(|host| host.is_foreign()) {
        HOST_DISPATCH.call_once(|| {
            let _ = tracing::dispatcher::set_global_default(host.dispatch.clone());
        });
    }

    let Ok(id) = CStr::from_ptr(id).to_str() else {
        return invalid;
    };

    match catch_unwind(AssertUnwindSafe(|| constructor(id))) {
        Ok(Ok(object)) => {
            *out = Box::into_raw(Box::new(object)).cast();
            STATUS_OK
        }
        Ok(Err(e)) => {
            if e.kind() != ErrorKind::NotFound {
                tracing::error!(object_id = id, error = %e, "Object construction failed");
            }
            e.exit_code() as i32
        }
        Err(_) => {
            tracing::error!(object_id = id, "Object constructor panicked");
            ErrorKind::Allocation.exit_code() as i32
        }
    }
}

/// Host side of the entry point: call `entry` and take ownership of the
/// returned object.
///
/// # Safety
/// `entry` must be a function exported through [`dispatch_get_object`] whose
/// library stays loaded while the returned object lives.
pub unsafe fn call_get_object(entry: GetObjectFn, library: &str, object_id: &str) -> Result<SharedObject> {
    let c_id = std::ffi::CString::new(object_id)
        .map_err(|_| HostError::InvalidArgument(format!("object id {object_id:?} contains NUL")))?;
    let host = HostContext::current();
    let mut out: *mut c_void = ptr::null_mut();

    let status = entry(c_id.as_ptr(), &host, &mut out);
    let context = format!("{library}/{object_id}");
    if status != STATUS_OK {
        return Err(HostError::from_status(status, &context));
    }
    if out.is_null() {
        return Err(HostError::Allocation(context));
    }
    Ok(*Box::from_raw(out.cast::<SharedObject>()))
}

/// Generate the `modhost_get_object` entry point of a shared library.
///
/// `$constructor` is a `fn(&str) -> modhost::Result<SharedObject>` returning
/// `NotFound` for ids the library does not provide.
#[macro_export]
macro_rules! export_objects {
    ($constructor:path) => {
        #[no_mangle]
        #[allow(improper_ctypes_definitions)]
        pub unsafe extern "C" fn modhost_get_object(
            id: *const ::std::ffi::c_char,
            host: *const $crate::factory::abi::HostContext,
            out: *mut *mut ::std::ffi::c_void,
        ) -> i32 {
            $crate::factory::abi::dispatch_get_object(id, host, out, $constructor)
        }
    };
}
