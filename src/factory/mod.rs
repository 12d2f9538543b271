//! Dynamic library object factory.
//!
//! # Data Flow
//! ```text
//! get_object(library_id, object_id)
//!     → library.rs (logical id → path)
//!     → loader.rs (path → ObjectProvider, loaded once, kept resident)
//!         → StaticLoader: in-process providers (sys.rs, tests)
//!         → NativeLoader: libloading + abi.rs entry point
//!     → provider constructs the object
//!
//! get_shared_object(library_id, object_id)
//!     → weak cache hit: return the live object
//!     → miss: get_object, cache a weak reference
//! ```
//!
//! # Design Decisions
//! - The factory never keeps an object alive by itself
//! - A failed load is not remembered; the next call tries again
//! - One re-entrant lock per factory serializes loads and cache lookups

pub mod abi;
pub mod dll_factory;
pub mod library;
pub mod loader;
pub mod object;
pub mod shared;
pub mod sys;

pub use dll_factory::DllFactory;
pub use library::LibraryList;
pub use loader::{LibraryLoader, NativeLoader, ObjectProvider, StaticLoader};
pub use object::{downcast_object, AsAnyArc, DllObject, SharedObject};
pub use shared::SharedSlot;
pub use sys::{SysServices, SYS_LIBRARY_ID, SYS_LIBRARY_PATH, SYS_OBJECT_ID};
