//! Module hosting.
//!
//! # Data Flow
//! ```text
//! add_module(id, unit, configurator)
//!     → registry (ordered, unique ids)
//!
//! initialize / start (registration order, fail fast):
//!     configurator.is_installed() / is_enabled()
//!     → unit.initialize() / unit.start()
//!
//! stop / uninitialize (reverse order, visit all):
//!     unit.stop() / unit.uninitialize()
//!     → first failure reported
//!
//! DllModule:
//!     initialize → DllFactory::get_object → as_lifecycle → delegate
//! ```
//!
//! # Design Decisions
//! - A module that is not installed is never touched
//! - No rollback when initialize or start fails part way
//! - The manager is itself a lifecycle unit and can be nested

pub mod configurator;
pub mod dll_module;
pub mod example;
pub mod manager;

pub use configurator::{ConfigModuleConfigurator, FixedConfigurator, ModuleConfigurator};
pub use dll_module::DllModule;
pub use example::ExampleModule;
pub use manager::{ModuleId, ModuleManager, ModuleStatus};
