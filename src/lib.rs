//! Module host runtime library.
//!
//! Boots a process through ordered subsystem initialization and hosts
//! modules, statically linked or loaded from shared libraries, under one
//! lifecycle contract.

pub mod app;
pub mod bootstrap;
pub mod config;
pub mod error;
pub mod factory;
pub mod lifecycle;
pub mod modules;
pub mod observability;
pub mod threading;

pub use bootstrap::{Bootstrap, MainInitializer};
pub use error::{ErrorKind, HostError, Result};
pub use factory::{DllFactory, DllObject, SharedObject};
pub use lifecycle::{Lifecycle, LifecycleState};
pub use modules::ModuleManager;
