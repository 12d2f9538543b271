//! Configuration subsystem.
//!
//! # Data Flow
//! ```text
//! passive file (TOML, read once)
//!     → loader.rs (parse)
//!     → validation.rs (type checks against the key map)
//!     → PassiveConfig (immutable, values by key id)
//!
//! active file (TOML, one [group] table)
//!     → ActiveConfig::initialize (create if missing, read group)
//!     → ArcSwap snapshot read by ConfigStore::value
//!     → set_value writes through and swaps a new snapshot
//!
//! On change:
//!     watcher.rs detects a write to the active file
//!     → ActiveConfig::reload
//!     → atomic swap of the snapshot
//! ```
//!
//! # Design Decisions
//! - Entries are addressed by integer key ids owned by the application
//! - Every key may carry a default; a key without one reads as `DoesNotExist`
//! - Validation reports every bad entry at once

pub mod active;
pub mod loader;
pub mod passive;
pub mod schema;
pub mod store;
pub mod validation;
pub mod watcher;

pub use active::ActiveConfig;
pub use passive::PassiveConfig;
pub use schema::{ActiveKey, ActiveKeyMap, ConfigKey, ConfigValue, PassiveKey, PassiveKeyMap};
pub use store::{ConfigStore, ConfigStoreExt};
pub use watcher::ConfigWatcher;
