//! Threading primitives handed to modules.
//!
//! # Data Flow
//! ```text
//! SysServices::unique_worker()
//!     → UniqueWorker (one task, one thread)
//!     → start(period): run task, sleep on stop event, repeat
//!     → stop(): set stop event, join thread
//! ```
//!
//! The process stop event lives in `lifecycle::shutdown`.

pub mod worker;

pub use worker::UniqueWorker;
