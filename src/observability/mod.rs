//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems and loaded libraries produce:
//!     → tracing events with structured fields
//!     → logging.rs (EnvFilter + fmt layer)
//!     → rotation.rs (size-rotated log file)
//! ```
//!
//! # Design Decisions
//! - One global subscriber per process; libraries receive the host's
//!   dispatcher through the object ABI so their events land in the same file
//! - Plain text without ANSI colors, one event per line
//! - Each bootstrap run carries a run id span

pub mod logging;
pub mod rotation;

pub use logging::{init_logging, LoggingSettings};
pub use rotation::RotatingFile;
