//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Contract (this file):
//!     Uninitialized ──initialize──▶ Initialized ──start──▶ Running
//!     Uninitialized ◀─uninitialize─ Initialized ◀──stop─── Running
//!
//! State machine (state.rs):
//!     Guard checks → unit hook → commit state
//!
//! Shutdown (shutdown.rs):
//!     Signal or request → stop event set → waiter wakes
//!
//! Signals (signals.rs):
//!     SIGABRT/SIGINT/SIGTERM → self-pipe → dispatcher thread → on_signal
//! ```
//!
//! # Design Decisions
//! - Benign no-ops (start while running, ...) are info-level errors, not panics
//! - Teardown (stop, uninitialize) always commits; inner failures are reported
//! - Each unit serializes its own transitions with a re-entrant lock

pub mod shutdown;
#[cfg(unix)]
pub mod signals;
pub mod state;

use std::fmt;

use crate::error::Result;

pub use shutdown::StopEvent;
pub use state::StateMachine;

/// Lifecycle state shared by every manageable unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleState {
    Uninitialized,
    Initialized,
    Running,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifecycleState::Uninitialized => write!(f, "uninitialized"),
            LifecycleState::Initialized => write!(f, "initialized"),
            LifecycleState::Running => write!(f, "running"),
        }
    }
}

/// The four-state protocol every module, manager and the bootstrap implement.
///
/// All methods take `&self`: implementations guard their own state and must
/// tolerate being called from several threads, including re-entrant calls
/// from the thread that is already inside a transition.
///
/// | call           | wrong state                 | result                 |
/// |----------------|-----------------------------|------------------------|
/// | `initialize`   | not `Uninitialized`         | `AlreadyInitialized`   |
/// | `uninitialize` | `Running` / `Uninitialized` | `StillRunning` / `NotInitialized` (info) |
/// | `start`        | `Uninitialized` / `Running` | `NotInitialized` / `AlreadyRunning` |
/// | `stop`         | not `Running`               | `NotRunning`           |
pub trait Lifecycle: Send + Sync {
    fn initialize(&self) -> Result<()>;

    fn uninitialize(&self) -> Result<()>;

    fn start(&self) -> Result<()>;

    fn stop(&self) -> Result<()>;

    fn state(&self) -> LifecycleState;

    fn initialized(&self) -> bool {
        self.state() != LifecycleState::Uninitialized
    }

    fn running(&self) -> bool {
        self.state() == LifecycleState::Running
    }
}
