//! Reusable lifecycle guard.
//!
//! `StateMachine` holds a unit's [`LifecycleState`] behind a re-entrant lock and
//! implements the precondition checks of the contract once, so units only
//! supply the work done inside each transition.

use std::cell::Cell;

use parking_lot::ReentrantMutex;

use crate::error::{HostError, Result, Severity};
use crate::lifecycle::LifecycleState;

/// Guarded lifecycle state of one unit.
pub struct StateMachine {
    name: String,
    state: ReentrantMutex<Cell<LifecycleState>>,
}

impl StateMachine {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: ReentrantMutex::new(Cell::new(LifecycleState::Uninitialized)),
        }
    }

    /// Unit name used in log records.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> LifecycleState {
        self.state.lock().get()
    }

    /// Run `f` with the current state while holding the transition lock, so
    /// no transition can interleave.
    pub fn with_state<R>(&self, f: impl FnOnce(LifecycleState) -> R) -> R {
        let state = self.state.lock();
        f(state.get())
    }

    /// Run `hook` and move to `Initialized` if it succeeds.
    pub fn initialize<F>(&self, hook: F) -> Result<()>
    where
        F: FnOnce() -> Result<()>,
    {
        let state = self.state.lock();
        if state.get() != LifecycleState::Uninitialized {
            tracing::info!(unit = %self.name, "Already initialized");
            return Err(HostError::AlreadyInitialized);
        }

        tracing::info!(unit = %self.name, "Initializing");
        match hook() {
            Ok(()) => {
                state.set(LifecycleState::Initialized);
                tracing::info!(unit = %self.name, "Initialized");
                Ok(())
            }
            Err(e) => {
                tracing::error!(unit = %self.name, error = %e, "Initialize failed");
                Err(e)
            }
        }
    }

    /// Run `hook` and move to `Uninitialized` whatever it returns.
    ///
    /// A hook failure is logged and returned, but resources are considered
    /// released.
    pub fn uninitialize<F>(&self, hook: F) -> Result<()>
    where
        F: FnOnce() -> Result<()>,
    {
        let state = self.state.lock();
        tracing::info!(unit = %self.name, "Uninitializing");
        match state.get() {
            LifecycleState::Running => {
                tracing::error!(unit = %self.name, "Still running - can not be uninitialized");
                return Err(HostError::StillRunning);
            }
            LifecycleState::Uninitialized => {
                tracing::info!(unit = %self.name, "Has not been initialized");
                return Err(HostError::NotInitialized(Severity::Info));
            }
            LifecycleState::Initialized => {}
        }

        let result = hook();
        state.set(LifecycleState::Uninitialized);
        match &result {
            Ok(()) => tracing::info!(unit = %self.name, "Uninitialized"),
            Err(e) => tracing::error!(unit = %self.name, error = %e, "Uninitialized with errors"),
        }
        result
    }

    /// Run `hook` and move to `Running` if it succeeds.
    pub fn start<F>(&self, hook: F) -> Result<()>
    where
        F: FnOnce() -> Result<()>,
    {
        let state = self.state.lock();
        tracing::info!(unit = %self.name, "Starting");
        match state.get() {
            LifecycleState::Uninitialized => {
                tracing::error!(unit = %self.name, "Has not been initialized - can not be started");
                return Err(HostError::NotInitialized(Severity::Error));
            }
            LifecycleState::Running => {
                tracing::info!(unit = %self.name, "Already started");
                return Err(HostError::AlreadyRunning);
            }
            LifecycleState::Initialized => {}
        }

        match hook() {
            Ok(()) => {
                state.set(LifecycleState::Running);
                tracing::info!(unit = %self.name, "Started");
                Ok(())
            }
            Err(e) => {
                tracing::error!(unit = %self.name, error = %e, "Start failed");
                Err(e)
            }
        }
    }

    /// Run `hook` and move back to `Initialized` whatever it returns.
    pub fn stop<F>(&self, hook: F) -> Result<()>
    where
        F: FnOnce() -> Result<()>,
    {
        let state = self.state.lock();
        tracing::info!(unit = %self.name, "Stopping");
        if state.get() != LifecycleState::Running {
            tracing::info!(unit = %self.name, "Has not been started");
            return Err(HostError::NotRunning);
        }

        let result = hook();
        state.set(LifecycleState::Initialized);
        match &result {
            Ok(()) => tracing::info!(unit = %self.name, "Stopped"),
            Err(e) => tracing::error!(unit = %self.name, error = %e, "Stopped with errors"),
        }
        result
    }
}

impl std::fmt::Debug for StateMachine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateMachine")
            .field("name", &self.name)
            .field("state", &self.state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn ok() -> Result<()> {
        Ok(())
    }

    #[test]
    fn test_full_cycle() {
        let machine = StateMachine::new("unit");
        machine.initialize(ok).unwrap();
        assert_eq!(machine.state(), LifecycleState::Initialized);
        machine.start(ok).unwrap();
        assert_eq!(machine.state(), LifecycleState::Running);
        machine.stop(ok).unwrap();
        assert_eq!(machine.state(), LifecycleState::Initialized);
        machine.uninitialize(ok).unwrap();
        assert_eq!(machine.state(), LifecycleState::Uninitialized);
    }

    #[test]
    fn test_failed_initialize_keeps_state() {
        let machine = StateMachine::new("unit");
        let err = machine
            .initialize(|| Err(HostError::Allocation("boom".into())))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Allocation);
        assert_eq!(machine.state(), LifecycleState::Uninitialized);
    }

    #[test]
    fn test_teardown_commits_on_hook_failure() {
        let machine = StateMachine::new("unit");
        machine.initialize(ok).unwrap();
        machine.start(ok).unwrap();

        let err = machine
            .stop(|| Err(HostError::InvalidArgument("worker".into())))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert_eq!(machine.state(), LifecycleState::Initialized);

        let err = machine
            .uninitialize(|| Err(HostError::InvalidArgument("worker".into())))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert_eq!(machine.state(), LifecycleState::Uninitialized);
    }

    #[test]
    fn test_hook_not_called_on_wrong_state() {
        let machine = StateMachine::new("unit");
        let calls = AtomicUsize::new(0);
        let hook = || {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        };

        assert_eq!(machine.start(hook).unwrap_err().kind(), ErrorKind::NotInitialized);
        assert_eq!(machine.stop(hook).unwrap_err().kind(), ErrorKind::NotRunning);
        assert!(machine.uninitialize(hook).unwrap_err().is_info());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_reentrant_query_from_hook() {
        let machine = StateMachine::new("unit");
        machine
            .initialize(|| {
                // Same thread, lock already held.
                assert_eq!(machine.state(), LifecycleState::Uninitialized);
                Ok(())
            })
            .unwrap();
        machine
            .start(|| {
                assert_eq!(
                    machine.initialize(ok).unwrap_err().kind(),
                    ErrorKind::AlreadyInitialized
                );
                Ok(())
            })
            .unwrap();
        assert_eq!(machine.state(), LifecycleState::Running);
    }

    #[test]
    fn test_concurrent_start_only_one_wins() {
        let machine = Arc::new(StateMachine::new("unit"));
        machine.initialize(ok).unwrap();
        let started = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let machine = machine.clone();
                let started = started.clone();
                std::thread::spawn(move || {
                    if machine.start(ok).is_ok() {
                        started.fetch_add(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(started.load(Ordering::SeqCst), 1);
        assert_eq!(machine.state(), LifecycleState::Running);
    }
}
