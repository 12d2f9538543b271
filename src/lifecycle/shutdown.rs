//! Stop coordination for the host process.

use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

/// Manual-reset event signalled when the process should stop.
///
/// Setting is idempotent; any number of threads may wait.
#[derive(Debug, Default)]
pub struct StopEvent {
    signalled: Mutex<bool>,
    cond: Condvar,
}

impl StopEvent {
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal the event and wake all waiters.
    ///
    /// Returns `true` only for the call that actually changed the state.
    pub fn set(&self) -> bool {
        let mut signalled = self.signalled.lock();
        if *signalled {
            return false;
        }
        *signalled = true;
        self.cond.notify_all();
        true
    }

    /// Clear the event so it can be waited on again.
    pub fn reset(&self) {
        *self.signalled.lock() = false;
    }

    pub fn is_set(&self) -> bool {
        *self.signalled.lock()
    }

    /// Block until the event is set.
    pub fn wait(&self) {
        let mut signalled = self.signalled.lock();
        while !*signalled {
            self.cond.wait(&mut signalled);
        }
    }

    /// Block until the event is set or `timeout` elapses. Returns whether the
    /// event was set.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut signalled = self.signalled.lock();
        while !*signalled {
            if self.cond.wait_until(&mut signalled, deadline).timed_out() {
                break;
            }
        }
        *signalled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_set_is_idempotent() {
        let event = StopEvent::new();
        assert!(event.set());
        assert!(!event.set());
        assert!(event.is_set());
        event.reset();
        assert!(!event.is_set());
    }

    #[test]
    fn test_wait_wakes_on_set() {
        let event = Arc::new(StopEvent::new());
        let waiter = {
            let event = event.clone();
            std::thread::spawn(move || event.wait())
        };
        std::thread::sleep(Duration::from_millis(20));
        event.set();
        waiter.join().unwrap();
    }

    #[test]
    fn test_wait_timeout_expires() {
        let event = StopEvent::new();
        assert!(!event.wait_timeout(Duration::from_millis(10)));
        event.set();
        assert!(event.wait_timeout(Duration::from_millis(10)));
    }
}
