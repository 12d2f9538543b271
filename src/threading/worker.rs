//! Single-task periodic worker thread.

use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use parking_lot::Mutex;

use crate::error::{HostError, Result};
use crate::lifecycle::StopEvent;

type Task = Arc<dyn Fn() + Send + Sync>;

struct RunningWorker {
    stop: Arc<StopEvent>,
    handle: JoinHandle<()>,
}

/// Runs one task repeatedly on its own thread until stopped.
///
/// At most one thread exists per worker; starting a running worker fails with
/// `AlreadyRunning`.
pub struct UniqueWorker {
    name: String,
    task: Mutex<Option<Task>>,
    running: Mutex<Option<RunningWorker>>,
}

impl UniqueWorker {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            task: Mutex::new(None),
            running: Mutex::new(None),
        }
    }

    /// Replace the task. Takes effect on the next start.
    pub fn set_task<F>(&self, task: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        *self.task.lock() = Some(Arc::new(task));
    }

    pub fn is_running(&self) -> bool {
        self.running.lock().is_some()
    }

    /// Spawn the thread. The task runs immediately, then once per `period`.
    pub fn start(&self, period: Duration) -> Result<()> {
        let mut running = self.running.lock();
        if running.is_some() {
            return Err(HostError::AlreadyRunning);
        }
        let task = self
            .task
            .lock()
            .clone()
            .ok_or_else(|| HostError::InvalidArgument(format!("worker {} has no task", self.name)))?;

        let stop = Arc::new(StopEvent::new());
        let thread_stop = stop.clone();
        let handle = std::thread::Builder::new()
            .name(self.name.clone())
            .spawn(move || loop {
                task();
                if thread_stop.wait_timeout(period) {
                    break;
                }
            })?;

        tracing::debug!(worker = %self.name, period_ms = period.as_millis() as u64, "Worker started");
        *running = Some(RunningWorker { stop, handle });
        Ok(())
    }

    /// Signal the thread and wait for it to exit.
    pub fn stop(&self) -> Result<()> {
        let worker = self.running.lock().take().ok_or(HostError::NotRunning)?;
        worker.stop.set();
        worker
            .handle
            .join()
            .map_err(|_| HostError::Allocation(format!("worker {} panicked", self.name)))?;
        tracing::debug!(worker = %self.name, "Worker stopped");
        Ok(())
    }
}

impl Drop for UniqueWorker {
    fn drop(&mut self) {
        if let Some(worker) = self.running.get_mut().take() {
            worker.stop.set();
            let _ = worker.handle.join();
        }
    }
}
