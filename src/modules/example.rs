//! Example module: runs a periodic task on its own worker while started.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::error::Result;
use crate::factory::DllObject;
use crate::lifecycle::{Lifecycle, LifecycleState, StateMachine};
use crate::threading::UniqueWorker;

/// Default task period.
pub const TASK_PERIOD: Duration = Duration::from_millis(100);

pub struct ExampleModule {
    machine: StateMachine,
    worker: UniqueWorker,
    period: Duration,
    executions: Arc<AtomicU64>,
}

impl ExampleModule {
    pub fn new(name: &str) -> Self {
        Self::with_period(name, TASK_PERIOD)
    }

    pub fn with_period(name: &str, period: Duration) -> Self {
        Self {
            machine: StateMachine::new(name),
            worker: UniqueWorker::new(name),
            period,
            executions: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Task body run by the worker.
    pub fn on_task(name: &str, executions: &AtomicU64) {
        let count = executions.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::info!(module = name, count, "Executing task");
    }

    /// How many times the task ran.
    pub fn executions(&self) -> u64 {
        self.executions.load(Ordering::Relaxed)
    }
}

impl Lifecycle for ExampleModule {
    fn initialize(&self) -> Result<()> {
        self.machine.initialize(|| {
            let name = self.machine.name().to_string();
            let executions = self.executions.clone();
            self.worker
                .set_task(move || ExampleModule::on_task(&name, &executions));
            Ok(())
        })
    }

    fn uninitialize(&self) -> Result<()> {
        self.machine.uninitialize(|| Ok(()))
    }

    fn start(&self) -> Result<()> {
        self.machine.start(|| self.worker.start(self.period))
    }

    fn stop(&self) -> Result<()> {
        self.machine.stop(|| self.worker.stop())
    }

    fn state(&self) -> LifecycleState {
        self.machine.state()
    }
}

impl DllObject for ExampleModule {
    fn as_lifecycle(self: Arc<Self>) -> Option<Arc<dyn Lifecycle>> {
        Some(self)
    }
}
