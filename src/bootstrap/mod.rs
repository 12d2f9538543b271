//! Process bootstrap.
//!
//! # Data Flow
//! ```text
//! run(bootstrap)
//!     → initialize: passive config → logging → library factory + sys services
//!                   → active config → stop event → module manager
//!     → install signal handlers (SIGABRT, SIGINT, SIGTERM)
//!     → start module manager
//!     → wait for stop request (signal or request_stop)
//!     → stop → uninitialize → clear signal handlers
//! ```
//!
//! # Design Decisions
//! - Initialization fails fast and releases partial state
//! - Teardown is always attempted; benign no-ops are not failures
//! - The first failure decides the process exit code

pub mod initializer;
pub mod orchestrator;

use std::sync::Arc;

use crate::error::{ignore_info, Result};
use crate::lifecycle::Lifecycle;

pub use initializer::MainInitializer;
pub use orchestrator::Bootstrap;

/// Initialize, start and serve until a stop is requested, then tear down.
///
/// Start is not attempted if initialize fails; stop and uninitialize always
/// are. The first failure is returned.
pub fn run(bootstrap: &Arc<Bootstrap>) -> Result<()> {
    let served = serve(bootstrap);
    if let Err(e) = &served {
        tracing::error!(error = %e, "Bootstrap failed");
    }

    let stopped = ignore_info(bootstrap.stop());
    let released = ignore_info(bootstrap.uninitialize());
    #[cfg(unix)]
    crate::lifecycle::signals::clear();

    served.and(stopped).and(released)
}

fn serve(bootstrap: &Arc<Bootstrap>) -> Result<()> {
    ignore_info(bootstrap.initialize())?;

    #[cfg(unix)]
    {
        let handler: Arc<dyn crate::lifecycle::signals::SignalHandler> = bootstrap.clone();
        crate::lifecycle::signals::install(&handler)?;
    }

    ignore_info(bootstrap.start())?;
    bootstrap.wait_for_stop_request()
}
