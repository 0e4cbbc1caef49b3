//! Platform-specific process termination.
//!
//! Two interchangeable strategies sit behind [`TerminationStrategy`]:
//! - `SignalStrategy` (Unix): SIGTERM, then SIGKILL
//! - `UtilityStrategy` (Windows): `taskkill`, then `taskkill /F`
//!
//! [`platform_strategy`] picks one once at startup. Neither strategy returns
//! errors; every attempt yields a [`TerminationResult`].

mod escalation;
#[cfg(unix)]
mod signal;
mod utility;

use std::sync::Arc;

use async_trait::async_trait;
use jvmhost_core::TerminationResult;

pub use escalation::{StopReport, escalate};
#[cfg(unix)]
pub use signal::SignalStrategy;
pub use utility::UtilityStrategy;

/// Kill primitives for a process identified only by PID.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TerminationStrategy: Send + Sync {
    /// Ask the process to shut down cooperatively.
    async fn terminate(&self, pid: u32) -> TerminationResult;

    /// Kill the process without giving it a chance to clean up.
    async fn force_kill(&self, pid: u32) -> TerminationResult;

    /// Liveness probe. Must not disturb the process.
    fn is_alive(&self, pid: u32) -> bool;

    /// Short name for logs.
    fn name(&self) -> &'static str;
}

/// Select the strategy for the host OS.
pub fn platform_strategy() -> Arc<dyn TerminationStrategy> {
    #[cfg(unix)]
    {
        Arc::new(SignalStrategy::new())
    }

    #[cfg(not(unix))]
    {
        Arc::new(UtilityStrategy::new())
    }
}
