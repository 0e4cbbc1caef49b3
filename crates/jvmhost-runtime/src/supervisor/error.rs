use jvmhost_core::ProcessState;
use thiserror::Error;

use crate::discovery::DiscoveryError;
use crate::launcher::LaunchError;

/// Errors returned by supervisor operations.
#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    #[error(transparent)]
    Launch(#[from] LaunchError),

    /// Another `start()` has not finished yet.
    #[error("Worker start already in progress")]
    StartInProgress,

    #[error("Cannot {operation} worker while {state}")]
    InvalidState {
        operation: &'static str,
        state: ProcessState,
    },

    /// The previous worker could not be confirmed gone, so no new one was started.
    #[error("Worker {pid} did not exit; refusing to start another")]
    StopFailed { pid: u32 },
}
