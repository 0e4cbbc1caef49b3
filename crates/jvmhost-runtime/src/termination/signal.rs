//! Signal-based termination for Unix hosts.

use async_trait::async_trait;
use jvmhost_core::{TerminationMethod, TerminationResult};
use nix::errno::Errno;
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;

use super::TerminationStrategy;

/// SIGTERM for graceful, SIGKILL for forced, signal 0 for liveness.
#[derive(Debug, Clone, Default)]
pub struct SignalStrategy;

impl SignalStrategy {
    pub const fn new() -> Self {
        Self
    }

    fn send(pid: u32, signal: Signal, method: TerminationMethod) -> TerminationResult {
        let Ok(raw) = i32::try_from(pid) else {
            return TerminationResult::failed(method, format!("PID {pid} out of range"));
        };

        match signal::kill(Pid::from_raw(raw), signal) {
            Ok(()) => TerminationResult::delivered(method),
            Err(Errno::ESRCH) => {
                TerminationResult::failed(method, format!("no such process: {pid}"))
            }
            Err(e) => TerminationResult::failed(method, format!("{signal} to {pid} failed: {e}")),
        }
    }
}

#[async_trait]
impl TerminationStrategy for SignalStrategy {
    async fn terminate(&self, pid: u32) -> TerminationResult {
        Self::send(pid, Signal::SIGTERM, TerminationMethod::Graceful)
    }

    async fn force_kill(&self, pid: u32) -> TerminationResult {
        Self::send(pid, Signal::SIGKILL, TerminationMethod::Forced)
    }

    fn is_alive(&self, pid: u32) -> bool {
        let Ok(raw) = i32::try_from(pid) else {
            return false;
        };
        match signal::kill(Pid::from_raw(raw), None) {
            Ok(()) => true,
            Err(Errno::ESRCH) => false,
            // EPERM: the process exists but belongs to someone else
            Err(_) => true,
        }
    }

    fn name(&self) -> &'static str {
        "signal"
    }
}
