//! Graceful → forced stop escalation.

use std::time::Duration;

use jvmhost_core::{ShutdownSettings, TerminationResult};
use tokio::time::{Instant, sleep};
use tracing::{debug, warn};

use super::TerminationStrategy;

/// What happened while stopping one process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopReport {
    pub graceful: TerminationResult,
    /// Present only if escalation to a forced kill was needed.
    pub forced: Option<TerminationResult>,
    /// Whether the process was observed gone before returning.
    pub exited: bool,
}

impl StopReport {
    pub const fn escalated(&self) -> bool {
        self.forced.is_some()
    }
}

/// Stop `pid` with graceful → forced escalation.
///
/// # Strategy
/// 1. Request graceful termination
/// 2. Poll liveness every `poll` for up to `grace`
/// 3. If still alive, force kill exactly once
/// 4. Poll again for up to `grace` to observe the exit
///
/// `exited` lets the caller report an exit it observed itself (a reaped
/// child), which a PID probe alone can miss.
pub async fn escalate(
    strategy: &dyn TerminationStrategy,
    pid: u32,
    timing: &ShutdownSettings,
    exited: &(dyn Fn() -> bool + Send + Sync),
) -> StopReport {
    let gone = || exited() || !strategy.is_alive(pid);

    let graceful = strategy.terminate(pid).await;
    if graceful.success {
        debug!(pid = %pid, strategy = strategy.name(), "Graceful termination requested");
        if wait_until(&gone, timing.grace(), timing.poll()).await {
            return StopReport {
                graceful,
                forced: None,
                exited: true,
            };
        }
        debug!(pid = %pid, grace_ms = timing.grace_ms, "Process outlived grace period, escalating");
    } else if gone() {
        // Nothing to signal: the process is already gone
        return StopReport {
            graceful,
            forced: None,
            exited: true,
        };
    } else {
        warn!(
            pid = %pid,
            error = graceful.error.as_deref().unwrap_or("unknown"),
            "Graceful termination failed, escalating"
        );
    }

    let forced = strategy.force_kill(pid).await;
    if !forced.success {
        warn!(
            pid = %pid,
            error = forced.error.as_deref().unwrap_or("unknown"),
            "Forced termination failed"
        );
    }

    let exited = wait_until(&gone, timing.grace(), timing.poll()).await;
    if !exited {
        warn!(pid = %pid, "Process still alive after forced termination");
    }

    StopReport {
        graceful,
        forced: Some(forced),
        exited,
    }
}

/// Poll `done` until it returns true or `budget` elapses.
async fn wait_until(done: &impl Fn() -> bool, budget: Duration, every: Duration) -> bool {
    let deadline = Instant::now() + budget;
    loop {
        if done() {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        sleep(every).await;
    }
}
