//! Startup cleanup of a worker orphaned by a crashed host.

use std::io;
use std::path::Path;

use jvmhost_core::ShutdownSettings;
use tracing::{debug, info, warn};

use super::io::{delete_pidfile, read_pidfile};
use super::verify::looks_like_java;
use crate::termination::{StopReport, TerminationStrategy, escalate};

/// What the sweep found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SweepOutcome {
    /// No PID file present.
    Clean,
    /// The file was unreadable or named a process that is gone or not ours.
    StaleRemoved,
    /// A live orphan was stopped.
    Terminated { pid: u32, report: StopReport },
}

/// Stop the worker recorded in `path`, if it is still running, and remove
/// the file.
///
/// The recorded PID is only signalled when it still looks like a Java
/// runtime. Otherwise only the file is removed.
pub async fn sweep_orphan(
    path: &Path,
    strategy: &dyn TerminationStrategy,
    timing: &ShutdownSettings,
) -> io::Result<SweepOutcome> {
    sweep_with(path, strategy, timing, &looks_like_java).await
}

async fn sweep_with(
    path: &Path,
    strategy: &dyn TerminationStrategy,
    timing: &ShutdownSettings,
    verify: &(dyn Fn(u32) -> bool + Send + Sync),
) -> io::Result<SweepOutcome> {
    let data = match read_pidfile(path) {
        Ok(Some(data)) => data,
        Ok(None) => {
            debug!("No orphaned worker PID file found");
            return Ok(SweepOutcome::Clean);
        }
        Err(e) if e.kind() == io::ErrorKind::InvalidData => {
            warn!(path = %path.display(), error = %e, "Removing malformed PID file");
            delete_pidfile(path)?;
            return Ok(SweepOutcome::StaleRemoved);
        }
        Err(e) => return Err(e),
    };

    if !strategy.is_alive(data.pid) || !verify(data.pid) {
        debug!(
            pid = %data.pid,
            port = %data.port,
            "Recorded worker is gone or not a Java runtime, removing stale PID file"
        );
        delete_pidfile(path)?;
        return Ok(SweepOutcome::StaleRemoved);
    }

    info!(pid = %data.pid, port = %data.port, "Stopping orphaned worker");
    let report = escalate(strategy, data.pid, timing, &|| false).await;
    if !report.exited {
        warn!(pid = %data.pid, "Orphaned worker did not exit; removing PID file anyway");
    }
    delete_pidfile(path)?;

    Ok(SweepOutcome::Terminated {
        pid: data.pid,
        report,
    })
}
