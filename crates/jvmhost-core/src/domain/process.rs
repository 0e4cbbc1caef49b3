//! Worker process lifecycle snapshot.
//!
//! `ProcessStatus` is owned by the supervisor; observers only ever see
//! clones. The mutators below are the only way the supervisor changes it, and
//! they keep `pid` set exactly while the state is `Running` or `Stopping`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Supervisor lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessState {
    #[default]
    Idle,
    Starting,
    Running,
    Stopping,
    Stopped,
    Error,
}

impl ProcessState {
    /// States from which `start()` is permitted.
    pub const fn can_start(self) -> bool {
        matches!(self, Self::Idle | Self::Stopped | Self::Error)
    }

    /// States in which a live worker PID is tracked.
    pub const fn has_process(self) -> bool {
        matches!(self, Self::Running | Self::Stopping)
    }
}

impl std::fmt::Display for ProcessState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Starting => "starting",
            Self::Running => "running",
            Self::Stopping => "stopping",
            Self::Stopped => "stopped",
            Self::Error => "error",
        };
        f.write_str(name)
    }
}

/// Read-only snapshot of the supervised worker.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessStatus {
    pub state: ProcessState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,
    /// Port of the current or most recent launch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl ProcessStatus {
    pub fn mark_starting(&mut self, port: u16) {
        self.state = ProcessState::Starting;
        self.pid = None;
        self.port = Some(port);
        self.start_time = None;
        self.last_error = None;
    }

    pub fn mark_running(&mut self, pid: u32, start_time: DateTime<Utc>) {
        self.state = ProcessState::Running;
        self.pid = Some(pid);
        self.start_time = Some(start_time);
    }

    pub fn mark_stopping(&mut self) {
        self.state = ProcessState::Stopping;
    }

    pub fn mark_stopped(&mut self) {
        self.state = ProcessState::Stopped;
        self.pid = None;
    }

    pub fn mark_error(&mut self, error: impl Into<String>) {
        self.state = ProcessState::Error;
        self.pid = None;
        self.last_error = Some(error.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_pid_invariant(status: &ProcessStatus) {
        assert_eq!(status.pid.is_some(), status.state.has_process());
    }

    #[test]
    fn test_pid_tracks_live_states() {
        let mut status = ProcessStatus::default();
        assert_pid_invariant(&status);

        status.mark_starting(8765);
        assert_pid_invariant(&status);
        assert_eq!(status.port, Some(8765));

        status.mark_running(4242, Utc::now());
        assert_pid_invariant(&status);

        status.mark_stopping();
        assert_pid_invariant(&status);
        assert_eq!(status.pid, Some(4242));

        status.mark_stopped();
        assert_pid_invariant(&status);
        assert_eq!(status.port, Some(8765));
    }

    #[test]
    fn test_error_clears_pid_and_keeps_message() {
        let mut status = ProcessStatus::default();
        status.mark_starting(8765);
        status.mark_running(1, Utc::now());
        status.mark_error("exit code 1");
        assert_pid_invariant(&status);
        assert_eq!(status.last_error.as_deref(), Some("exit code 1"));
        assert!(status.state.can_start());
    }

    #[test]
    fn test_restart_clears_previous_error() {
        let mut status = ProcessStatus::default();
        status.mark_error("boom");
        status.mark_starting(9000);
        assert!(status.last_error.is_none());
    }

    #[test]
    fn test_status_serialization() {
        let mut status = ProcessStatus::default();
        status.mark_starting(8765);
        let json = serde_json::to_string(&status).unwrap();
        assert!(json.contains("\"state\":\"starting\""));
        assert!(json.contains("\"port\":8765"));
        assert!(!json.contains("pid"));
    }
}
