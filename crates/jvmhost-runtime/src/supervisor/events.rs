//! Worker lifecycle events.
//!
//! Observers (the bootstrap orchestrator, UI surfaces) receive these over a
//! broadcast channel. The latest status snapshot is also available through a
//! watch channel for consumers that only care about the current state.

use std::path::PathBuf;

use jvmhost_core::ProcessStatus;
use serde::{Deserialize, Serialize};

/// How a worker process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerExit {
    pub pid: u32,
    /// `None` when the process was killed by a signal.
    pub code: Option<i32>,
    pub success: bool,
}

impl WorkerExit {
    pub fn describe(&self) -> String {
        match self.code {
            Some(code) => format!("exit code {code}"),
            None => "terminated by signal".to_string(),
        }
    }
}

/// Worker lifecycle event payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SupervisorEvent {
    /// Emitted on every state transition with the full snapshot.
    StatusChanged { status: ProcessStatus },

    /// The worker process was spawned and is running.
    Started { pid: u32, port: u16 },

    /// The worker exited on its own with status zero.
    Exited { exit: WorkerExit },

    /// The worker exited non-zero, or was killed, while running.
    #[serde(rename_all = "camelCase")]
    Crashed {
        exit: WorkerExit,
        log_path: Option<PathBuf>,
        /// Last captured output lines, oldest first.
        tail: Vec<String>,
    },

    /// A requested stop finished.
    Stopped {
        pid: u32,
        escalated: bool,
        confirmed: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_wire_format() {
        let event = SupervisorEvent::Started {
            pid: 10,
            port: 8765,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "started");
        assert_eq!(json["port"], 8765);

        let crash = SupervisorEvent::Crashed {
            exit: WorkerExit {
                pid: 10,
                code: Some(1),
                success: false,
            },
            log_path: None,
            tail: vec!["[stderr] boom".to_string()],
        };
        let json = serde_json::to_value(&crash).unwrap();
        assert_eq!(json["type"], "crashed");
        assert_eq!(json["exit"]["code"], 1);
        assert!(json.get("logPath").is_some());
    }

    #[test]
    fn test_exit_description() {
        let killed = WorkerExit {
            pid: 1,
            code: None,
            success: false,
        };
        assert_eq!(killed.describe(), "terminated by signal");
    }
}
