//! Utility-based termination for hosts without POSIX signals.

use std::process::Stdio;

use async_trait::async_trait;
use jvmhost_core::{TerminationMethod, TerminationResult};
use sysinfo::{Pid, ProcessesToUpdate, System};
use tokio::process::Command;
use tracing::debug;

use super::TerminationStrategy;

/// Drives the platform's process-kill utility (`taskkill`).
///
/// Graceful is the default invocation, which posts a close request to the
/// process tree; forced adds `/F`.
#[derive(Debug, Clone)]
pub struct UtilityStrategy {
    program: String,
}

impl Default for UtilityStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl UtilityStrategy {
    pub fn new() -> Self {
        Self {
            program: "taskkill".to_string(),
        }
    }

    /// Use a different kill utility binary (tests, unusual installs).
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn args(pid: u32, forced: bool) -> Vec<String> {
        let mut args = vec!["/PID".to_string(), pid.to_string(), "/T".to_string()];
        if forced {
            args.push("/F".to_string());
        }
        args
    }

    async fn run(&self, pid: u32, forced: bool) -> TerminationResult {
        let method = TerminationMethod::PlatformUtility;
        let output = Command::new(&self.program)
            .args(Self::args(pid, forced))
            .stdin(Stdio::null())
            .output()
            .await;

        match output {
            Ok(out) if out.status.success() => TerminationResult::delivered(method),
            Ok(out) => {
                let stderr = String::from_utf8_lossy(&out.stderr);
                debug!(pid = %pid, forced, stderr = %stderr.trim(), "kill utility refused");
                TerminationResult::failed(
                    method,
                    format!(
                        "{} exited with {}: {}",
                        self.program,
                        out.status,
                        stderr.trim()
                    ),
                )
            }
            Err(e) => {
                TerminationResult::failed(method, format!("failed to run {}: {e}", self.program))
            }
        }
    }
}

#[async_trait]
impl TerminationStrategy for UtilityStrategy {
    async fn terminate(&self, pid: u32) -> TerminationResult {
        self.run(pid, false).await
    }

    async fn force_kill(&self, pid: u32) -> TerminationResult {
        self.run(pid, true).await
    }

    fn is_alive(&self, pid: u32) -> bool {
        let pid = Pid::from_u32(pid);
        let mut system = System::new();
        system.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);
        system.process(pid).is_some()
    }

    fn name(&self) -> &'static str {
        "taskkill"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forced_flag_is_appended() {
        assert_eq!(UtilityStrategy::args(42, false), ["/PID", "42", "/T"]);
        assert_eq!(UtilityStrategy::args(42, true), ["/PID", "42", "/T", "/F"]);
    }

    #[tokio::test]
    async fn test_missing_utility_reports_failure_without_panicking() {
        let strategy = UtilityStrategy::with_program("definitely-not-a-kill-utility");
        let result = strategy.terminate(1).await;
        assert!(!result.success);
        assert_eq!(result.method, TerminationMethod::PlatformUtility);
        assert!(result.error.unwrap().contains("failed to run"));
    }

    #[test]
    fn test_liveness_of_current_process() {
        let strategy = UtilityStrategy::new();
        assert!(strategy.is_alive(std::process::id()));
    }
}
