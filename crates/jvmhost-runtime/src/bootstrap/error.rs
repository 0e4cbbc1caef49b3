//! Fatal bootstrap failures and their user-facing diagnostics.

use std::path::PathBuf;

use jvmhost_core::{BootstrapFailure, JavaVersion};
use thiserror::Error;

use crate::discovery::DiscoveryError;
use crate::ports::PortError;
use crate::supervisor::SupervisorError;

/// Why the worker could not be brought up.
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("No Java runtime found ({searched} locations checked)")]
    RuntimeNotFound { searched: usize },

    #[error("No Java runtime between {min} and {max} found (installed: {found})")]
    VersionIncompatible {
        found: String,
        min: JavaVersion,
        max: JavaVersion,
    },

    #[error("No free port between {start} and {end}")]
    PortRangeExhausted { start: u16, end: u16 },

    #[error("Failed to start the worker: {0}")]
    SpawnFailure(String),

    #[error("Worker exited during startup ({exit})")]
    ProcessCrashed {
        exit: String,
        log_path: Option<PathBuf>,
    },

    #[error("Worker on port {port} was not ready after {timeout_secs}s")]
    HealthCheckTimeout { port: u16, timeout_secs: u64 },

    /// Lifecycle misuse, e.g. running bootstrap twice without a reset.
    #[error("{0}")]
    Supervisor(String),
}

impl BootstrapError {
    /// Stable machine-readable code.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::RuntimeNotFound { .. } => "runtime_not_found",
            Self::VersionIncompatible { .. } => "version_incompatible",
            Self::PortRangeExhausted { .. } => "port_range_exhausted",
            Self::SpawnFailure(_) => "spawn_failure",
            Self::ProcessCrashed { .. } => "process_crashed",
            Self::HealthCheckTimeout { .. } => "health_check_timeout",
            Self::Supervisor(_) => "supervisor",
        }
    }

    /// What the user can do about it.
    pub fn remediation(&self) -> String {
        match self {
            Self::RuntimeNotFound { .. } => {
                "Install a Java runtime, or set JVMHOST_EMBEDDED_RUNTIME to a runtime directory."
                    .to_string()
            }
            Self::VersionIncompatible { min, max, .. } => format!(
                "Install a Java runtime between {min} and {max}, or point \
                 JVMHOST_EMBEDDED_RUNTIME at one."
            ),
            Self::PortRangeExhausted { start, end } => format!(
                "Close other processes using ports {start}-{end}, or set JVMHOST_PORT_START \
                 to a free range."
            ),
            Self::SpawnFailure(_) => {
                "Check that the Java runtime and worker archive are readable and executable."
                    .to_string()
            }
            Self::ProcessCrashed {
                log_path: Some(path),
                ..
            } => format!("See the worker log at {} for details.", path.display()),
            Self::ProcessCrashed { log_path: None, .. } => {
                "Run with RUST_LOG=debug to see the worker output.".to_string()
            }
            Self::HealthCheckTimeout { .. } => {
                "The worker started but never became ready. Check the worker log, or \
                 raise the ready timeout in settings."
                    .to_string()
            }
            Self::Supervisor(_) => "Restart the application.".to_string(),
        }
    }

    /// Diagnostic record handed to the error reporter and observers.
    pub fn to_failure(&self) -> BootstrapFailure {
        BootstrapFailure {
            kind: self.kind().to_string(),
            message: self.to_string(),
            remediation: self.remediation(),
        }
    }
}

impl From<PortError> for BootstrapError {
    fn from(e: PortError) -> Self {
        match e {
            PortError::InvalidRange { start, end } | PortError::Exhausted { start, end } => {
                Self::PortRangeExhausted { start, end }
            }
            PortError::NoManagementPort(port) => Self::PortRangeExhausted {
                start: port,
                end: port,
            },
        }
    }
}

impl From<SupervisorError> for BootstrapError {
    fn from(e: SupervisorError) -> Self {
        match e {
            SupervisorError::Discovery(DiscoveryError::NotFound { searched }) => {
                Self::RuntimeNotFound { searched }
            }
            SupervisorError::Discovery(DiscoveryError::VersionIncompatible { found, min, max }) => {
                let found = found
                    .iter()
                    .map(|c| c.version.to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                Self::VersionIncompatible { found, min, max }
            }
            SupervisorError::Launch(e) => Self::SpawnFailure(e.to_string()),
            other => Self::Supervisor(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_remediation_names_range() {
        let err = BootstrapError::from(PortError::Exhausted {
            start: 8765,
            end: 8768,
        });
        assert_eq!(err.kind(), "port_range_exhausted");
        assert!(err.remediation().contains("ports 8765-8768"));
    }

    #[test]
    fn test_crash_remediation_points_at_log() {
        let err = BootstrapError::ProcessCrashed {
            exit: "exit code 1".to_string(),
            log_path: Some(PathBuf::from("/tmp/worker.log")),
        };
        let failure = err.to_failure();
        assert_eq!(failure.kind, "process_crashed");
        assert!(failure.remediation.contains("/tmp/worker.log"));
        assert!(failure.message.contains("exit code 1"));
    }

    #[test]
    fn test_discovery_errors_map_to_taxonomy() {
        let err = BootstrapError::from(SupervisorError::Discovery(DiscoveryError::NotFound {
            searched: 7,
        }));
        assert_eq!(err.kind(), "runtime_not_found");

        let err = BootstrapError::from(SupervisorError::StartInProgress);
        assert_eq!(err.kind(), "supervisor");
    }
}
