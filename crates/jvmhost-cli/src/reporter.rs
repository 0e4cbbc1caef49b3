//! Terminal rendering of fatal bootstrap failures.

use jvmhost_core::{BootstrapFailure, ErrorReporter};

/// Prints the diagnostic to stderr. The caller exits afterwards.
#[derive(Debug, Clone, Default)]
pub struct StderrReporter;

impl StderrReporter {
    pub const fn new() -> Self {
        Self
    }
}

/// Render a failure the way it is shown to the user.
pub fn format_failure(failure: &BootstrapFailure) -> String {
    format!(
        "error[{}]: {}\n  help: {}",
        failure.kind, failure.message, failure.remediation
    )
}

impl ErrorReporter for StderrReporter {
    fn report(&self, failure: &BootstrapFailure) {
        eprintln!("{}", format_failure(failure));
    }
}
