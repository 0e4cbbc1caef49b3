//! Sink for fatal bootstrap diagnostics.

use crate::domain::BootstrapFailure;

/// Receives the user-actionable diagnostic for a fatal bootstrap failure.
///
/// The host decides how to present it (dialog, stderr) and then terminates;
/// there is no degraded mode without the worker.
///
/// # Implementations
///
/// - `NoopReporter` - For tests and embedders that only watch bootstrap state
/// - Adapter-specific implementations (CLI stderr, desktop dialog)
pub trait ErrorReporter: Send + Sync {
    /// Present the failure. Must not block on user interaction.
    fn report(&self, failure: &BootstrapFailure);
}

/// A reporter that discards every failure.
#[derive(Debug, Clone, Default)]
pub struct NoopReporter;

impl NoopReporter {
    pub const fn new() -> Self {
        Self
    }
}

impl ErrorReporter for NoopReporter {
    fn report(&self, _failure: &BootstrapFailure) {
        // Intentionally do nothing
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_noop_reporter_is_object_safe() {
        let reporter: Arc<dyn ErrorReporter> = Arc::new(NoopReporter::new());
        reporter.report(&BootstrapFailure {
            kind: "spawn_failure".to_string(),
            message: "boom".to_string(),
            remediation: "retry".to_string(),
        });
    }
}
