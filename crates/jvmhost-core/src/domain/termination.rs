//! Outcome records for process termination attempts.

use serde::{Deserialize, Serialize};

/// Primitive used for a termination attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TerminationMethod {
    /// Cooperative termination signal (SIGTERM).
    Graceful,
    /// Non-catchable kill signal (SIGKILL).
    Forced,
    /// The platform's process-kill utility (`taskkill`).
    PlatformUtility,
}

/// Result of a single `terminate` or `force_kill` call.
///
/// One record per attempt; strategies report failures here instead of
/// returning errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TerminationResult {
    pub success: bool,
    pub method: TerminationMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TerminationResult {
    pub const fn delivered(method: TerminationMethod) -> Self {
        Self {
            success: true,
            method,
            error: None,
        }
    }

    pub fn failed(method: TerminationMethod, error: impl Into<String>) -> Self {
        Self {
            success: false,
            method,
            error: Some(error.into()),
        }
    }
}
