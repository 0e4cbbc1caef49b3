//! Startup state machine shared between the orchestrator and UI observers.

use serde::{Deserialize, Serialize};

/// User-facing description of a fatal bootstrap failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BootstrapFailure {
    /// Stable machine-readable code, e.g. `port_range_exhausted`.
    pub kind: String,
    /// What went wrong.
    pub message: String,
    /// What the user can do about it.
    pub remediation: String,
}

/// Bootstrap progress.
///
/// Moves forward only: `Idle → StartingWorker → WaitingForHealth → Ready`,
/// with `Failed` reachable from any non-terminal state. Only an explicit
/// reset takes a terminal state back to `Idle`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum BootstrapState {
    #[default]
    Idle,
    StartingWorker,
    WaitingForHealth,
    Ready,
    Failed(BootstrapFailure),
}

impl BootstrapState {
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Ready | Self::Failed(_))
    }

    const fn rank(&self) -> u8 {
        match self {
            Self::Idle => 0,
            Self::StartingWorker => 1,
            Self::WaitingForHealth => 2,
            Self::Ready | Self::Failed(_) => 3,
        }
    }

    /// Whether moving from `self` to `next` respects the forward-only rule.
    ///
    /// Resets are not transitions; see [`BootstrapState::can_reset`].
    pub const fn can_advance_to(&self, next: &Self) -> bool {
        if self.is_terminal() {
            return false;
        }
        match next {
            Self::Failed(_) => true,
            Self::Idle => false,
            _ => next.rank() == self.rank() + 1,
        }
    }

    /// Explicit restart is allowed once a run has finished either way.
    pub const fn can_reset(&self) -> bool {
        self.is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failed() -> BootstrapState {
        BootstrapState::Failed(BootstrapFailure {
            kind: "health_check_timeout".to_string(),
            message: "worker did not answer".to_string(),
            remediation: "check the worker log".to_string(),
        })
    }

    #[test]
    fn test_forward_path() {
        use BootstrapState::*;
        assert!(Idle.can_advance_to(&StartingWorker));
        assert!(StartingWorker.can_advance_to(&WaitingForHealth));
        assert!(WaitingForHealth.can_advance_to(&Ready));
    }

    #[test]
    fn test_no_skipping_or_going_back() {
        use BootstrapState::*;
        assert!(!Idle.can_advance_to(&Ready));
        assert!(!WaitingForHealth.can_advance_to(&StartingWorker));
        assert!(!StartingWorker.can_advance_to(&Idle));
    }

    #[test]
    fn test_failed_reachable_from_non_terminal_only() {
        use BootstrapState::*;
        assert!(Idle.can_advance_to(&failed()));
        assert!(WaitingForHealth.can_advance_to(&failed()));
        assert!(!Ready.can_advance_to(&failed()));
        assert!(!failed().can_advance_to(&failed()));
    }

    #[test]
    fn test_reset_only_from_terminal() {
        assert!(BootstrapState::Ready.can_reset());
        assert!(failed().can_reset());
        assert!(!BootstrapState::WaitingForHealth.can_reset());
    }

    #[test]
    fn test_serialization_tags_state() {
        let json = serde_json::to_string(&failed()).unwrap();
        assert!(json.contains("\"state\":\"failed\""));
        assert!(json.contains("\"kind\":\"health_check_timeout\""));
    }
}
