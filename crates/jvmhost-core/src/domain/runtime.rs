//! Discovered Java runtime installations.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::version::{JavaVersion, is_compatible};

/// Where a runtime candidate was found. Variants are listed in search priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RuntimeOrigin {
    /// Runtime bundled with the application.
    Embedded,
    /// Resolved through the `PATH` search-path variable.
    PathEnv,
    /// Found by walking platform-conventional installation roots.
    DiscoveredTree,
}

impl fmt::Display for RuntimeOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Embedded => write!(f, "embedded"),
            Self::PathEnv => write!(f, "PATH"),
            Self::DiscoveredTree => write!(f, "install tree"),
        }
    }
}

/// A version-checked `java` executable capable of hosting the worker.
///
/// Produced by discovery and never mutated or persisted afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeCandidate {
    /// Path to the `java` executable.
    pub path: PathBuf,
    /// Version parsed from the runtime's own diagnostic output.
    pub version: JavaVersion,
    /// Architecture reported by the runtime (`os.arch`), e.g. `amd64`.
    pub architecture: String,
    pub origin: RuntimeOrigin,
    /// Whether the path pointed at a runnable executable when probed.
    pub executable_valid: bool,
}

impl RuntimeCandidate {
    /// Check the candidate against an inclusive version window.
    pub fn is_compatible(&self, min: &JavaVersion, max: &JavaVersion) -> bool {
        self.executable_valid && is_compatible(&self.version, min, max)
    }
}

impl fmt::Display for RuntimeCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Java {} ({}) at {} [{}]",
            self.version,
            self.architecture,
            self.path.display(),
            self.origin
        )
    }
}
