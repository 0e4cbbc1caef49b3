//! Launch specification for one worker process.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// How the worker's code is handed to the runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LaunchMode {
    /// `-cp <search path> <entry point>`
    Classpath,
    /// `-jar <archive>`
    ExecutableArchive,
}

impl fmt::Display for LaunchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Classpath => write!(f, "classpath"),
            Self::ExecutableArchive => write!(f, "executable-archive"),
        }
    }
}

/// Everything needed to spawn the worker.
///
/// Built fresh for every launch and never mutated after spawn. `argv` is
/// already in its final order: runtime flags, mode flags, port flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchSpec {
    pub executable_path: PathBuf,
    pub argv: Vec<String>,
    pub working_dir: PathBuf,
    pub env: BTreeMap<String, String>,
    pub mode: LaunchMode,
    /// Port the worker is told to bind. Fixed for the process lifetime.
    pub port: u16,
}

impl LaunchSpec {
    /// Render the command line for logs and diagnostics.
    pub fn command_line(&self) -> String {
        let mut line = self.executable_path.display().to_string();
        for arg in &self.argv {
            line.push(' ');
            if arg.contains(' ') {
                line.push('"');
                line.push_str(arg);
                line.push('"');
            } else {
                line.push_str(arg);
            }
        }
        line
    }
}
