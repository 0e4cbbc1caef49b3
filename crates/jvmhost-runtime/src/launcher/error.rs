use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors from building or spawning a worker launch.
#[derive(Debug, Error)]
pub enum LaunchError {
    /// The OS refused to start the process.
    #[error("Failed to spawn {program}: {source}")]
    Spawn {
        program: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The process was created but no PID came back.
    #[error("Spawned {0} but the OS returned no process id")]
    NoPid(PathBuf),

    /// A classpath entry cannot be joined into a search path.
    #[error("Invalid classpath: {0}")]
    InvalidClasspath(String),

    /// The worker archive or classpath is empty.
    #[error("Worker entry is not configured")]
    MissingEntry,

    #[error("Working directory {path} is unusable: {reason}")]
    WorkingDir { path: PathBuf, reason: String },
}
