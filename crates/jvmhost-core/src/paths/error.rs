//! Errors from resolving jvmhost's data locations.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PathError {
    /// Neither `JVMHOST_DATA_DIR` nor a platform data directory is available.
    #[error("Cannot determine system data directory")]
    NoDataDir,

    #[error("{0} exists but is not a directory")]
    NotADirectory(PathBuf),

    #[error("Failed to create directory {path}: {reason}")]
    CreateFailed { path: PathBuf, reason: String },

    /// Could not locate the running executable.
    #[error("Cannot determine current executable: {0}")]
    CurrentExe(String),
}
