//! Platform-appropriate data locations.

use std::env;
use std::path::PathBuf;

use super::error::PathError;

/// Directory name used under the system data directory.
const APP_DIR_NAME: &str = "jvmhost";

/// Get the root directory for application data (logs, PID file, settings).
///
/// Resolution order:
/// 1. `JVMHOST_DATA_DIR` environment variable (highest priority)
/// 2. System data directory (e.g., `~/.local/share/jvmhost`)
///
/// The directory is not created here; callers that write use
/// [`super::ensure_directory`].
pub fn data_root() -> Result<PathBuf, PathError> {
    if let Ok(path) = env::var("JVMHOST_DATA_DIR") {
        if !path.trim().is_empty() {
            return Ok(PathBuf::from(path));
        }
    }

    let data_dir = dirs::data_local_dir().ok_or(PathError::NoDataDir)?;
    Ok(data_dir.join(APP_DIR_NAME))
}

/// Directory holding one log file per worker launch.
pub fn logs_dir() -> Result<PathBuf, PathError> {
    Ok(data_root()?.join("logs"))
}

/// PID file recording the currently supervised worker.
pub fn pidfile_path() -> Result<PathBuf, PathError> {
    Ok(data_root()?.join("worker.pid"))
}

/// Optional JSON settings file.
pub fn settings_path() -> Result<PathBuf, PathError> {
    Ok(data_root()?.join("settings.json"))
}

/// Conventional location of a runtime shipped next to the host executable
/// (`<exe dir>/runtime`).
pub fn bundled_runtime_dir() -> Result<PathBuf, PathError> {
    let exe = env::current_exe().map_err(|e| PathError::CurrentExe(e.to_string()))?;
    let dir = exe
        .parent()
        .ok_or_else(|| PathError::CurrentExe(format!("{} has no parent", exe.display())))?;
    Ok(dir.join("runtime"))
}
