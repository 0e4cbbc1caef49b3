//! Canonical path resolution for jvmhost data directories.
//!
//! - Returns `PathBuf` and `PathError` for clear error handling
//! - No terminal I/O; adapters decide how to present failures

mod ensure;
mod error;
mod platform;

pub use ensure::ensure_directory;
pub use error::PathError;
pub use platform::{bundled_runtime_dir, data_root, logs_dir, pidfile_path, settings_path};
