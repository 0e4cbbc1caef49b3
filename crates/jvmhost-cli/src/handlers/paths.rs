//! Paths command handler.

use anyhow::Result;
use jvmhost_core::{bundled_runtime_dir, data_root, logs_dir, pidfile_path, settings_path};

/// Print every resolved location, one per line.
pub fn execute() -> Result<()> {
    println!("Data directory:   {}", data_root()?.display());
    println!("Settings file:    {}", settings_path()?.display());
    println!("Launch logs:      {}", logs_dir()?.display());
    println!("PID file:         {}", pidfile_path()?.display());
    match bundled_runtime_dir() {
        Ok(dir) if dir.is_dir() => println!("Bundled runtime:  {}", dir.display()),
        Ok(dir) => println!("Bundled runtime:  {} (not present)", dir.display()),
        Err(e) => println!("Bundled runtime:  unavailable ({e})"),
    }
    Ok(())
}
