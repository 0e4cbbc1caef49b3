//! Atomic PID file I/O.
//!
//! Format: two-line text file
//! ```text
//! <pid>
//! <port>
//! ```

use std::fs;
use std::io;
use std::path::Path;

/// PID file content parsed from disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PidFileData {
    pub pid: u32,
    pub port: u16,
}

/// Write the PID file via `<path>.tmp` and an atomic rename.
pub fn write_pidfile(path: &Path, data: PidFileData) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut temp_name = path.as_os_str().to_owned();
    temp_name.push(".tmp");
    let temp_path = Path::new(&temp_name);

    fs::write(temp_path, format!("{}\n{}\n", data.pid, data.port))?;
    fs::rename(temp_path, path)
}

/// Read the PID file. `Ok(None)` when there is none.
pub fn read_pidfile(path: &Path) -> io::Result<Option<PidFileData>> {
    match fs::read_to_string(path) {
        Ok(content) => parse_pidfile_content(&content).map(Some),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

/// Delete the PID file (idempotent).
pub fn delete_pidfile(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

fn parse_pidfile_content(content: &str) -> io::Result<PidFileData> {
    let mut lines = content.lines();

    let pid = lines
        .next()
        .and_then(|s| s.trim().parse::<u32>().ok())
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "missing or invalid PID"))?;

    let port = lines
        .next()
        .and_then(|s| s.trim().parse::<u16>().ok())
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "missing or invalid port"))?;

    Ok(PidFileData { pid, port })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_write_read_delete() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state").join("worker.pid");
        let data = PidFileData {
            pid: 4242,
            port: 8765,
        };

        write_pidfile(&path, data).unwrap();
        assert_eq!(read_pidfile(&path).unwrap(), Some(data));
        assert!(!dir.path().join("state").join("worker.pid.tmp").exists());

        delete_pidfile(&path).unwrap();
        assert_eq!(read_pidfile(&path).unwrap(), None);
        // Second delete is a no-op
        delete_pidfile(&path).unwrap();
    }

    #[test]
    fn test_malformed_file_is_invalid_data() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("worker.pid");
        fs::write(&path, "not-a-pid\n").unwrap();

        let err = read_pidfile(&path).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }
}
