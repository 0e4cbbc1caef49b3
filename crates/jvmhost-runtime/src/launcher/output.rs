//! Worker output capture: an in-memory ring for crash diagnostics and a
//! best-effort log file per launch.

use std::collections::VecDeque;
use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use jvmhost_core::LaunchSpec;
use tracing::{debug, warn};

/// Which pipe a line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

impl OutputStream {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stdout => "stdout",
            Self::Stderr => "stderr",
        }
    }
}

impl fmt::Display for OutputStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Last `capacity` output lines, oldest first.
#[derive(Debug)]
pub struct OutputRing {
    lines: VecDeque<String>,
    capacity: usize,
}

impl OutputRing {
    pub fn new(capacity: usize) -> Self {
        Self {
            lines: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Add a line, removing the oldest if at capacity.
    pub fn push(&mut self, line: String) {
        if self.capacity == 0 {
            return;
        }
        if self.lines.len() >= self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(line);
    }

    pub fn snapshot(&self) -> Vec<String> {
        self.lines.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// File name for a launch log, e.g. `worker-20260117-093012-481.log`.
pub fn log_file_name(started: DateTime<Utc>) -> String {
    format!("worker-{}.log", started.format("%Y%m%d-%H%M%S-%3f"))
}

/// Append-only log file for one launch. Every write is best effort.
#[derive(Debug)]
pub struct LaunchLog {
    path: Option<PathBuf>,
    file: Mutex<Option<File>>,
}

impl LaunchLog {
    /// Open `<dir>/worker-<timestamp>.log` and write the header.
    ///
    /// Failure to create the file leaves the log disabled; the launch goes on.
    pub fn open(dir: &Path, spec: &LaunchSpec, pid: u32, started: DateTime<Utc>) -> Self {
        if let Err(e) = jvmhost_core::ensure_directory(dir) {
            warn!(dir = %dir.display(), error = %e, "Launch log disabled");
            return Self::disabled();
        }

        let path = dir.join(log_file_name(started));
        let file = match OpenOptions::new().create(true).append(true).open(&path) {
            Ok(file) => file,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Launch log disabled");
                return Self::disabled();
            }
        };

        let log = Self {
            path: Some(path),
            file: Mutex::new(Some(file)),
        };
        log.write_line(&format!(
            "=== worker launch mode={} pid={pid} started={} ===",
            spec.mode,
            started.to_rfc3339()
        ));
        log.write_line(&format!("command: {}", spec.command_line()));
        log
    }

    pub fn disabled() -> Self {
        Self {
            path: None,
            file: Mutex::new(None),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn write_line(&self, line: &str) {
        let mut guard = self.file.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(file) = guard.as_mut() else {
            return;
        };
        if let Err(e) = writeln!(file, "{line}") {
            debug!(error = %e, "Launch log write failed, disabling log file");
            *guard = None;
        }
    }
}

/// Everything captured from one worker's output pipes.
///
/// Shared by the stream readers and the supervisor's exit watcher; nothing
/// else writes to it.
#[derive(Debug)]
pub struct WorkerOutput {
    ring: Mutex<OutputRing>,
    log: LaunchLog,
}

impl WorkerOutput {
    pub fn new(ring_lines: usize, log: LaunchLog) -> Self {
        Self {
            ring: Mutex::new(OutputRing::new(ring_lines)),
            log,
        }
    }

    /// Record one line from the worker.
    pub fn record(&self, stream: OutputStream, line: &str) {
        let tagged = format!("[{stream}] {line}");
        self.log.write_line(&tagged);
        self.ring
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(tagged);
    }

    /// The most recent lines, oldest first.
    pub fn tail(&self) -> Vec<String> {
        self.ring
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .snapshot()
    }

    pub fn log_path(&self) -> Option<&Path> {
        self.log.path()
    }

    /// Append the crash dump section after a non-zero exit.
    pub fn write_crash_dump(&self, exit: &str) {
        let tail = self.tail();
        self.log.write_line(&format!(
            "=== crash dump: {exit}, last {} lines ===",
            tail.len()
        ));
        for line in &tail {
            self.log.write_line(line);
        }
        self.log.write_line("=== end crash dump ===");
    }
}

/// Delete all but the newest `keep` launch logs in `dir`. Returns the number
/// removed. Failures are logged and skipped.
pub fn prune_launch_logs(dir: &Path, keep: usize) -> usize {
    let Ok(entries) = fs::read_dir(dir) else {
        return 0;
    };

    let mut logs: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with("worker-") && n.ends_with(".log"))
        })
        .collect();

    if logs.len() <= keep {
        return 0;
    }

    // Timestamped names sort chronologically
    logs.sort();
    let excess = logs.len() - keep;
    let mut removed = 0;
    for path in logs.into_iter().take(excess) {
        match fs::remove_file(&path) {
            Ok(()) => removed += 1,
            Err(e) => debug!(path = %path.display(), error = %e, "Failed to prune launch log"),
        }
    }
    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use jvmhost_core::LaunchMode;
    use std::collections::BTreeMap;
    use tempfile::tempdir;

    fn spec() -> LaunchSpec {
        LaunchSpec {
            executable_path: PathBuf::from("/opt/jdk/bin/java"),
            argv: vec!["-jar".to_string(), "worker.jar".to_string()],
            working_dir: PathBuf::from("."),
            env: BTreeMap::new(),
            mode: LaunchMode::ExecutableArchive,
            port: 8765,
        }
    }

    #[test]
    fn test_ring_keeps_last_lines() {
        let mut ring = OutputRing::new(3);
        for i in 0..5 {
            ring.push(format!("line {i}"));
        }
        assert_eq!(ring.snapshot(), vec!["line 2", "line 3", "line 4"]);
    }

    #[test]
    fn test_log_file_name_format() {
        let started = Utc
            .with_ymd_and_hms(2026, 1, 17, 9, 30, 12)
            .unwrap()
            .checked_add_signed(chrono::Duration::milliseconds(481))
            .unwrap();
        assert_eq!(log_file_name(started), "worker-20260117-093012-481.log");
    }

    #[test]
    fn test_crash_dump_lists_tail() {
        let dir = tempdir().unwrap();
        let log = LaunchLog::open(dir.path(), &spec(), 42, Utc::now());
        let path = log.path().unwrap().to_path_buf();
        let output = WorkerOutput::new(2, log);

        output.record(OutputStream::Stdout, "booting");
        output.record(OutputStream::Stderr, "bad config");
        output.record(OutputStream::Stderr, "giving up");
        output.write_crash_dump("exit status 3");

        let text = fs::read_to_string(path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[0].contains("mode=executable-archive"));
        assert!(lines[0].contains("pid=42"));
        assert!(text.contains("[stdout] booting"));
        assert_eq!(
            &lines[lines.len() - 4..],
            &[
                "=== crash dump: exit status 3, last 2 lines ===",
                "[stderr] bad config",
                "[stderr] giving up",
                "=== end crash dump ===",
            ]
        );
    }

    #[test]
    fn test_unwritable_dir_disables_log() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, "x").unwrap();

        let log = LaunchLog::open(&blocker, &spec(), 1, Utc::now());
        assert!(log.path().is_none());

        // Records still reach the ring
        let output = WorkerOutput::new(5, log);
        output.record(OutputStream::Stdout, "still captured");
        assert_eq!(output.tail(), vec!["[stdout] still captured"]);
    }

    #[test]
    fn test_prune_keeps_newest() {
        let dir = tempdir().unwrap();
        for name in [
            "worker-20260101-000000-000.log",
            "worker-20260102-000000-000.log",
            "worker-20260103-000000-000.log",
            "unrelated.txt",
        ] {
            fs::write(dir.path().join(name), "").unwrap();
        }

        assert_eq!(prune_launch_logs(dir.path(), 2), 1);
        assert!(!dir.path().join("worker-20260101-000000-000.log").exists());
        assert!(dir.path().join("worker-20260103-000000-000.log").exists());
        assert!(dir.path().join("unrelated.txt").exists());
    }
}
