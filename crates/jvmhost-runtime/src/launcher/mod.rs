//! Worker process launching.
//!
//! A launch spawns the runtime with all three standard streams piped, confirms
//! the OS handed back a PID, then attaches output readers that feed the
//! in-memory ring and the per-launch log file.

mod args;
mod error;
mod output;
mod stream;

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use jvmhost_core::{LaunchSpec, LogSettings};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tracing::{debug, info};

pub use args::{build_launch_spec, mode_flags, port_flag, runtime_flags};
pub use error::LaunchError;
pub use output::{
    LaunchLog, OutputRing, OutputStream, WorkerOutput, log_file_name, prune_launch_logs,
};
pub use stream::spawn_stream_reader;

/// A worker that the OS confirmed as started.
#[derive(Debug)]
pub struct LaunchedProcess {
    pub pid: u32,
    pub start_time: DateTime<Utc>,
    pub child: Child,
    pub output: Arc<WorkerOutput>,
    /// Output reader tasks; they finish once the pipes close.
    pub readers: Vec<JoinHandle<()>>,
}

/// Spawns worker processes and wires up their output capture.
#[derive(Debug, Clone)]
pub struct ProcessLauncher {
    log_dir: Option<PathBuf>,
    ring_lines: usize,
    keep_files: usize,
}

impl ProcessLauncher {
    /// `log_dir` of `None` disables launch log files.
    pub const fn new(log_dir: Option<PathBuf>, ring_lines: usize, keep_files: usize) -> Self {
        Self {
            log_dir,
            ring_lines,
            keep_files,
        }
    }

    pub fn from_settings(settings: &LogSettings, default_dir: Option<PathBuf>) -> Self {
        Self::new(
            settings.dir.clone().or(default_dir),
            settings.ring_lines,
            settings.keep_files,
        )
    }

    /// Spawn the worker described by `spec`.
    ///
    /// Fails with no process left behind if the spawn errors or the OS
    /// returns no PID.
    pub fn launch(&self, spec: &LaunchSpec) -> Result<LaunchedProcess, LaunchError> {
        debug!(command = %spec.command_line(), mode = %spec.mode, "Spawning worker");

        let mut cmd = Command::new(&spec.executable_path);
        cmd.args(&spec.argv)
            .current_dir(&spec.working_dir)
            .envs(&spec.env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|source| LaunchError::Spawn {
            program: spec.executable_path.clone(),
            source,
        })?;

        let Some(pid) = child.id() else {
            // Dropping the handle kills whatever the OS did create
            let _ = child.start_kill();
            return Err(LaunchError::NoPid(spec.executable_path.clone()));
        };
        let start_time = Utc::now();

        let log = match &self.log_dir {
            Some(dir) => {
                let log = LaunchLog::open(dir, spec, pid, start_time);
                prune_launch_logs(dir, self.keep_files);
                log
            }
            None => LaunchLog::disabled(),
        };
        let output = Arc::new(WorkerOutput::new(self.ring_lines, log));

        let mut readers = Vec::with_capacity(2);
        if let Some(stdout) = child.stdout.take() {
            readers.push(spawn_stream_reader(
                stdout,
                pid,
                OutputStream::Stdout,
                output.clone(),
            ));
        }
        if let Some(stderr) = child.stderr.take() {
            readers.push(spawn_stream_reader(
                stderr,
                pid,
                OutputStream::Stderr,
                output.clone(),
            ));
        }

        info!(
            pid = %pid,
            port = %spec.port,
            log = ?output.log_path(),
            "Worker process spawned"
        );

        Ok(LaunchedProcess {
            pid,
            start_time,
            child,
            output,
            readers,
        })
    }
}
