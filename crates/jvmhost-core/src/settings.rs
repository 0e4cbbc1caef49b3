//! Settings domain types, loading and validation.
//!
//! Settings come from an optional JSON file, then environment overrides. All
//! sections use `#[serde(default)]` so a partial file is valid.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::domain::JavaVersion;

/// First port of the default allocation window.
pub const DEFAULT_PORT_START: u16 = 8765;

/// Number of ports in the default allocation window.
pub const DEFAULT_PORT_COUNT: u16 = 4;

/// Oldest Java feature release the worker supports.
pub const DEFAULT_MIN_JAVA_VERSION: u32 = 17;

/// Newest Java feature release the worker supports.
pub const DEFAULT_MAX_JAVA_VERSION: u32 = 21;

/// Errors raised while loading or validating settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to read settings file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse settings file {path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    #[error("Invalid value for {key}: {reason}")]
    InvalidOverride { key: String, reason: String },

    #[error("Invalid settings: {0}")]
    Invalid(String),
}

/// How the worker code is located.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum WorkerEntry {
    /// A self-contained executable archive started with `-jar`.
    #[serde(rename_all = "camelCase")]
    ExecutableArchive { path: PathBuf },
    /// A search path plus the fully qualified entry-point class.
    #[serde(rename_all = "camelCase")]
    Classpath {
        entries: Vec<PathBuf>,
        main_class: String,
    },
}

impl Default for WorkerEntry {
    fn default() -> Self {
        Self::ExecutableArchive {
            path: PathBuf::from("worker.jar"),
        }
    }
}

/// Worker launch configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WorkerSettings {
    pub entry: WorkerEntry,
    /// Working directory for the worker. Defaults to the host's current directory.
    pub working_dir: Option<PathBuf>,
    /// Initial heap in MiB (`-Xms`).
    pub heap_min_mb: u32,
    /// Maximum heap in MiB (`-Xmx`).
    pub heap_max_mb: u32,
    /// Garbage-collector selection flag, without the `-XX:+` prefix.
    pub gc: String,
    /// Additional runtime flags appended after the standard ones.
    pub extra_jvm_args: Vec<String>,
    /// Extra environment variables for the worker.
    pub env: BTreeMap<String, String>,
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            entry: WorkerEntry::default(),
            working_dir: None,
            heap_min_mb: 256,
            heap_max_mb: 2048,
            gc: "UseG1GC".to_string(),
            extra_jvm_args: Vec::new(),
            env: BTreeMap::new(),
        }
    }
}

/// Runtime discovery configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RuntimeSettings {
    pub min_version: JavaVersion,
    pub max_version: JavaVersion,
    /// Runtime bundled with the application (a `JAVA_HOME`-style directory).
    pub embedded_dir: Option<PathBuf>,
    /// Maximum directory depth below each installation root.
    pub search_depth: usize,
    /// Additional installation roots searched before the platform defaults.
    pub extra_roots: Vec<PathBuf>,
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self {
            min_version: JavaVersion::from_major(DEFAULT_MIN_JAVA_VERSION),
            max_version: JavaVersion::feature_ceiling(DEFAULT_MAX_JAVA_VERSION),
            embedded_dir: None,
            search_depth: 4,
            extra_roots: Vec::new(),
        }
    }
}

/// Port allocation window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PortSettings {
    pub start: u16,
    pub count: u16,
}

impl Default for PortSettings {
    fn default() -> Self {
        Self {
            start: DEFAULT_PORT_START,
            count: DEFAULT_PORT_COUNT,
        }
    }
}

impl PortSettings {
    /// Inclusive `(start, end)` bounds, or `None` if the window is empty or overflows.
    pub const fn bounds(&self) -> Option<(u16, u16)> {
        if self.count == 0 {
            return None;
        }
        match self.start.checked_add(self.count - 1) {
            Some(end) => Some((self.start, end)),
            None => None,
        }
    }
}

/// Readiness polling and command forwarding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HealthSettings {
    /// Readiness endpoint path.
    pub path: String,
    /// Overall readiness budget. First-time runtime initialization can be slow.
    pub ready_timeout_secs: u64,
    pub poll_interval_ms: u64,
    /// Timeout applied to every individual HTTP call.
    pub request_timeout_ms: u64,
    /// Total attempts for a command request, including the first.
    pub max_attempts: u32,
    /// Linear backoff unit: attempt `n` waits `n * base_delay`.
    pub base_delay_ms: u64,
}

impl Default for HealthSettings {
    fn default() -> Self {
        Self {
            path: "/health".to_string(),
            ready_timeout_secs: 180,
            poll_interval_ms: 1000,
            request_timeout_ms: 5000,
            max_attempts: 3,
            base_delay_ms: 500,
        }
    }
}

impl HealthSettings {
    pub const fn ready_timeout(&self) -> Duration {
        Duration::from_secs(self.ready_timeout_secs)
    }

    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub const fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub const fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }
}

/// Stop escalation timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ShutdownSettings {
    /// How long to wait after the graceful request before forcing.
    pub grace_ms: u64,
    /// Liveness probe interval while waiting.
    pub poll_ms: u64,
}

impl Default for ShutdownSettings {
    fn default() -> Self {
        Self {
            grace_ms: 5000,
            poll_ms: 100,
        }
    }
}

impl ShutdownSettings {
    pub const fn grace(&self) -> Duration {
        Duration::from_millis(self.grace_ms)
    }

    pub const fn poll(&self) -> Duration {
        Duration::from_millis(self.poll_ms)
    }
}

/// Worker output capture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LogSettings {
    /// Override for the launch log directory. Defaults to `<data root>/logs`.
    pub dir: Option<PathBuf>,
    /// Lines kept in memory for crash diagnostics.
    pub ring_lines: usize,
    /// Number of launch logs kept on disk.
    pub keep_files: usize,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            dir: None,
            ring_lines: 200,
            keep_files: 10,
        }
    }
}

/// Complete host configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HostSettings {
    pub worker: WorkerSettings,
    pub runtime: RuntimeSettings,
    pub ports: PortSettings,
    pub health: HealthSettings,
    pub shutdown: ShutdownSettings,
    pub logs: LogSettings,
}

impl HostSettings {
    /// Load settings from a JSON file. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        if !path.exists() {
            debug!(path = %path.display(), "No settings file, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        serde_json::from_str(&content).map_err(|e| SettingsError::Parse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Apply `JVMHOST_*` overrides from the process environment.
    pub fn apply_env_overrides(&mut self) -> Result<(), SettingsError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(jar) = get("JVMHOST_WORKER_JAR") {
            self.worker.entry = WorkerEntry::ExecutableArchive {
                path: PathBuf::from(jar),
            };
        }

        match (get("JVMHOST_WORKER_CLASSPATH"), get("JVMHOST_WORKER_MAIN_CLASS")) {
            (Some(classpath), Some(main_class)) => {
                self.worker.entry = WorkerEntry::Classpath {
                    entries: std::env::split_paths(&classpath).collect(),
                    main_class,
                };
            }
            (Some(_), None) | (None, Some(_)) => {
                return Err(SettingsError::InvalidOverride {
                    key: "JVMHOST_WORKER_CLASSPATH".to_string(),
                    reason: "classpath and JVMHOST_WORKER_MAIN_CLASS must be set together"
                        .to_string(),
                });
            }
            (None, None) => {}
        }

        if let Some(dir) = get("JVMHOST_EMBEDDED_RUNTIME") {
            self.runtime.embedded_dir = Some(PathBuf::from(dir));
        }

        if let Some(start) = get("JVMHOST_PORT_START") {
            self.ports.start =
                start
                    .trim()
                    .parse::<u16>()
                    .map_err(|e| SettingsError::InvalidOverride {
                        key: "JVMHOST_PORT_START".to_string(),
                        reason: e.to_string(),
                    })?;
        }

        for (key, slot) in [
            ("JVMHOST_MIN_JAVA", &mut self.runtime.min_version),
            ("JVMHOST_MAX_JAVA", &mut self.runtime.max_version),
        ] {
            if let Some(raw) = get(key) {
                *slot = JavaVersion::parse(&raw).map_err(|e| SettingsError::InvalidOverride {
                    key: key.to_string(),
                    reason: e.to_string(),
                })?;
            }
        }

        Ok(())
    }
}

/// Validate settings before they reach the supervisor.
pub fn validate_settings(settings: &HostSettings) -> Result<(), SettingsError> {
    if settings.ports.count == 0 {
        return Err(SettingsError::Invalid(
            "port window must contain at least one port".to_string(),
        ));
    }
    match settings.ports.bounds() {
        // The management port is derived as primary + 1, so the window end must leave room.
        Some((_, end)) if end < u16::MAX => {}
        _ => {
            return Err(SettingsError::Invalid(format!(
                "port window starting at {} with {} ports exceeds the valid port range",
                settings.ports.start, settings.ports.count
            )));
        }
    }

    let worker = &settings.worker;
    if worker.heap_min_mb > worker.heap_max_mb {
        return Err(SettingsError::Invalid(format!(
            "heap minimum ({} MiB) exceeds heap maximum ({} MiB)",
            worker.heap_min_mb, worker.heap_max_mb
        )));
    }
    match &worker.entry {
        WorkerEntry::ExecutableArchive { path } if path.as_os_str().is_empty() => {
            return Err(SettingsError::Invalid(
                "worker archive path is empty".to_string(),
            ));
        }
        WorkerEntry::Classpath {
            entries,
            main_class,
        } if entries.is_empty() || main_class.trim().is_empty() => {
            return Err(SettingsError::Invalid(
                "classpath mode needs at least one entry and a main class".to_string(),
            ));
        }
        _ => {}
    }

    if settings.runtime.min_version > settings.runtime.max_version {
        return Err(SettingsError::Invalid(format!(
            "minimum Java version {} is newer than maximum {}",
            settings.runtime.min_version, settings.runtime.max_version
        )));
    }

    let health = &settings.health;
    if health.poll_interval_ms == 0 || health.request_timeout_ms == 0 {
        return Err(SettingsError::Invalid(
            "health poll interval and request timeout must be non-zero".to_string(),
        ));
    }
    if health.max_attempts == 0 {
        return Err(SettingsError::Invalid(
            "request attempts must be at least 1".to_string(),
        ));
    }
    if !health.path.starts_with('/') {
        return Err(SettingsError::Invalid(format!(
            "health path {:?} must start with '/'",
            health.path
        )));
    }

    if settings.shutdown.poll_ms == 0 {
        return Err(SettingsError::Invalid(
            "shutdown poll interval must be non-zero".to_string(),
        ));
    }

    Ok(())
}
