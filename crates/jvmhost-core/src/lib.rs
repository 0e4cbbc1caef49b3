//! Core domain types and port definitions for jvmhost.
//!
//! This crate holds everything the worker supervisor reasons about without
//! touching a process or a socket: runtime candidates and version rules,
//! launch specifications, lifecycle snapshots, settings and path resolution.
//! Process control lives in `jvmhost-runtime`.

pub mod domain;
pub mod paths;
pub mod ports;
pub mod settings;

// Re-export commonly used types for convenience
pub use domain::{
    BootstrapFailure, BootstrapState, JavaVersion, LaunchMode, LaunchSpec, ProcessState,
    ProcessStatus, RuntimeCandidate, RuntimeOrigin, TerminationMethod, TerminationResult,
    VersionParseError, is_compatible,
};
pub use paths::{
    PathError, bundled_runtime_dir, data_root, ensure_directory, logs_dir, pidfile_path,
    settings_path,
};
pub use ports::{ErrorReporter, NoopReporter};
pub use settings::{
    DEFAULT_MAX_JAVA_VERSION, DEFAULT_MIN_JAVA_VERSION, DEFAULT_PORT_COUNT, DEFAULT_PORT_START,
    HealthSettings, HostSettings, LogSettings, PortSettings, RuntimeSettings, SettingsError,
    ShutdownSettings, WorkerEntry, WorkerSettings, validate_settings,
};
