//! CLI composition root.
//!
//! Loads settings and builds the supervisor stack: discovery, launcher,
//! termination strategy, supervisor and bootstrap orchestrator.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use jvmhost_core::{
    ErrorReporter, HostSettings, JavaVersion, logs_dir, pidfile_path, settings_path,
    validate_settings,
};
use jvmhost_runtime::{
    BootstrapConfig, BootstrapOrchestrator, DiscoveryConfig, ProcessLauncher, ProcessSupervisor,
    RuntimeDiscovery, SupervisorConfig, platform_strategy,
};
use tracing::debug;

/// Configuration for building the CLI context.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    /// Settings file override; the data-directory file is used when `None`.
    pub settings_path: Option<PathBuf>,
}

/// Everything the handlers need.
pub struct CliContext {
    pub settings: HostSettings,
    pub discovery: Arc<RuntimeDiscovery>,
    pub supervisor: Arc<ProcessSupervisor>,
    pub orchestrator: Arc<BootstrapOrchestrator>,
}

impl CliContext {
    /// Supported runtime window from the loaded settings.
    pub const fn version_window(&self) -> (&JavaVersion, &JavaVersion) {
        (
            &self.settings.runtime.min_version,
            &self.settings.runtime.max_version,
        )
    }
}

/// Read the settings file, apply `JVMHOST_*` overrides and validate.
pub fn load_settings(path: Option<PathBuf>) -> Result<HostSettings> {
    let path = match path {
        Some(path) => path,
        None => settings_path().context("Failed to resolve settings path")?,
    };
    debug!(path = %path.display(), "Loading settings");

    let mut settings = HostSettings::load_from(&path)?;
    settings.apply_env_overrides()?;
    validate_settings(&settings)?;
    Ok(settings)
}

/// Wire the supervisor stack from settings.
pub fn bootstrap(config: CliConfig, reporter: Arc<dyn ErrorReporter>) -> Result<CliContext> {
    let settings = load_settings(config.settings_path)?;

    let pidfile = pidfile_path().ok();
    let discovery = Arc::new(RuntimeDiscovery::new(DiscoveryConfig::from_settings(
        &settings.runtime,
    )));
    let launcher = ProcessLauncher::from_settings(&settings.logs, logs_dir().ok());

    let supervisor = Arc::new(ProcessSupervisor::new(
        SupervisorConfig::from_settings(&settings, pidfile.clone()),
        discovery.clone(),
        launcher,
        platform_strategy(),
    ));
    let orchestrator = Arc::new(BootstrapOrchestrator::new(
        supervisor.clone(),
        reporter,
        BootstrapConfig::from_settings(&settings, pidfile),
    ));

    Ok(CliContext {
        settings,
        discovery,
        supervisor,
        orchestrator,
    })
}
