//! Java runtime discovery.
//!
//! Candidates are searched in priority order, first compatible match wins:
//! 1. The runtime bundled with the application (embedded)
//! 2. `java` resolved through `PATH`
//! 3. A depth-limited walk of platform installation roots; within this
//!    source the highest compatible version is chosen
//!
//! Every candidate is validated by running it. A candidate that cannot be
//! probed is skipped and the search continues.

mod error;
mod probe;
mod walk;

use std::collections::HashSet;
use std::env;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use jvmhost_core::{JavaVersion, RuntimeCandidate, RuntimeOrigin, RuntimeSettings};
use tracing::{debug, info};

pub use error::{DiscoveryError, ProbeError};
pub use probe::{CommandProbe, ProbeReport, RuntimeProbe, parse_probe_output};
pub use walk::{JAVA_EXECUTABLE, find_runtime_executables, is_executable, java_in_home};

/// Where discovery looks.
#[derive(Debug, Clone, Default)]
pub struct DiscoveryConfig {
    /// `JAVA_HOME`-style directory of the bundled runtime.
    pub embedded_dir: Option<PathBuf>,
    /// Search-path value used for the `PATH` lookup. `None` skips that source.
    pub path_var: Option<OsString>,
    /// Installation roots for the tree walk, in priority order.
    pub roots: Vec<PathBuf>,
    pub max_depth: usize,
}

impl DiscoveryConfig {
    /// Build the search configuration from settings and the host environment.
    ///
    /// The embedded runtime falls back to `<exe dir>/runtime` when settings
    /// name none. `JAVA_HOME` and configured extra roots are walked before the
    /// platform defaults.
    pub fn from_settings(settings: &RuntimeSettings) -> Self {
        let embedded_dir = settings.embedded_dir.clone().or_else(|| {
            jvmhost_core::bundled_runtime_dir()
                .ok()
                .filter(|dir| dir.is_dir())
        });

        let mut roots = settings.extra_roots.clone();
        if let Some(java_home) = env::var_os("JAVA_HOME") {
            roots.push(PathBuf::from(java_home));
        }
        roots.extend(default_install_roots());

        Self {
            embedded_dir,
            path_var: env::var_os("PATH"),
            roots,
            max_depth: settings.search_depth,
        }
    }
}

/// Platform-conventional installation roots.
pub fn default_install_roots() -> Vec<PathBuf> {
    let mut roots: Vec<PathBuf> = Vec::new();

    #[cfg(target_os = "linux")]
    {
        roots.extend(["/usr/lib/jvm", "/usr/java", "/opt/java"].map(PathBuf::from));
    }

    #[cfg(target_os = "macos")]
    {
        roots.push(PathBuf::from("/Library/Java/JavaVirtualMachines"));
        if let Some(home) = dirs::home_dir() {
            roots.push(home.join("Library/Java/JavaVirtualMachines"));
        }
    }

    #[cfg(windows)]
    {
        for var in ["ProgramFiles", "ProgramFiles(x86)"] {
            if let Some(base) = env::var_os(var) {
                let base = PathBuf::from(base);
                roots.push(base.join("Java"));
                roots.push(base.join("Eclipse Adoptium"));
                roots.push(base.join("Microsoft"));
            }
        }
    }

    if let Some(home) = dirs::home_dir() {
        #[cfg(unix)]
        roots.push(home.join(".sdkman/candidates/java"));
        roots.push(home.join(".jdks"));
    }

    roots
}

/// Source of the runtime a worker is launched with.
#[async_trait]
pub trait RuntimeResolver: Send + Sync {
    async fn resolve(
        &self,
        min: &JavaVersion,
        max: &JavaVersion,
    ) -> Result<RuntimeCandidate, DiscoveryError>;
}

/// Finds and validates Java runtimes.
pub struct RuntimeDiscovery {
    config: DiscoveryConfig,
    probe: Arc<dyn RuntimeProbe>,
}

impl RuntimeDiscovery {
    /// Discovery that validates candidates by running them.
    pub fn new(config: DiscoveryConfig) -> Self {
        Self::with_probe(config, Arc::new(CommandProbe::default()))
    }

    pub fn with_probe(config: DiscoveryConfig, probe: Arc<dyn RuntimeProbe>) -> Self {
        Self { config, probe }
    }

    pub const fn config(&self) -> &DiscoveryConfig {
        &self.config
    }

    /// Find the runtime to launch the worker with.
    ///
    /// Returns `VersionIncompatible` when runtimes exist but all fall outside
    /// `[min, max]`, and `NotFound` when nothing runnable exists at all.
    pub async fn find_best_runtime(
        &self,
        min: &JavaVersion,
        max: &JavaVersion,
    ) -> Result<RuntimeCandidate, DiscoveryError> {
        let mut seen = HashSet::new();
        let mut incompatible = Vec::new();
        let mut searched = 0usize;

        for origin in [
            RuntimeOrigin::Embedded,
            RuntimeOrigin::PathEnv,
            RuntimeOrigin::DiscoveredTree,
        ] {
            let mut best: Option<RuntimeCandidate> = None;

            for exe in self.executables_for(origin).await {
                searched += 1;
                if !seen.insert(dedup_key(&exe)) {
                    continue;
                }
                let Some(candidate) = self.probe_candidate(&exe, origin).await else {
                    continue;
                };

                if !candidate.is_compatible(min, max) {
                    debug!(
                        path = %candidate.path.display(),
                        version = %candidate.version,
                        "Runtime outside supported version window"
                    );
                    incompatible.push(candidate);
                    continue;
                }

                if origin != RuntimeOrigin::DiscoveredTree {
                    info!("Using {candidate}");
                    return Ok(candidate);
                }
                if best.as_ref().is_none_or(|b| candidate.version > b.version) {
                    best = Some(candidate);
                }
            }

            if let Some(candidate) = best {
                info!("Using {candidate}");
                return Ok(candidate);
            }
        }

        if incompatible.is_empty() {
            Err(DiscoveryError::NotFound { searched })
        } else {
            Err(DiscoveryError::VersionIncompatible {
                found: incompatible,
                min: min.clone(),
                max: max.clone(),
            })
        }
    }

    /// Every runnable runtime across all sources, in search order.
    pub async fn list_candidates(&self) -> Vec<RuntimeCandidate> {
        let mut seen = HashSet::new();
        let mut candidates = Vec::new();

        for origin in [
            RuntimeOrigin::Embedded,
            RuntimeOrigin::PathEnv,
            RuntimeOrigin::DiscoveredTree,
        ] {
            for exe in self.executables_for(origin).await {
                if !seen.insert(dedup_key(&exe)) {
                    continue;
                }
                if let Some(candidate) = self.probe_candidate(&exe, origin).await {
                    candidates.push(candidate);
                }
            }
        }

        candidates
    }

    async fn executables_for(&self, origin: RuntimeOrigin) -> Vec<PathBuf> {
        match origin {
            RuntimeOrigin::Embedded => self
                .config
                .embedded_dir
                .as_deref()
                .map(java_in_home)
                .filter(|exe| is_executable(exe))
                .into_iter()
                .collect(),
            RuntimeOrigin::PathEnv => self.path_executable().into_iter().collect(),
            RuntimeOrigin::DiscoveredTree => {
                let roots = self.config.roots.clone();
                let depth = self.config.max_depth;
                tokio::task::spawn_blocking(move || find_runtime_executables(&roots, depth))
                    .await
                    .unwrap_or_default()
            }
        }
    }

    fn path_executable(&self) -> Option<PathBuf> {
        let path_var = self.config.path_var.as_ref()?;
        let cwd = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        which::which_in("java", Some(path_var), cwd).ok()
    }

    async fn probe_candidate(&self, exe: &Path, origin: RuntimeOrigin) -> Option<RuntimeCandidate> {
        match self.probe.probe(exe).await {
            Ok(report) => Some(RuntimeCandidate {
                path: exe.to_path_buf(),
                version: report.version,
                architecture: report.architecture,
                origin,
                executable_valid: true,
            }),
            Err(e) => {
                debug!(path = %exe.display(), error = %e, "Skipping runtime candidate");
                None
            }
        }
    }
}

#[async_trait]
impl RuntimeResolver for RuntimeDiscovery {
    async fn resolve(
        &self,
        min: &JavaVersion,
        max: &JavaVersion,
    ) -> Result<RuntimeCandidate, DiscoveryError> {
        self.find_best_runtime(min, max).await
    }
}

/// Symlinked launchers (`/usr/bin/java`) resolve to the same install, so
/// candidates are keyed by canonical path. One path yields one version.
fn dedup_key(exe: &Path) -> PathBuf {
    fs::canonicalize(exe).unwrap_or_else(|_| exe.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use tempfile::tempdir;

    /// Probe answering from a table; unknown paths fail like a broken binary.
    #[derive(Default)]
    struct TableProbe {
        versions: HashMap<PathBuf, &'static str>,
        calls: Mutex<Vec<PathBuf>>,
    }

    impl TableProbe {
        fn with(mut self, exe: &Path, version: &'static str) -> Self {
            self.versions.insert(exe.to_path_buf(), version);
            self
        }
    }

    #[async_trait]
    impl RuntimeProbe for TableProbe {
        async fn probe(&self, executable: &Path) -> Result<ProbeReport, ProbeError> {
            self.calls.lock().unwrap().push(executable.to_path_buf());
            match self.versions.get(executable) {
                Some(v) => Ok(ProbeReport {
                    version: JavaVersion::parse(v).unwrap(),
                    architecture: "amd64".to_string(),
                }),
                None => Err(ProbeError::Unparsable {
                    path: executable.to_path_buf(),
                    output: "garbage".to_string(),
                }),
            }
        }
    }

    fn fake_home(home: &Path) -> PathBuf {
        let exe = java_in_home(home);
        fs::create_dir_all(exe.parent().unwrap()).unwrap();
        fs::write(&exe, "#!/bin/sh\n").unwrap();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&exe, fs::Permissions::from_mode(0o755)).unwrap();
        }
        exe
    }

    fn v(s: &str) -> JavaVersion {
        JavaVersion::parse(s).unwrap()
    }

    fn config(embedded: Option<&Path>, roots: &[&Path]) -> DiscoveryConfig {
        DiscoveryConfig {
            embedded_dir: embedded.map(Path::to_path_buf),
            path_var: None,
            roots: roots.iter().map(|r| r.to_path_buf()).collect(),
            max_depth: 3,
        }
    }

    #[tokio::test]
    async fn test_embedded_wins_over_tree() {
        let dir = tempdir().unwrap();
        let embedded = dir.path().join("app").join("runtime");
        let embedded_exe = fake_home(&embedded);
        let tree = dir.path().join("jvm");
        let tree_exe = fake_home(&tree.join("jdk-21"));

        let probe = TableProbe::default()
            .with(&embedded_exe, "17.0.9")
            .with(&tree_exe, "21.0.1");
        let discovery =
            RuntimeDiscovery::with_probe(config(Some(&embedded), &[&tree]), Arc::new(probe));

        let found = discovery.find_best_runtime(&v("17"), &v("21.99")).await.unwrap();
        assert_eq!(found.origin, RuntimeOrigin::Embedded);
        assert_eq!(found.path, embedded_exe);
    }

    #[tokio::test]
    async fn test_incompatible_embedded_falls_through_to_highest_tree_version() {
        let dir = tempdir().unwrap();
        let embedded = dir.path().join("runtime");
        let embedded_exe = fake_home(&embedded);
        let tree = dir.path().join("jvm");
        let jdk11 = fake_home(&tree.join("jdk-11"));
        let jdk17 = fake_home(&tree.join("jdk-17"));
        let jdk22 = fake_home(&tree.join("jdk-22"));

        let probe = TableProbe::default()
            .with(&embedded_exe, "1.8.0_292")
            .with(&jdk11, "11.0.21")
            .with(&jdk17, "17.0.9")
            .with(&jdk22, "22");
        let discovery =
            RuntimeDiscovery::with_probe(config(Some(&embedded), &[&tree]), Arc::new(probe));

        let found = discovery.find_best_runtime(&v("11"), &v("21")).await.unwrap();
        assert_eq!(found.origin, RuntimeOrigin::DiscoveredTree);
        assert_eq!(found.path, jdk17);
    }

    #[tokio::test]
    async fn test_broken_candidate_is_skipped() {
        let dir = tempdir().unwrap();
        let tree = dir.path().join("jvm");
        let _broken = fake_home(&tree.join("jdk-broken"));
        let good = fake_home(&tree.join("jdk-17"));

        let probe = TableProbe::default().with(&good, "17");
        let discovery = RuntimeDiscovery::with_probe(config(None, &[&tree]), Arc::new(probe));

        let found = discovery.find_best_runtime(&v("17"), &v("21")).await.unwrap();
        assert_eq!(found.path, good);
    }

    #[tokio::test]
    async fn test_all_incompatible_reports_versions() {
        let dir = tempdir().unwrap();
        let tree = dir.path().join("jvm");
        let old = fake_home(&tree.join("jdk-8"));

        let probe = TableProbe::default().with(&old, "1.8.0_292");
        let discovery = RuntimeDiscovery::with_probe(config(None, &[&tree]), Arc::new(probe));

        let err = discovery
            .find_best_runtime(&v("17"), &v("21"))
            .await
            .unwrap_err();
        match err {
            DiscoveryError::VersionIncompatible { found, .. } => {
                assert_eq!(found.len(), 1);
                assert_eq!(found[0].version.major(), 8);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_nothing_found() {
        let dir = tempdir().unwrap();
        let discovery = RuntimeDiscovery::with_probe(
            config(Some(&dir.path().join("none")), &[dir.path()]),
            Arc::new(TableProbe::default()),
        );

        let err = discovery
            .find_best_runtime(&v("17"), &v("21"))
            .await
            .unwrap_err();
        assert!(matches!(err, DiscoveryError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_same_install_reached_twice_is_probed_once() {
        let dir = tempdir().unwrap();
        let tree = dir.path().join("jvm");
        let exe = fake_home(&tree.join("jdk-17"));

        let probe = Arc::new(TableProbe::default().with(&exe, "22"));
        // The embedded dir and the tree both point at the same install
        let discovery = RuntimeDiscovery::with_probe(
            config(Some(&tree.join("jdk-17")), &[&tree]),
            probe.clone(),
        );

        let err = discovery
            .find_best_runtime(&v("17"), &v("21"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DiscoveryError::VersionIncompatible { ref found, .. } if found.len() == 1
        ));
        assert_eq!(probe.calls.lock().unwrap().len(), 1);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_path_lookup_precedes_tree() {
        let dir = tempdir().unwrap();
        let path_home = dir.path().join("path-jdk");
        let path_exe = fake_home(&path_home);
        let tree = dir.path().join("jvm");
        let tree_exe = fake_home(&tree.join("jdk-21"));

        let probe = TableProbe::default()
            .with(&path_exe, "17.0.2")
            .with(&tree_exe, "21");
        let mut cfg = config(None, &[&tree]);
        cfg.path_var = Some(path_home.join("bin").into_os_string());
        let discovery = RuntimeDiscovery::with_probe(cfg, Arc::new(probe));

        let found = discovery.find_best_runtime(&v("17"), &v("21")).await.unwrap();
        assert_eq!(found.origin, RuntimeOrigin::PathEnv);
    }

    #[tokio::test]
    async fn test_list_candidates_includes_incompatible() {
        let dir = tempdir().unwrap();
        let tree = dir.path().join("jvm");
        let a = fake_home(&tree.join("jdk-8"));
        let b = fake_home(&tree.join("jdk-17"));

        let probe = TableProbe::default().with(&a, "1.8.0").with(&b, "17");
        let discovery = RuntimeDiscovery::with_probe(config(None, &[&tree]), Arc::new(probe));

        let all = discovery.list_candidates().await;
        assert_eq!(all.len(), 2);
        assert!(all.iter().all(|c| c.origin == RuntimeOrigin::DiscoveredTree));
    }

    #[test]
    fn test_default_roots_include_per_user_jdks() {
        let roots = default_install_roots();
        if let Some(home) = dirs::home_dir() {
            assert!(roots.contains(&home.join(".jdks")));
        }
    }
}
