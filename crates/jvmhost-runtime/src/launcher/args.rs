//! Worker command line.
//!
//! The worker's own argument parser expects a fixed order:
//! runtime flags, then mode flags, then the port flag.

use std::env;
use std::path::{Path, PathBuf};

use jvmhost_core::{LaunchMode, LaunchSpec, RuntimeCandidate, WorkerEntry, WorkerSettings};

use super::LaunchError;
use crate::ports::PortPair;

/// Flags understood by the runtime itself.
pub fn runtime_flags(worker: &WorkerSettings, management_port: u16) -> Vec<String> {
    let mut flags = vec![
        "-Dfile.encoding=UTF-8".to_string(),
        "-Djava.awt.headless=true".to_string(),
        format!("-Xms{}m", worker.heap_min_mb),
        format!("-Xmx{}m", worker.heap_max_mb),
        format!("-XX:+{}", worker.gc),
        "-XX:+ExitOnOutOfMemoryError".to_string(),
        format!("-Dmanagement.server.port={management_port}"),
    ];
    flags.extend(worker.extra_jvm_args.iter().cloned());
    flags
}

/// Flags that hand the worker code to the runtime.
pub fn mode_flags(entry: &WorkerEntry) -> Result<(LaunchMode, Vec<String>), LaunchError> {
    match entry {
        WorkerEntry::ExecutableArchive { path } => {
            if path.as_os_str().is_empty() {
                return Err(LaunchError::MissingEntry);
            }
            Ok((
                LaunchMode::ExecutableArchive,
                vec!["-jar".to_string(), path.display().to_string()],
            ))
        }
        WorkerEntry::Classpath {
            entries,
            main_class,
        } => {
            if entries.is_empty() || main_class.is_empty() {
                return Err(LaunchError::MissingEntry);
            }
            let joined = env::join_paths(entries)
                .map_err(|e| LaunchError::InvalidClasspath(e.to_string()))?
                .into_string()
                .map_err(|raw| {
                    LaunchError::InvalidClasspath(format!(
                        "not valid UTF-8: {}",
                        raw.to_string_lossy()
                    ))
                })?;
            Ok((
                LaunchMode::Classpath,
                vec!["-cp".to_string(), joined, main_class.clone()],
            ))
        }
    }
}

pub fn port_flag(port: u16) -> String {
    format!("--server.port={port}")
}

/// Assemble the full launch specification for one start.
pub fn build_launch_spec(
    runtime: &RuntimeCandidate,
    worker: &WorkerSettings,
    ports: PortPair,
) -> Result<LaunchSpec, LaunchError> {
    let (mode, mode_args) = mode_flags(&worker.entry)?;

    let mut argv = runtime_flags(worker, ports.management);
    argv.extend(mode_args);
    argv.push(port_flag(ports.primary));

    Ok(LaunchSpec {
        executable_path: runtime.path.clone(),
        argv,
        working_dir: resolve_working_dir(worker.working_dir.as_deref())?,
        env: worker.env.clone(),
        mode,
        port: ports.primary,
    })
}

fn resolve_working_dir(configured: Option<&Path>) -> Result<PathBuf, LaunchError> {
    match configured {
        Some(dir) if dir.is_dir() => Ok(dir.to_path_buf()),
        Some(dir) => Err(LaunchError::WorkingDir {
            path: dir.to_path_buf(),
            reason: "not a directory".to_string(),
        }),
        None => env::current_dir().map_err(|e| LaunchError::WorkingDir {
            path: PathBuf::from("."),
            reason: e.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jvmhost_core::{JavaVersion, RuntimeOrigin};

    fn runtime() -> RuntimeCandidate {
        RuntimeCandidate {
            path: PathBuf::from("/opt/jdk/bin/java"),
            version: JavaVersion::parse("17.0.9").unwrap(),
            architecture: "amd64".to_string(),
            origin: RuntimeOrigin::Embedded,
            executable_valid: true,
        }
    }

    const PORTS: PortPair = PortPair {
        primary: 8765,
        management: 8766,
    };

    #[test]
    fn test_archive_mode_order() {
        let worker = WorkerSettings {
            entry: WorkerEntry::ExecutableArchive {
                path: PathBuf::from("worker.jar"),
            },
            extra_jvm_args: vec!["-Dfoo=bar".to_string()],
            ..WorkerSettings::default()
        };

        let spec = build_launch_spec(&runtime(), &worker, PORTS).unwrap();

        assert_eq!(spec.mode, LaunchMode::ExecutableArchive);
        assert_eq!(spec.port, 8765);
        assert_eq!(
            spec.argv,
            vec![
                "-Dfile.encoding=UTF-8",
                "-Djava.awt.headless=true",
                "-Xms256m",
                "-Xmx2048m",
                "-XX:+UseG1GC",
                "-XX:+ExitOnOutOfMemoryError",
                "-Dmanagement.server.port=8766",
                "-Dfoo=bar",
                "-jar",
                "worker.jar",
                "--server.port=8765",
            ]
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_classpath_mode_joins_entries() {
        let worker = WorkerSettings {
            entry: WorkerEntry::Classpath {
                entries: vec![PathBuf::from("lib/a.jar"), PathBuf::from("classes")],
                main_class: "com.example.Worker".to_string(),
            },
            ..WorkerSettings::default()
        };

        let spec = build_launch_spec(&runtime(), &worker, PORTS).unwrap();

        assert_eq!(spec.mode, LaunchMode::Classpath);
        let tail: Vec<&str> = spec.argv.iter().rev().take(4).rev().map(String::as_str).collect();
        assert_eq!(
            tail,
            vec!["-cp", "lib/a.jar:classes", "com.example.Worker", "--server.port=8765"]
        );
    }

    #[test]
    fn test_port_flag_is_last() {
        let spec = build_launch_spec(&runtime(), &WorkerSettings::default(), PORTS).unwrap();
        assert_eq!(spec.argv.last().map(String::as_str), Some("--server.port=8765"));
    }

    #[test]
    fn test_empty_classpath_rejected() {
        let entry = WorkerEntry::Classpath {
            entries: Vec::new(),
            main_class: "Main".to_string(),
        };
        assert!(matches!(mode_flags(&entry), Err(LaunchError::MissingEntry)));
    }

    #[test]
    fn test_missing_working_dir_rejected() {
        let worker = WorkerSettings {
            working_dir: Some(PathBuf::from("/definitely/not/here")),
            ..WorkerSettings::default()
        };
        assert!(matches!(
            build_launch_spec(&runtime(), &worker, PORTS),
            Err(LaunchError::WorkingDir { .. })
        ));
    }
}
