//! Error types for runtime discovery.

use std::path::PathBuf;

use jvmhost_core::{JavaVersion, RuntimeCandidate};
use thiserror::Error;

/// Why a single candidate could not be probed. Never fatal to discovery.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("{0} is not an executable file")]
    NotExecutable(PathBuf),

    #[error("failed to run {path}: {source}")]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{0} did not answer the version probe in time")]
    Timeout(PathBuf),

    #[error("could not read a version from {path}: {output}")]
    Unparsable { path: PathBuf, output: String },
}

/// Discovery found nothing usable.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// No location produced a runnable Java executable.
    #[error("No Java runtime found ({searched} locations searched)")]
    NotFound { searched: usize },

    /// Runtimes exist but none falls inside the supported window.
    #[error("No compatible Java runtime: need {min}–{max}, found {}", describe(.found))]
    VersionIncompatible {
        found: Vec<RuntimeCandidate>,
        min: JavaVersion,
        max: JavaVersion,
    },
}

fn describe(found: &[RuntimeCandidate]) -> String {
    found
        .iter()
        .map(|c| format!("{} at {}", c.version, c.path.display()))
        .collect::<Vec<_>>()
        .join(", ")
}
