//! Version probing of a single `java` executable.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use jvmhost_core::JavaVersion;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

use super::error::ProbeError;
use super::walk::is_executable;

/// What a runtime reports about itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeReport {
    pub version: JavaVersion,
    pub architecture: String,
}

/// Asks an executable for its version and architecture.
#[async_trait]
pub trait RuntimeProbe: Send + Sync {
    async fn probe(&self, executable: &Path) -> Result<ProbeReport, ProbeError>;
}

/// Runs `java -XshowSettings:properties -version` and parses the diagnostics.
#[derive(Debug, Clone)]
pub struct CommandProbe {
    timeout: Duration,
}

impl Default for CommandProbe {
    fn default() -> Self {
        Self::new(Duration::from_secs(10))
    }
}

impl CommandProbe {
    pub const fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl RuntimeProbe for CommandProbe {
    async fn probe(&self, executable: &Path) -> Result<ProbeReport, ProbeError> {
        if !is_executable(executable) {
            return Err(ProbeError::NotExecutable(executable.to_path_buf()));
        }

        let output = Command::new(executable)
            .arg("-XshowSettings:properties")
            .arg("-version")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        let output = timeout(self.timeout, output)
            .await
            .map_err(|_| ProbeError::Timeout(executable.to_path_buf()))?
            .map_err(|source| ProbeError::Spawn {
                path: executable.to_path_buf(),
                source,
            })?;

        // The JVM writes both the property dump and the banner to stderr
        let mut text = String::from_utf8_lossy(&output.stderr).into_owned();
        text.push('\n');
        text.push_str(&String::from_utf8_lossy(&output.stdout));

        debug!(path = %executable.display(), status = %output.status, "Version probe finished");

        parse_probe_output(&text).ok_or_else(|| ProbeError::Unparsable {
            path: executable.to_path_buf(),
            output: text.lines().take(3).collect::<Vec<_>>().join(" | "),
        })
    }
}

/// Extract version and architecture from JVM diagnostic output.
///
/// Prefers the `java.version` property and falls back to the banner line
/// (`openjdk version "17.0.2" 2022-01-18`).
pub fn parse_probe_output(text: &str) -> Option<ProbeReport> {
    let version = property(text, "java.version")
        .and_then(|v| JavaVersion::parse(v).ok())
        .or_else(|| banner_version(text))?;

    let architecture = property(text, "os.arch").map_or_else(
        || {
            if text.contains("64-Bit") {
                "64-bit".to_string()
            } else {
                "unknown".to_string()
            }
        },
        ToString::to_string,
    );

    Some(ProbeReport {
        version,
        architecture,
    })
}

fn property<'a>(text: &'a str, key: &str) -> Option<&'a str> {
    text.lines().find_map(|line| {
        let (lhs, rhs) = line.split_once('=')?;
        (lhs.trim() == key).then(|| rhs.trim())
    })
}

fn banner_version(text: &str) -> Option<JavaVersion> {
    text.lines()
        .filter(|line| line.contains(" version "))
        .find_map(|line| {
            let start = line.find('"')? + 1;
            let end = start + line[start..].find('"')?;
            JavaVersion::parse(&line[start..end]).ok()
        })
}
