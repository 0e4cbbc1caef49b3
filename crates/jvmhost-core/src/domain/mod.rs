//! Domain types shared by the supervisor, the orchestrator and their observers.
//!
//! All types here are plain data: they are produced by the runtime crate and
//! handed to consumers as owned snapshots.

mod bootstrap;
mod launch;
mod process;
mod runtime;
mod termination;
mod version;

pub use bootstrap::{BootstrapFailure, BootstrapState};
pub use launch::{LaunchMode, LaunchSpec};
pub use process::{ProcessState, ProcessStatus};
pub use runtime::{RuntimeCandidate, RuntimeOrigin};
pub use termination::{TerminationMethod, TerminationResult};
pub use version::{JavaVersion, VersionParseError, is_compatible};
