//! Port definitions (trait abstractions) for collaborators outside the supervisor.
//!
//! Ports contain no implementation details and use only domain types.

mod error_reporter;

pub use error_reporter::{ErrorReporter, NoopReporter};
