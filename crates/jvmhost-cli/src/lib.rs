//! Command-line host for the jvmhost worker.
//!
//! Stands in for the desktop shell: it wires settings into the runtime
//! components, runs the bootstrap sequence and renders progress and
//! diagnostics on the terminal.
#![deny(unsafe_code)]

pub mod bootstrap;
pub mod commands;
pub mod handlers;
pub mod parser;
pub mod reporter;

pub use bootstrap::{CliConfig, CliContext, bootstrap, load_settings};
pub use commands::Commands;
pub use parser::Cli;
pub use reporter::StderrReporter;
