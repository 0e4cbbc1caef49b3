//! Command handlers.

pub mod call;
pub mod paths;
pub mod run;
pub mod runtimes;
