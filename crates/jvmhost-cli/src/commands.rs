//! Subcommands.

use clap::Subcommand;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the worker, wait until it is ready and keep it running until Ctrl-C
    Run,

    /// Start the worker, forward one command to it, print the result and stop
    Call {
        /// Worker command name, sent as `POST /api/<command>`
        command: String,

        /// Command arguments as a JSON value
        #[arg(long)]
        args: Option<String>,
    },

    /// List every Java runtime discovery can find
    Runtimes,

    /// Show the resolved data, log, PID and settings paths
    Paths,
}
