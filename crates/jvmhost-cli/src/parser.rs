//! Root CLI structure with global options.

use std::path::PathBuf;

use clap::Parser;

use crate::commands::Commands;

/// Launch and supervise the jvmhost worker.
#[derive(Parser)]
#[command(name = "jvmhost")]
#[command(about = "Launch, supervise and talk to the jvmhost worker")]
#[command(version)]
pub struct Cli {
    /// Settings file to use instead of the one in the data directory
    #[arg(long, env = "JVMHOST_SETTINGS", global = true)]
    pub settings: Option<PathBuf>,

    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parser_builds() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_args() {
        let cli = Cli::parse_from(["jvmhost", "--verbose", "--settings", "/tmp/s.json", "paths"]);
        assert!(cli.verbose);
        assert_eq!(cli.settings, Some(PathBuf::from("/tmp/s.json")));
        assert!(matches!(cli.command, Some(Commands::Paths)));
    }

    #[test]
    fn test_call_arguments() {
        let cli = Cli::parse_from(["jvmhost", "call", "listProjects", "--args", "{\"limit\":5}"]);
        match cli.command {
            Some(Commands::Call { command, args }) => {
                assert_eq!(command, "listProjects");
                assert_eq!(args.as_deref(), Some("{\"limit\":5}"));
            }
            _ => panic!("expected call command"),
        }
    }
}
