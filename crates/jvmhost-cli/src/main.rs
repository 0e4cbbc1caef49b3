//! jvmhost binary entry point.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use jvmhost_cli::bootstrap::{CliConfig, CliContext, bootstrap};
use jvmhost_cli::commands::Commands;
use jvmhost_cli::handlers;
use jvmhost_cli::parser::Cli;
use jvmhost_cli::reporter::StderrReporter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env before anything reads JVMHOST_* variables
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let Some(command) = cli.command else {
        println!("No command specified. Use --help for usage information.");
        return Ok(());
    };

    match command {
        Commands::Paths => handlers::paths::execute(),
        Commands::Run => handlers::run::execute(&context(cli.settings)?).await,
        Commands::Call { command, args } => {
            handlers::call::execute(&context(cli.settings)?, &command, args.as_deref()).await
        }
        Commands::Runtimes => handlers::runtimes::execute(&context(cli.settings)?).await,
    }
}

fn context(settings_path: Option<PathBuf>) -> Result<CliContext> {
    bootstrap(
        CliConfig { settings_path },
        Arc::new(StderrReporter::new()),
    )
}
