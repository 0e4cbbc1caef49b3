//! Call command handler.

use anyhow::{Context, Result, bail};
use serde_json::Value;
use tracing::warn;

use crate::bootstrap::CliContext;

/// Parse `--args`; absent means JSON `null`.
pub fn parse_args(raw: Option<&str>) -> Result<Value> {
    raw.map_or(Ok(Value::Null), |raw| {
        serde_json::from_str(raw).context("--args must be valid JSON")
    })
}

/// Start the worker, send one command, print the pretty JSON result, then stop.
pub async fn execute(ctx: &CliContext, command: &str, args: Option<&str>) -> Result<()> {
    let args = parse_args(args)?;

    let client = match ctx.orchestrator.run(async {}).await {
        Ok(client) => client,
        Err(e) => bail!("bootstrap failed: {}", e.kind()),
    };

    let result = client.request(command, args).await;

    if let Err(e) = ctx.orchestrator.shutdown().await {
        warn!(error = %e, "Failed to stop worker");
    }

    let value = result.with_context(|| format!("command '{command}' failed"))?;
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}
