//! Runtimes command handler.

use anyhow::Result;

use crate::bootstrap::CliContext;

/// List every runtime discovery finds, marking those inside the version window.
pub async fn execute(ctx: &CliContext) -> Result<()> {
    let (min, max) = ctx.version_window();
    let candidates = ctx.discovery.list_candidates().await;

    if candidates.is_empty() {
        println!("No Java runtimes found.");
        return Ok(());
    }

    println!("Supported versions: {min} to {max}");
    for candidate in &candidates {
        let marker = if candidate.is_compatible(min, max) {
            "ok"
        } else {
            "--"
        };
        println!("  [{marker}] {candidate}");
    }

    match ctx.discovery.find_best_runtime(min, max).await {
        Ok(best) => println!("Selected: {}", best.path.display()),
        Err(e) => println!("Selected: none ({e})"),
    }
    Ok(())
}
