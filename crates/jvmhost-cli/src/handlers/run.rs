//! Run command handler.

use anyhow::{Result, bail};
use jvmhost_core::BootstrapState;
use tracing::{info, warn};

use crate::bootstrap::CliContext;

fn describe(state: &BootstrapState) -> Option<&'static str> {
    match state {
        BootstrapState::StartingWorker => Some("Starting worker..."),
        BootstrapState::WaitingForHealth => Some("Waiting for worker to become ready..."),
        BootstrapState::Ready => Some("Worker ready."),
        BootstrapState::Idle | BootstrapState::Failed(_) => None,
    }
}

/// Bootstrap the worker, then keep it running until Ctrl-C.
pub async fn execute(ctx: &CliContext) -> Result<()> {
    let mut progress = ctx.orchestrator.watch_state();
    let printer = tokio::spawn(async move {
        while progress.changed().await.is_ok() {
            let state = progress.borrow_and_update().clone();
            if let Some(line) = describe(&state) {
                eprintln!("{line}");
            }
            if state.is_terminal() {
                break;
            }
        }
    });

    // A terminal has no window to wait for
    let outcome = ctx.orchestrator.run(async {}).await;
    let _ = printer.await;

    let client = match outcome {
        Ok(client) => client,
        // Already rendered by the reporter
        Err(e) => bail!("bootstrap failed: {}", e.kind()),
    };

    println!("Worker listening on {}", client.base_url());
    println!("Press Ctrl-C to stop.");

    let mut status = ctx.supervisor.watch_status();
    tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            if let Err(e) = signal {
                warn!(error = %e, "Failed to listen for Ctrl-C");
            }
        }
        () = async {
            while status.changed().await.is_ok() {
                if !status.borrow_and_update().state.has_process() {
                    break;
                }
            }
        } => {
            warn!("Worker is no longer running");
        }
    }

    info!("Shutting down worker");
    if let Some(report) = ctx.orchestrator.shutdown().await? {
        info!(
            escalated = report.escalated(),
            exited = report.exited,
            "Worker stopped"
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_lines() {
        assert!(describe(&BootstrapState::Idle).is_none());
        assert_eq!(describe(&BootstrapState::Ready), Some("Worker ready."));
    }
}
