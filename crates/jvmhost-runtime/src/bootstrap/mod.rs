//! Startup sequencing.
//!
//! [`BootstrapOrchestrator::run`] waits for the host, clears a worker left
//! behind by a crashed host, allocates ports, starts the worker and waits
//! for it to answer its readiness endpoint. Progress is pushed on a watch
//! channel; a fatal failure is also handed to the [`ErrorReporter`].
//!
//! There is no cancellation token. A caller that stops waiting on `run`
//! simply drops the future; work already handed to the supervisor keeps
//! going and the bootstrap state stays where it was.

mod error;

use std::future::Future;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use jvmhost_core::{
    BootstrapState, ErrorReporter, HealthSettings, HostSettings, PortSettings, ShutdownSettings,
};
use tokio::sync::{broadcast, watch};
use tracing::{debug, error, info, warn};

pub use error::BootstrapError;

use crate::health::WorkerClient;
use crate::pidfile::{SweepOutcome, sweep_orphan};
use crate::ports::allocate_port_pair;
use crate::supervisor::{ProcessSupervisor, SupervisorError, SupervisorEvent};
use crate::termination::StopReport;

/// Settings the orchestrator needs beyond the supervisor's own.
#[derive(Debug, Clone)]
pub struct BootstrapConfig {
    pub ports: PortSettings,
    pub health: HealthSettings,
    pub shutdown: ShutdownSettings,
    /// PID file checked for an orphaned worker before starting.
    pub pidfile: Option<PathBuf>,
}

impl BootstrapConfig {
    pub fn from_settings(settings: &HostSettings, pidfile: Option<PathBuf>) -> Self {
        Self {
            ports: settings.ports.clone(),
            health: settings.health.clone(),
            shutdown: settings.shutdown.clone(),
            pidfile,
        }
    }
}

/// Held for the whole of one `run`; a second caller is turned away.
struct RunGuard<'a> {
    running: &'a AtomicBool,
}

impl<'a> RunGuard<'a> {
    fn acquire(running: &'a AtomicBool) -> Option<Self> {
        running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| Self { running })
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
    }
}

/// Drives the worker from nothing to ready.
pub struct BootstrapOrchestrator {
    supervisor: Arc<ProcessSupervisor>,
    reporter: Arc<dyn ErrorReporter>,
    config: BootstrapConfig,
    state: watch::Sender<BootstrapState>,
    client: Mutex<Option<WorkerClient>>,
    running: AtomicBool,
}

impl BootstrapOrchestrator {
    pub fn new(
        supervisor: Arc<ProcessSupervisor>,
        reporter: Arc<dyn ErrorReporter>,
        config: BootstrapConfig,
    ) -> Self {
        let (state, _) = watch::channel(BootstrapState::Idle);
        Self {
            supervisor,
            reporter,
            config,
            state,
            client: Mutex::new(None),
            running: AtomicBool::new(false),
        }
    }

    pub fn state(&self) -> BootstrapState {
        self.state.borrow().clone()
    }

    /// Latest-value view of the bootstrap state.
    pub fn watch_state(&self) -> watch::Receiver<BootstrapState> {
        self.state.subscribe()
    }

    pub const fn supervisor(&self) -> &Arc<ProcessSupervisor> {
        &self.supervisor
    }

    /// Client for the ready worker, once bootstrap has succeeded.
    pub fn client(&self) -> Option<WorkerClient> {
        self.client
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn advance(&self, next: BootstrapState) {
        let applied = self.state.send_if_modified(|current| {
            if current.can_advance_to(&next) {
                *current = next.clone();
                true
            } else {
                false
            }
        });
        if applied {
            debug!(state = ?next, "Bootstrap state changed");
        } else {
            warn!(state = ?next, "Ignoring out-of-order bootstrap transition");
        }
    }

    /// Run the startup sequence once `host_ready` resolves.
    ///
    /// On failure the state becomes `Failed`, the reporter is called, and a
    /// worker started by this run is stopped again.
    ///
    /// Only one run may be active. A concurrent or repeated call fails with
    /// [`BootstrapError::Supervisor`] and changes nothing.
    pub async fn run<F>(&self, host_ready: F) -> Result<WorkerClient, BootstrapError>
    where
        F: Future<Output = ()> + Send,
    {
        let Some(_guard) = RunGuard::acquire(&self.running) else {
            return Err(BootstrapError::Supervisor(
                "bootstrap is already running".to_string(),
            ));
        };
        if self.state() != BootstrapState::Idle {
            return Err(BootstrapError::Supervisor(
                "bootstrap already ran; reset it before running again".to_string(),
            ));
        }

        host_ready.await;
        self.advance(BootstrapState::StartingWorker);

        let mut started = false;
        match self.boot(&mut started).await {
            Ok(client) => {
                *self.client.lock().unwrap_or_else(PoisonError::into_inner) = Some(client.clone());
                self.advance(BootstrapState::Ready);
                info!(url = %client.base_url(), "Worker ready");
                Ok(client)
            }
            Err(e) => {
                let failure = e.to_failure();
                error!(kind = %failure.kind, "Bootstrap failed: {}", failure.message);

                if started
                    && self.supervisor.status().state.has_process()
                    && let Err(stop_err) = self.supervisor.stop().await
                {
                    warn!(error = %stop_err, "Failed to stop worker after bootstrap failure");
                }

                self.reporter.report(&failure);
                self.advance(BootstrapState::Failed(failure));
                Err(e)
            }
        }
    }

    async fn boot(&self, started: &mut bool) -> Result<WorkerClient, BootstrapError> {
        self.sweep_orphan().await;

        let (start, end) = self.config.ports.bounds().ok_or_else(|| {
            BootstrapError::PortRangeExhausted {
                start: self.config.ports.start,
                end: u16::MAX,
            }
        })?;
        let ports = allocate_port_pair(start, end)?;
        debug!(primary = %ports.primary, management = %ports.management, "Ports allocated");

        // Subscribe before starting so an early crash cannot be missed
        let mut events = self.supervisor.subscribe();
        self.supervisor.start(ports).await?;
        *started = true;
        self.advance(BootstrapState::WaitingForHealth);

        let health = &self.config.health;
        let client = WorkerClient::new(ports.primary, health)
            .map_err(|e| BootstrapError::Supervisor(e.to_string()))?;

        tokio::select! {
            ready = client.wait_for_ready(health.ready_timeout(), health.poll_interval()) => {
                if ready {
                    Ok(client)
                } else {
                    Err(BootstrapError::HealthCheckTimeout {
                        port: ports.primary,
                        timeout_secs: health.ready_timeout_secs,
                    })
                }
            }
            crash = next_exit(&mut events) => Err(crash),
        }
    }

    async fn sweep_orphan(&self) {
        let Some(path) = &self.config.pidfile else {
            return;
        };
        match sweep_orphan(
            path,
            self.supervisor.strategy().as_ref(),
            &self.config.shutdown,
        )
        .await
        {
            Ok(SweepOutcome::Terminated { pid, .. }) => {
                info!(pid = %pid, "Stopped worker left over from a previous run");
            }
            Ok(_) => {}
            Err(e) => warn!(error = %e, "Orphan sweep failed"),
        }
    }

    /// Return a finished run to `Idle` so it can run again.
    pub fn reset(&self) -> bool {
        let reset = self.state.send_if_modified(|current| {
            if current.can_reset() {
                *current = BootstrapState::Idle;
                true
            } else {
                false
            }
        });
        if reset {
            self.client
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .take();
        }
        reset
    }

    /// Stop the worker on host shutdown.
    pub async fn shutdown(&self) -> Result<Option<StopReport>, SupervisorError> {
        self.client
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        self.supervisor.stop().await
    }
}

/// Resolve once the worker exits, for any reason.
async fn next_exit(events: &mut broadcast::Receiver<SupervisorEvent>) -> BootstrapError {
    loop {
        match events.recv().await {
            Ok(SupervisorEvent::Crashed { exit, log_path, .. }) => {
                return BootstrapError::ProcessCrashed {
                    exit: exit.describe(),
                    log_path,
                };
            }
            Ok(SupervisorEvent::Exited { exit }) => {
                return BootstrapError::ProcessCrashed {
                    exit: exit.describe(),
                    log_path: None,
                };
            }
            Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => {}
            Err(broadcast::error::RecvError::Closed) => std::future::pending::<()>().await,
        }
    }
}
