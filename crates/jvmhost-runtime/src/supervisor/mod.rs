//! Worker process supervision.
//!
//! [`ProcessSupervisor`] owns the one worker process and its [`ProcessStatus`].
//! State moves `idle → starting → running → stopping → stopped`, with `error`
//! reachable from any state. Every transition is pushed to observers as a
//! [`SupervisorEvent::StatusChanged`] snapshot and onto a watch channel.
//!
//! A background exit watcher owns the child handle. When the worker dies
//! while `running` it drains the output readers, appends the crash dump to
//! the launch log and reports the exit as an event. Exits during `stopping`
//! are left to `stop()`.

mod error;
mod events;

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use jvmhost_core::{
    HostSettings, JavaVersion, ProcessState, ProcessStatus, ShutdownSettings, WorkerSettings,
};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

pub use error::SupervisorError;
pub use events::{SupervisorEvent, WorkerExit};

use crate::discovery::RuntimeResolver;
use crate::launcher::{LaunchedProcess, ProcessLauncher, WorkerOutput, build_launch_spec};
use crate::pidfile::{PidFileData, delete_pidfile, write_pidfile};
use crate::ports::PortPair;
use crate::termination::{StopReport, TerminationStrategy, escalate};

/// Broadcast channel capacity for supervisor events.
const CHANNEL_CAPACITY: usize = 64;

/// Upper bound on waiting for output readers after the process exits.
const READER_DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

/// Settings the supervisor needs for one worker.
#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    pub worker: WorkerSettings,
    pub min_version: JavaVersion,
    pub max_version: JavaVersion,
    pub shutdown: ShutdownSettings,
    /// Where to record the running worker's PID. `None` disables the file.
    pub pidfile: Option<PathBuf>,
}

impl SupervisorConfig {
    pub fn from_settings(settings: &HostSettings, pidfile: Option<PathBuf>) -> Self {
        Self {
            worker: settings.worker.clone(),
            min_version: settings.runtime.min_version.clone(),
            max_version: settings.runtime.max_version.clone(),
            shutdown: settings.shutdown.clone(),
            pidfile,
        }
    }
}

/// Clears the start latch on every exit path.
struct StartGuard<'a> {
    starting: &'a AtomicBool,
}

impl<'a> StartGuard<'a> {
    /// Take the latch, or `None` if another start holds it.
    fn acquire(starting: &'a AtomicBool) -> Option<Self> {
        starting
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| Self { starting })
    }
}

impl Drop for StartGuard<'_> {
    fn drop(&mut self) {
        self.starting.store(false, Ordering::SeqCst);
    }
}

/// The worker currently owned by the supervisor.
struct ActiveWorker {
    pid: u32,
    generation: u64,
    exited: Arc<AtomicBool>,
    watcher: JoinHandle<()>,
}

/// State shared with the exit watcher task.
struct Shared {
    status: watch::Sender<ProcessStatus>,
    events: broadcast::Sender<SupervisorEvent>,
    current: Mutex<Option<ActiveWorker>>,
    last_output: Mutex<Option<Arc<WorkerOutput>>>,
    pidfile: Option<PathBuf>,
}

impl Shared {
    fn emit(&self, event: SupervisorEvent) {
        if self.events.receiver_count() > 0 {
            debug!(?event, "Broadcasting supervisor event");
            let _ = self.events.send(event);
        }
    }

    fn transition(&self, change: impl FnOnce(&mut ProcessStatus)) -> ProcessStatus {
        self.status.send_modify(change);
        let snapshot = self.status.borrow().clone();
        debug!(state = %snapshot.state, pid = ?snapshot.pid, "Worker status changed");
        self.emit(SupervisorEvent::StatusChanged {
            status: snapshot.clone(),
        });
        snapshot
    }

    fn state(&self) -> ProcessState {
        self.status.borrow().state
    }

    fn remove_pidfile(&self) {
        if let Some(path) = &self.pidfile
            && let Err(e) = delete_pidfile(path)
        {
            debug!(path = %path.display(), error = %e, "Failed to delete PID file");
        }
    }

    /// Whether `generation` is still the registered worker. A `stop()` takes
    /// the worker out before signalling it.
    fn is_current(&self, generation: u64) -> bool {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|w| w.generation == generation)
    }

    /// Called by the exit watcher once the child is reaped and drained.
    fn handle_exit(&self, generation: u64, exit: WorkerExit, output: &WorkerOutput) {
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        let is_current = current.as_ref().is_some_and(|w| w.generation == generation);
        if !is_current || self.state() != ProcessState::Running {
            // A stop() owns this exit
            return;
        }
        current.take();
        drop(current);

        self.remove_pidfile();

        if exit.success {
            info!(pid = %exit.pid, "Worker exited");
            self.transition(ProcessStatus::mark_stopped);
            self.emit(SupervisorEvent::Exited { exit });
        } else {
            error!(
                pid = %exit.pid,
                exit = %exit.describe(),
                log = ?output.log_path(),
                "Worker crashed"
            );
            self.transition(|s| s.mark_error(format!("worker crashed ({})", exit.describe())));
            self.emit(SupervisorEvent::Crashed {
                exit,
                log_path: output.log_path().map(PathBuf::from),
                tail: output.tail(),
            });
        }
    }
}

/// Owns the worker process and its lifecycle.
pub struct ProcessSupervisor {
    shared: Arc<Shared>,
    resolver: Arc<dyn RuntimeResolver>,
    launcher: ProcessLauncher,
    strategy: Arc<dyn TerminationStrategy>,
    config: SupervisorConfig,
    starting: AtomicBool,
    generation: AtomicU64,
}

impl ProcessSupervisor {
    pub fn new(
        config: SupervisorConfig,
        resolver: Arc<dyn RuntimeResolver>,
        launcher: ProcessLauncher,
        strategy: Arc<dyn TerminationStrategy>,
    ) -> Self {
        let (status, _) = watch::channel(ProcessStatus::default());
        let (events, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            shared: Arc::new(Shared {
                status,
                events,
                current: Mutex::new(None),
                last_output: Mutex::new(None),
                pidfile: config.pidfile.clone(),
            }),
            resolver,
            launcher,
            strategy,
            config,
            starting: AtomicBool::new(false),
            generation: AtomicU64::new(0),
        }
    }

    /// Snapshot of the current status.
    pub fn status(&self) -> ProcessStatus {
        self.shared.status.borrow().clone()
    }

    /// Latest-value view of the status.
    pub fn watch_status(&self) -> watch::Receiver<ProcessStatus> {
        self.shared.status.subscribe()
    }

    /// Every lifecycle event from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<SupervisorEvent> {
        self.shared.events.subscribe()
    }

    /// Output captured from the most recent launch.
    pub fn last_output(&self) -> Option<Arc<WorkerOutput>> {
        self.shared
            .last_output
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub const fn strategy(&self) -> &Arc<dyn TerminationStrategy> {
        &self.strategy
    }

    /// Resolve a runtime and launch the worker on `ports`.
    ///
    /// Only one start may be in flight; a concurrent call fails with
    /// [`SupervisorError::StartInProgress`] without spawning anything.
    pub async fn start(&self, ports: PortPair) -> Result<ProcessStatus, SupervisorError> {
        let _guard = StartGuard::acquire(&self.starting).ok_or(SupervisorError::StartInProgress)?;

        let state = self.shared.state();
        if !state.can_start() {
            return Err(SupervisorError::InvalidState {
                operation: "start",
                state,
            });
        }

        self.shared.transition(|s| s.mark_starting(ports.primary));

        match self.spawn_worker(ports).await {
            Ok(launched) => Ok(self.adopt(launched, ports)),
            Err(e) => {
                warn!(error = %e, "Worker start failed");
                self.shared.transition(|s| s.mark_error(e.to_string()));
                Err(e)
            }
        }
    }

    async fn spawn_worker(&self, ports: PortPair) -> Result<LaunchedProcess, SupervisorError> {
        let runtime = self
            .resolver
            .resolve(&self.config.min_version, &self.config.max_version)
            .await?;
        let spec = build_launch_spec(&runtime, &self.config.worker, ports)?;
        Ok(self.launcher.launch(&spec)?)
    }

    /// Take ownership of a freshly spawned worker and mark it running.
    fn adopt(&self, launched: LaunchedProcess, ports: PortPair) -> ProcessStatus {
        let LaunchedProcess {
            pid,
            start_time,
            mut child,
            output,
            readers,
        } = launched;

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let exited = Arc::new(AtomicBool::new(false));

        *self
            .shared
            .last_output
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(output.clone());

        if let Some(path) = &self.shared.pidfile
            && let Err(e) = write_pidfile(
                path,
                PidFileData {
                    pid,
                    port: ports.primary,
                },
            )
        {
            warn!(path = %path.display(), error = %e, "Failed to write PID file");
        }

        // Hold the lock across spawn so the watcher cannot observe an exit
        // before the worker is registered.
        let mut current = self
            .shared
            .current
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let shared = self.shared.clone();
        let exited_flag = exited.clone();
        let watcher = tokio::spawn(async move {
            let status = child.wait().await;
            exited_flag.store(true, Ordering::SeqCst);

            for reader in readers {
                let _ = timeout(READER_DRAIN_TIMEOUT, reader).await;
            }

            let exit = match status {
                Ok(status) => WorkerExit {
                    pid,
                    code: status.code(),
                    success: status.success(),
                },
                Err(e) => {
                    warn!(pid = %pid, error = %e, "Failed to wait on worker");
                    WorkerExit {
                        pid,
                        code: None,
                        success: false,
                    }
                }
            };
            // Signal exits requested by stop() are not crashes
            if !exit.success && shared.is_current(generation) {
                output.write_crash_dump(&exit.describe());
            }
            debug!(pid = %pid, exit = %exit.describe(), "Worker process reaped");

            shared.handle_exit(generation, exit, &output);
        });

        *current = Some(ActiveWorker {
            pid,
            generation,
            exited,
            watcher,
        });

        let snapshot = self.shared.transition(|s| s.mark_running(pid, start_time));
        drop(current);

        info!(pid = %pid, port = %ports.primary, "Worker running");
        self.shared.emit(SupervisorEvent::Started {
            pid,
            port: ports.primary,
        });
        snapshot
    }

    /// Stop the worker with graceful → forced escalation.
    ///
    /// A no-op returning `None` when nothing is running. The supervisor ends
    /// in `stopped` even if the process could not be confirmed gone; the
    /// returned report says whether it was.
    pub async fn stop(&self) -> Result<Option<StopReport>, SupervisorError> {
        let worker = {
            let mut current = self
                .shared
                .current
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            match self.shared.state() {
                ProcessState::Running => {}
                ProcessState::Idle | ProcessState::Stopped | ProcessState::Error => {
                    return Ok(None);
                }
                state @ (ProcessState::Starting | ProcessState::Stopping) => {
                    return Err(SupervisorError::InvalidState {
                        operation: "stop",
                        state,
                    });
                }
            }
            let Some(worker) = current.take() else {
                return Ok(None);
            };
            self.shared.transition(ProcessStatus::mark_stopping);
            worker
        };

        let ActiveWorker {
            pid,
            exited,
            watcher,
            ..
        } = worker;
        info!(pid = %pid, strategy = self.strategy.name(), "Stopping worker");

        let report = escalate(
            self.strategy.as_ref(),
            pid,
            &self.config.shutdown,
            &move || exited.load(Ordering::SeqCst),
        )
        .await;

        if report.exited {
            // Let the watcher finish draining output
            let _ = timeout(self.config.shutdown.grace(), watcher).await;
        } else {
            warn!(
                pid = %pid,
                "Worker could not be confirmed stopped; marking stopped anyway"
            );
        }
        if report.escalated() {
            warn!(pid = %pid, "Graceful termination failed, worker was force killed");
        }

        self.shared.remove_pidfile();
        self.shared.transition(ProcessStatus::mark_stopped);
        self.shared.emit(SupervisorEvent::Stopped {
            pid,
            escalated: report.escalated(),
            confirmed: report.exited,
        });

        Ok(Some(report))
    }

    /// Stop, then start again on `ports`.
    ///
    /// If the stop could not confirm the old worker exited, no new worker is
    /// started and [`SupervisorError::StopFailed`] is returned.
    pub async fn restart(&self, ports: PortPair) -> Result<ProcessStatus, SupervisorError> {
        let previous = self.status().pid;
        if let Some(report) = self.stop().await?
            && !report.exited
        {
            return Err(SupervisorError::StopFailed {
                pid: previous.unwrap_or_default(),
            });
        }
        self.start(ports).await
    }
}
