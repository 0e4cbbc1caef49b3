//! Process control for the jvmhost worker.
//!
//! Components, leaves first: runtime discovery, port allocation, termination
//! strategies, the process launcher, the supervisor, the worker HTTP client
//! and the bootstrap orchestrator that sequences them.
#![deny(unsafe_code)]

pub mod bootstrap;
pub mod discovery;
pub mod health;
pub mod launcher;
pub mod pidfile;
pub mod ports;
pub mod supervisor;
pub mod termination;

pub use bootstrap::{BootstrapConfig, BootstrapError, BootstrapOrchestrator};
pub use discovery::{
    CommandProbe, DiscoveryConfig, DiscoveryError, RuntimeDiscovery, RuntimeProbe,
    RuntimeResolver,
};
pub use health::{ClientError, RetryPolicy, WorkerClient};
pub use launcher::{LaunchError, ProcessLauncher, WorkerOutput, build_launch_spec};
pub use ports::{PortError, PortPair, allocate_port_pair, find_available_port};
pub use supervisor::{
    ProcessSupervisor, SupervisorConfig, SupervisorError, SupervisorEvent, WorkerExit,
};
pub use termination::{StopReport, TerminationStrategy, platform_strategy};
