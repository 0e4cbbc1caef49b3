//! PID-file bookkeeping for the worker process.
//!
//! A crashed host can leave its worker running. The PID file lets the next
//! start find and stop that orphan before binding ports again.
//!
//! - Writes are atomic (temp file + rename)
//! - A recorded PID is only killed after it is verified to be a Java runtime,
//!   so a reused PID is never signalled

mod io;
mod sweep;
mod verify;

pub use io::{PidFileData, delete_pidfile, read_pidfile, write_pidfile};
pub use sweep::{SweepOutcome, sweep_orphan};
pub use verify::looks_like_java;
