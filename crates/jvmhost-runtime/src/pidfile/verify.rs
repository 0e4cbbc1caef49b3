//! Identity check before killing a recorded PID.

use std::path::Path;

use sysinfo::{Pid, ProcessesToUpdate, System};

/// Whether `pid` is a live process whose name or executable looks like a Java
/// runtime. Returns `false` when the process cannot be inspected.
pub fn looks_like_java(pid: u32) -> bool {
    let pid = Pid::from_u32(pid);
    let mut system = System::new();
    system.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);

    let Some(process) = system.process(pid) else {
        return false;
    };

    let name_matches = process
        .name()
        .to_str()
        .is_some_and(|name| name.to_ascii_lowercase().contains("java"));
    let exe_matches = process
        .exe()
        .and_then(Path::file_stem)
        .and_then(|stem| stem.to_str())
        .is_some_and(|stem| stem.eq_ignore_ascii_case("java"));

    name_matches || exe_matches
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_self_is_not_java() {
        assert!(!looks_like_java(std::process::id()));
    }

    #[test]
    fn test_missing_pid_is_not_java() {
        assert!(!looks_like_java(u32::MAX - 1));
    }
}
