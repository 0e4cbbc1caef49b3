//! Depth-limited scan of installation roots for `bin/java`.
//!
//! The scan uses an explicit work stack and a visited set keyed by canonical
//! path, so symlink cycles and deep trees cannot blow up the search.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

/// Platform file name of the runtime launcher.
pub const JAVA_EXECUTABLE: &str = if cfg!(windows) { "java.exe" } else { "java" };

/// `<home>/bin/java`
pub fn java_in_home(home: &Path) -> PathBuf {
    home.join("bin").join(JAVA_EXECUTABLE)
}

/// Whether `path` is a regular file the current user may execute.
pub fn is_executable(path: &Path) -> bool {
    let Ok(metadata) = fs::metadata(path) else {
        return false;
    };
    if !metadata.is_file() {
        return false;
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        metadata.permissions().mode() & 0o111 != 0
    }

    #[cfg(not(unix))]
    {
        true
    }
}

/// Collect runtime executables below `roots`, descending at most `max_depth`
/// directories below each root. A directory that contains `bin/java` is
/// treated as a runtime home and not descended into.
///
/// Results keep root order; within a root, sibling directories are visited in
/// reverse name order so that higher-numbered installs come first.
pub fn find_runtime_executables(roots: &[PathBuf], max_depth: usize) -> Vec<PathBuf> {
    let mut visited: HashSet<PathBuf> = HashSet::new();
    let mut found = Vec::new();

    for root in roots {
        if !root.is_dir() {
            continue;
        }

        let mut stack: Vec<(PathBuf, usize)> = vec![(root.clone(), 0)];
        while let Some((dir, depth)) = stack.pop() {
            let key = fs::canonicalize(&dir).unwrap_or_else(|_| dir.clone());
            if !visited.insert(key) {
                continue;
            }

            // macOS bundles keep the home under Contents/Home
            let homes = [dir.clone(), dir.join("Contents").join("Home")];
            if let Some(exe) = homes
                .iter()
                .map(|home| java_in_home(home))
                .find(|exe| is_executable(exe))
            {
                debug!(path = %exe.display(), "Found runtime executable");
                found.push(exe);
                continue;
            }

            if depth >= max_depth {
                continue;
            }

            let Ok(entries) = fs::read_dir(&dir) else {
                continue;
            };
            let mut children: Vec<PathBuf> = entries
                .filter_map(Result::ok)
                .map(|entry| entry.path())
                .filter(|path| path.is_dir())
                .collect();
            // Sorted ascending, so popping from the stack visits the highest name first
            children.sort();
            stack.extend(children.into_iter().map(|child| (child, depth + 1)));
        }
    }

    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn fake_home(home: &Path) -> PathBuf {
        let exe = java_in_home(home);
        fs::create_dir_all(exe.parent().unwrap()).unwrap();
        fs::write(&exe, "#!/bin/sh\n").unwrap();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&exe, fs::Permissions::from_mode(0o755)).unwrap();
        }
        exe
    }

    #[test]
    fn test_finds_homes_in_root() {
        let dir = tempdir().unwrap();
        let a = fake_home(&dir.path().join("jdk-17"));
        let b = fake_home(&dir.path().join("jdk-21"));

        let found = find_runtime_executables(&[dir.path().to_path_buf()], 2);
        assert_eq!(found, vec![b, a]);
    }

    #[test]
    fn test_respects_depth_limit() {
        let dir = tempdir().unwrap();
        let deep = dir.path().join("a").join("b").join("c");
        fake_home(&deep);

        assert!(find_runtime_executables(&[dir.path().to_path_buf()], 2).is_empty());
        assert_eq!(find_runtime_executables(&[dir.path().to_path_buf()], 3).len(), 1);
    }

    #[test]
    fn test_missing_root_is_skipped() {
        let dir = tempdir().unwrap();
        let found = find_runtime_executables(&[dir.path().join("absent")], 4);
        assert!(found.is_empty());
    }

    #[test]
    fn test_does_not_descend_into_runtime_home() {
        let dir = tempdir().unwrap();
        let home = dir.path().join("jdk");
        fake_home(&home);
        // A nested JRE inside a JDK home is not reported separately
        fake_home(&home.join("jre"));

        assert_eq!(find_runtime_executables(&[dir.path().to_path_buf()], 4).len(), 1);
    }

    #[test]
    fn test_macos_bundle_layout() {
        let dir = tempdir().unwrap();
        let bundle = dir.path().join("temurin-21.jdk");
        let exe = fake_home(&bundle.join("Contents").join("Home"));

        assert_eq!(
            find_runtime_executables(&[dir.path().to_path_buf()], 1),
            vec![exe]
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_cycle_terminates() {
        let dir = tempdir().unwrap();
        let loop_dir = dir.path().join("loop");
        fs::create_dir_all(&loop_dir).unwrap();
        std::os::unix::fs::symlink(dir.path(), loop_dir.join("back")).unwrap();
        fake_home(&dir.path().join("jdk-17"));

        let found = find_runtime_executables(&[dir.path().to_path_buf()], 50);
        assert_eq!(found.len(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_non_executable_file_is_ignored() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let exe = fake_home(&dir.path().join("jdk"));
        fs::set_permissions(&exe, fs::Permissions::from_mode(0o644)).unwrap();

        assert!(!is_executable(&exe));
        assert!(find_runtime_executables(&[dir.path().to_path_buf()], 2).is_empty());
    }
}
