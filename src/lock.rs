//! Single-instance guard for generation runs.
//!
//! The lock is a file created with create-new semantics, so two runs against
//! the same content tree cannot both succeed. [`GenerationLock`] removes the
//! file when dropped, on success and error paths alike.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

pub const LOCK_FILE: &str = "gen.lock";

#[derive(Error, Debug)]
pub enum LockError {
    #[error("another generation holds the lock {}", .0.display())]
    Held(PathBuf),
    #[error("cannot create lock {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug)]
pub struct GenerationLock {
    path: PathBuf,
}

impl GenerationLock {
    /// Take the lock in `dir`, failing with [`LockError::Held`] if it exists.
    pub fn acquire(dir: &Path) -> Result<Self, LockError> {
        let path = dir.join(LOCK_FILE);
        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                return Err(LockError::Held(path));
            }
            Err(source) => return Err(LockError::Io { path, source }),
        };
        record_owner(&mut file, &path);
        debug!(path = %path.display(), "lock acquired");
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Write our pid into the lock file; a failure is logged, not returned.
fn record_owner(file: &mut impl Write, path: &Path) -> bool {
    match writeln!(file, "{}", std::process::id()) {
        Ok(()) => true,
        Err(e) => {
            warn!(path = %path.display(), "failed to record pid in lock: {e}");
            false
        }
    }
}

impl Drop for GenerationLock {
    fn drop(&mut self) {
        match fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "lock released"),
            Err(e) => warn!(path = %self.path.display(), "failed to remove lock: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    struct FullDisk;

    impl Write for FullDisk {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::other("no space left on device"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn pid_write_failure_is_reported_not_fatal() {
        let path = Path::new("generating/lock");
        let mut recorded = Vec::new();
        assert!(record_owner(&mut recorded, path));
        assert_eq!(
            String::from_utf8(recorded).unwrap(),
            format!("{}\n", std::process::id())
        );
        assert!(!record_owner(&mut FullDisk, path));
    }

    #[test]
    fn lock_removed_on_drop() {
        let tmp = TempDir::new().unwrap();
        let lock = GenerationLock::acquire(tmp.path()).unwrap();
        assert!(lock.path().exists());
        drop(lock);
        assert!(!tmp.path().join(LOCK_FILE).exists());
    }

    #[test]
    fn second_acquire_is_held_and_leaves_lock() {
        let tmp = TempDir::new().unwrap();
        let _first = GenerationLock::acquire(tmp.path()).unwrap();
        let second = GenerationLock::acquire(tmp.path());
        assert!(matches!(second, Err(LockError::Held(_))));
        assert!(tmp.path().join(LOCK_FILE).exists());
    }

    #[test]
    fn missing_directory_is_io_error() {
        let tmp = TempDir::new().unwrap();
        let result = GenerationLock::acquire(&tmp.path().join("absent"));
        assert!(matches!(result, Err(LockError::Io { .. })));
    }
}
