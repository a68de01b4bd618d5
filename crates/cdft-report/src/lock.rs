//! Host-wide named lock.
//!
//! Every worker process on the machine writes through the same lock file,
//! `<lock_dir>/<name>.lock`. [`HostLock::acquire`] blocks on an exclusive
//! `File::lock` and returns a guard; the lock is released when the guard is
//! dropped, and by the OS if the holder dies.
//!
//! The lock file is shared by every user on the host and may be owned by
//! someone else; a read-only handle is enough to take the lock.
//!
//! The lock covers report files only. The in-memory failure list inside a
//! worker has its own mutex.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io;

use camino::{Utf8Path, Utf8PathBuf};
use tracing::{debug, warn};

use crate::error::ReportError;

/// A named lock shared by every process on the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostLock {
    path: Utf8PathBuf,
}

impl HostLock {
    /// Creates a lock named `name` inside `dir`.
    #[must_use]
    pub fn new(dir: &Utf8Path, name: &str) -> Self {
        Self {
            path: dir.join(format!("{name}.lock")),
        }
    }

    /// Creates a lock named `name` in the system temp directory.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::NonUtf8Path`] if the temp directory path is not UTF-8.
    pub fn in_temp_dir(name: &str) -> Result<Self, ReportError> {
        let temp = Utf8PathBuf::from_path_buf(std::env::temp_dir())
            .map_err(ReportError::NonUtf8Path)?;
        Ok(Self::new(&temp, name))
    }

    /// Returns the path of the lock file.
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Blocks until the lock is held exclusively by this caller.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Lock`] if the lock file cannot be opened or locked.
    pub fn acquire(&self) -> Result<HostLockGuard, ReportError> {
        let file = open_lock_file(&self.path).map_err(|e| ReportError::lock(&self.path, e))?;

        file.lock().map_err(|e| ReportError::lock(&self.path, e))?;
        debug!(lock = %self.path, "Acquired report lock");

        Ok(HostLockGuard {
            file,
            path: self.path.clone(),
        })
    }
}

/// Opens (creating if needed) the lock file.
///
/// The file may belong to another user on the host. Locking only needs a
/// readable handle, so a file that cannot be opened for writing is opened
/// read-only instead.
fn open_lock_file(path: &Utf8Path) -> io::Result<File> {
    match OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(path)
    {
        Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
            debug!(lock = %path, "Lock file is not writable, opening read-only");
            File::open(path)
        }
        result => result,
    }
}

/// RAII guard for a held [`HostLock`].
pub struct HostLockGuard {
    /// The lock file (held open for the lifetime of the guard).
    file: File,
    /// Lock path for diagnostics.
    path: Utf8PathBuf,
}

impl fmt::Debug for HostLockGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostLockGuard")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl Drop for HostLockGuard {
    fn drop(&mut self) {
        if let Err(e) = self.file.unlock() {
            // Closing the file below releases it anyway
            warn!(lock = %self.path, error = %e, "Failed to release report lock");
        }
        debug!(lock = %self.path, "Released report lock");
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    use tempfile::TempDir;

    use super::*;

    fn lock_in(temp: &TempDir) -> HostLock {
        let dir = Utf8Path::from_path(temp.path()).unwrap();
        HostLock::new(dir, "TEST_MUTEX")
    }

    #[test]
    fn test_lock_path() {
        let lock = HostLock::new(Utf8Path::new("/tmp"), "INVALID_CDF_LOG_FILE_MUTEX");
        assert_eq!(lock.path().as_str(), "/tmp/INVALID_CDF_LOG_FILE_MUTEX.lock");
    }

    #[test]
    fn test_acquire_and_reacquire() {
        let temp = TempDir::new().unwrap();
        let lock = lock_in(&temp);

        let guard = lock.acquire().unwrap();
        assert!(lock.path().exists());
        drop(guard);

        // Released on drop, so a second acquire does not block
        let _again = lock.acquire().unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn test_read_only_lock_file() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let lock = lock_in(&temp);
        fs::write(lock.path(), b"").unwrap();
        fs::set_permissions(lock.path(), fs::Permissions::from_mode(0o444)).unwrap();

        let guard = lock.acquire().unwrap();
        assert_eq!(guard.path.as_path(), lock.path());
        drop(guard);

        let _again = lock.acquire().unwrap();
    }

    #[test]
    fn test_mutual_exclusion_across_threads() {
        let temp = TempDir::new().unwrap();
        let lock = lock_in(&temp);
        let inside = Arc::new(AtomicUsize::new(0));
        let max_inside = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let lock = lock.clone();
                let inside = Arc::clone(&inside);
                let max_inside = Arc::clone(&max_inside);
                thread::spawn(move || {
                    let _guard = lock.acquire().unwrap();
                    let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                    max_inside.fetch_max(now, Ordering::SeqCst);
                    thread::sleep(Duration::from_millis(5));
                    inside.fetch_sub(1, Ordering::SeqCst);
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(max_inside.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_missing_lock_dir() {
        let lock = HostLock::new(Utf8Path::new("/nonexistent/locks"), "TEST_MUTEX");
        let err = lock.acquire().unwrap_err();
        assert!(matches!(err, ReportError::Lock { .. }));
    }
}
