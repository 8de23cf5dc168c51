//! Advisory whole-file locks scoped to a guard.
//!
//! Locks are `flock(2)` locks, so they belong to the open file description:
//! two handles opened separately on the same path contend even inside one
//! process. Dropping the guard unlocks; closing the file would as well.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::error::{AcctError, Result};

/// Interval between non-blocking attempts when a timeout is configured.
const LOCK_POLL: Duration = Duration::from_millis(10);

/// Kind of lock to take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockMode {
    /// Many readers at once, excluded by a writer.
    Shared,
    /// One holder, excluding readers and writers.
    Exclusive,
}

/// Held lock on an open file. Released on drop.
#[derive(Debug)]
pub struct FileLock<'a> {
    file: &'a File,
    path: PathBuf,
    mode: LockMode,
}

impl<'a> FileLock<'a> {
    /// Lock `file` (opened from `path`) in `mode`.
    ///
    /// With `timeout == None` this blocks until the lock is granted. With a
    /// timeout, a non-blocking lock is retried until the deadline passes and
    /// then fails with [`AcctError::LockTimeout`].
    pub fn acquire(
        file: &'a File,
        path: &Path,
        mode: LockMode,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let deadline = timeout.map(|t| Instant::now() + t);
        loop {
            match sys::try_lock(file, mode, deadline.is_none()) {
                Ok(true) => break,
                Ok(false) => {
                    if deadline.is_some_and(|d| Instant::now() >= d) {
                        return Err(AcctError::LockTimeout {
                            path: path.to_path_buf(),
                        });
                    }
                    std::thread::sleep(LOCK_POLL);
                }
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(source) => {
                    return Err(AcctError::LockUnavailable {
                        path: path.to_path_buf(),
                        source,
                    });
                }
            }
        }
        log::trace!("locked {} ({:?})", path.display(), mode);
        Ok(Self {
            file,
            path: path.to_path_buf(),
            mode,
        })
    }

    pub fn mode(&self) -> LockMode {
        self.mode
    }
}

impl Drop for FileLock<'_> {
    fn drop(&mut self) {
        if let Err(e) = sys::unlock(self.file) {
            log::warn!("failed to unlock {}: {e}", self.path.display());
        }
    }
}

#[cfg(unix)]
mod sys {
    use std::fs::File;
    use std::io;
    use std::os::fd::AsRawFd;

    use super::LockMode;

    /// `Ok(false)` means the lock is held elsewhere (non-blocking only).
    pub(super) fn try_lock(file: &File, mode: LockMode, blocking: bool) -> io::Result<bool> {
        let mut op = match mode {
            LockMode::Shared => libc::LOCK_SH,
            LockMode::Exclusive => libc::LOCK_EX,
        };
        if !blocking {
            op |= libc::LOCK_NB;
        }
        // SAFETY: the descriptor is owned by `file` and stays open for the call.
        let rc = unsafe { libc::flock(file.as_raw_fd(), op) };
        if rc == 0 {
            return Ok(true);
        }
        let err = io::Error::last_os_error();
        if !blocking && err.raw_os_error() == Some(libc::EWOULDBLOCK) {
            return Ok(false);
        }
        Err(err)
    }

    pub(super) fn unlock(file: &File) -> io::Result<()> {
        // SAFETY: as above.
        let rc = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_UN) };
        if rc == 0 {
            Ok(())
        } else {
            Err(io::Error::last_os_error())
        }
    }
}

#[cfg(not(unix))]
mod sys {
    use std::fs::File;
    use std::io;

    use super::LockMode;

    pub(super) fn try_lock(_file: &File, _mode: LockMode, _blocking: bool) -> io::Result<bool> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "file locking requires a unix platform",
        ))
    }

    pub(super) fn unlock(_file: &File) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::fs::OpenOptions;

    fn open(path: &Path) -> File {
        OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .unwrap()
    }

    #[test]
    fn test_shared_locks_coexist() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("rec.dat");
        let (a, b) = (open(&path), open(&path));

        let _ga = FileLock::acquire(&a, &path, LockMode::Shared, None).unwrap();
        let gb = FileLock::acquire(&b, &path, LockMode::Shared, Some(Duration::from_millis(50)));
        assert!(gb.is_ok());
    }

    #[test]
    fn test_exclusive_blocks_until_timeout() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("rec.dat");
        let (a, b) = (open(&path), open(&path));

        let _ga = FileLock::acquire(&a, &path, LockMode::Exclusive, None).unwrap();
        let err = FileLock::acquire(&b, &path, LockMode::Shared, Some(Duration::from_millis(30)))
            .unwrap_err();
        assert!(matches!(err, AcctError::LockTimeout { .. }));
    }

    #[test]
    fn test_drop_releases_lock() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("rec.dat");
        let (a, b) = (open(&path), open(&path));

        {
            let guard = FileLock::acquire(&a, &path, LockMode::Exclusive, None).unwrap();
            assert_eq!(guard.mode(), LockMode::Exclusive);
        }
        let gb = FileLock::acquire(&b, &path, LockMode::Exclusive, Some(Duration::from_millis(50)));
        assert!(gb.is_ok());
    }
}
