use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Name of the lock file placed in a notes directory while it is renumbered.
pub const LOCK_FILE: &str = ".bext.lock";

/// Advisory lock on a notes directory.
///
/// Uses platform-native flock (Unix) so two processes never renumber the
/// same sequence at once.
pub struct DirLock {
    _file: File,
    path: PathBuf,
}

/// Error type for lock operations
#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error("could not create lock file at {path}: {source}")]
    CreateError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not acquire lock on {path}: another process is renumbering this directory")]
    Timeout { path: PathBuf },
}

impl DirLock {
    /// Acquire the lock for `dir`, waiting up to `timeout`.
    pub fn acquire(dir: &Path, timeout: Duration) -> Result<Self, LockError> {
        let lock_path = dir.join(LOCK_FILE);
        let deadline = Instant::now() + timeout;
        loop {
            let file = open_lock_file(&lock_path)?;
            // The previous holder unlinks the file on release, so a lock on
            // a stale inode does not count.
            if try_lock(&file).is_ok() && still_linked(&file, &lock_path) {
                tracing::debug!(path = %lock_path.display(), "directory locked");
                return Ok(DirLock {
                    _file: file,
                    path: lock_path,
                });
            }
            if Instant::now() >= deadline {
                return Err(LockError::Timeout { path: lock_path });
            }
            std::thread::sleep(Duration::from_millis(10));
        }
    }

    /// Acquire with default timeout (5 seconds)
    pub fn acquire_default(dir: &Path) -> Result<Self, LockError> {
        Self::acquire(dir, Duration::from_secs(5))
    }
}

impl Drop for DirLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

fn open_lock_file(path: &Path) -> Result<File, LockError> {
    OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(false)
        .open(path)
        .map_err(|e| LockError::CreateError {
            path: path.to_path_buf(),
            source: e,
        })
}

/// Try to acquire an exclusive flock on the file (non-blocking)
#[cfg(unix)]
fn try_lock(file: &File) -> Result<(), std::io::Error> {
    use std::os::unix::io::AsRawFd;
    let result = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX | libc::LOCK_NB) };
    if result == 0 {
        Ok(())
    } else {
        Err(std::io::Error::last_os_error())
    }
}

#[cfg(not(unix))]
fn try_lock(_file: &File) -> Result<(), std::io::Error> {
    Ok(())
}

#[cfg(unix)]
fn still_linked(file: &File, path: &Path) -> bool {
    use std::os::unix::fs::MetadataExt;
    match (file.metadata(), fs::metadata(path)) {
        (Ok(held), Ok(on_disk)) => held.dev() == on_disk.dev() && held.ino() == on_disk.ino(),
        _ => false,
    }
}

#[cfg(not(unix))]
fn still_linked(_file: &File, _path: &Path) -> bool {
    true
}
