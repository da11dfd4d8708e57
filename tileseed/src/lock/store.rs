use super::{AcquireOutcome, LockError, LockHandle, LockState, SENTINEL};
use crate::job::{lock_path, JobKey};
use std::fs::{self, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

const OWNER_POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Per-job exclusive locks stored as files in one directory.
///
/// Creation is atomic (`O_CREAT | O_EXCL`), so among any number of
/// concurrent [`acquire`](Self::acquire) calls for the same key exactly one
/// succeeds until the lock is released.
#[derive(Debug, Clone)]
pub struct LockStore {
    directory: PathBuf,
}

impl LockStore {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn lock_path(&self, key: &JobKey) -> PathBuf {
        lock_path(&self.directory, key)
    }

    /// Claim the job, leaving the sentinel in the lock.
    pub fn acquire(&self, key: &JobKey) -> Result<AcquireOutcome, LockError> {
        let path = self.lock_path(key);
        fs::create_dir_all(&self.directory).map_err(|source| LockError::Io {
            path: self.directory.clone(),
            source,
        })?;

        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                debug!(key = %key, "Lock already held");
                return Ok(AcquireOutcome::AlreadyLocked);
            }
            Err(source) => return Err(LockError::Io { path, source }),
        };

        if let Err(source) = writeln!(file, "{}", SENTINEL) {
            // The lock exists but is useless; give it back.
            let _ = fs::remove_file(&path);
            return Err(LockError::Io { path, source });
        }

        let metadata = file.metadata().map_err(|source| LockError::Io {
            path: path.clone(),
            source,
        })?;

        debug!(key = %key, path = %path.display(), "Lock acquired");
        Ok(AcquireOutcome::Acquired(LockHandle {
            key: key.clone(),
            path,
            dev: metadata.dev(),
            ino: metadata.ino(),
        }))
    }

    /// Record the worker pid in a lock that still holds the sentinel.
    ///
    /// Never recreates a lock that was released in the meantime, and never
    /// writes into a lock that was claimed again by another caller.
    pub fn set_owner(&self, handle: &LockHandle, pid: u32) -> Result<(), LockError> {
        let io_err = |source| LockError::Io {
            path: handle.path.clone(),
            source,
        };

        let mut file = match OpenOptions::new().read(true).write(true).open(&handle.path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(LockError::Vanished {
                    key: handle.key.clone(),
                })
            }
            Err(source) => return Err(io_err(source)),
        };

        let metadata = file.metadata().map_err(io_err)?;
        if !handle.matches(metadata.dev(), metadata.ino()) {
            return Err(LockError::Vanished {
                key: handle.key.clone(),
            });
        }

        let mut content = String::new();
        file.read_to_string(&mut content).map_err(io_err)?;
        let found = LockState::parse(&content);
        if found != LockState::Sentinel {
            return Err(LockError::NotSentinel {
                key: handle.key.clone(),
                found,
            });
        }

        file.set_len(0).map_err(io_err)?;
        file.seek(SeekFrom::Start(0)).map_err(io_err)?;
        writeln!(file, "{}", pid).map_err(io_err)?;
        debug!(key = %handle.key, pid, "Lock owner recorded");
        Ok(())
    }

    /// Whether the lock file is still the one `handle` created.
    pub fn is_held(&self, handle: &LockHandle) -> Result<bool, LockError> {
        match fs::metadata(&handle.path) {
            Ok(metadata) => Ok(handle.matches(metadata.dev(), metadata.ino())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(LockError::Io {
                path: handle.path.clone(),
                source,
            }),
        }
    }

    /// Current lock state. Never modifies the lock.
    pub fn read(&self, key: &JobKey) -> Result<LockState, LockError> {
        let path = self.lock_path(key);
        match fs::read_to_string(&path) {
            Ok(content) => Ok(LockState::parse(&content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(LockState::Absent),
            Err(source) => Err(LockError::Io { path, source }),
        }
    }

    /// Remove the lock. Releasing an absent lock is not an error.
    pub fn release(&self, key: &JobKey) -> Result<(), LockError> {
        self.remove(key).map(|_| ())
    }

    /// Remove the lock only while it still says `expected`.
    ///
    /// Returns whether this call removed it. A lock that moved on to another
    /// state, e.g. a sentinel that became a pid, is left in place.
    pub fn release_if(&self, key: &JobKey, expected: &LockState) -> Result<bool, LockError> {
        let found = self.read(key)?;
        if &found != expected {
            debug!(key = %key, expected = %expected, found = %found, "Lock changed, not released");
            return Ok(false);
        }
        self.remove(key)
    }

    /// Remove the lock only while it is still the file `handle` created.
    pub fn release_held(&self, handle: &LockHandle) -> Result<bool, LockError> {
        if !self.is_held(handle)? {
            return Ok(false);
        }
        self.remove(&handle.key)
    }

    /// Wait until the lock names `pid` as its owner.
    ///
    /// Returns `false` as soon as the lock is gone or names anything other
    /// than the sentinel or `pid`, and when `timeout` passes first.
    pub fn wait_for_owner(
        &self,
        key: &JobKey,
        pid: u32,
        timeout: Duration,
    ) -> Result<bool, LockError> {
        let deadline = Instant::now() + timeout;
        loop {
            match self.read(key)? {
                LockState::Pid(owner) if owner == pid => return Ok(true),
                LockState::Sentinel if Instant::now() < deadline => {
                    thread::sleep(OWNER_POLL_INTERVAL)
                }
                state => {
                    debug!(key = %key, pid, state = %state, "Lock not handed over");
                    return Ok(false);
                }
            }
        }
    }

    fn remove(&self, key: &JobKey) -> Result<bool, LockError> {
        let path = self.lock_path(key);
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!(key = %key, "Lock released");
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(source) => {
                warn!(key = %key, error = %source, "Failed to release lock");
                Err(LockError::Io { path, source })
            }
        }
    }
}
