use crate::job::JobKey;
use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Content of a freshly acquired lock, before a worker owns it.
pub const SENTINEL: &str = "preparing_to_start";

/// What a lock file currently says about its job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LockState {
    /// No lock file
    Absent,
    /// Claimed, worker not yet launched
    Sentinel,
    /// Owned by a worker process
    Pid(u32),
    /// Anything else, e.g. a truncated write
    Unrecognized(String),
}

impl LockState {
    /// Interpret lock file content.
    ///
    /// An empty file is a lock caught between creation and its first write,
    /// so it counts as the sentinel.
    pub fn parse(content: &str) -> Self {
        let line = content.trim();
        if line.is_empty() || line == SENTINEL {
            return LockState::Sentinel;
        }
        match line.parse::<u32>() {
            Ok(pid) if pid > 0 => LockState::Pid(pid),
            _ => LockState::Unrecognized(line.to_string()),
        }
    }
}

impl fmt::Display for LockState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LockState::Absent => f.write_str("absent"),
            LockState::Sentinel => f.write_str(SENTINEL),
            LockState::Pid(pid) => write!(f, "pid {}", pid),
            LockState::Unrecognized(raw) => write!(f, "unrecognized content {:?}", raw),
        }
    }
}

/// Proof that this caller created the lock for `key`.
///
/// Remembers the identity of the file it created, so a lock released and
/// claimed again by someone else is never mistaken for this one.
#[derive(Debug)]
pub struct LockHandle {
    pub(super) key: JobKey,
    pub(super) path: PathBuf,
    pub(super) dev: u64,
    pub(super) ino: u64,
}

impl LockHandle {
    pub fn key(&self) -> &JobKey {
        &self.key
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    pub(super) fn matches(&self, dev: u64, ino: u64) -> bool {
        self.dev == dev && self.ino == ino
    }
}

/// Result of trying to claim a job.
#[derive(Debug)]
pub enum AcquireOutcome {
    Acquired(LockHandle),
    AlreadyLocked,
}

/// Lock store failures. Contention is not an error; see [`AcquireOutcome`].
#[derive(Debug, Error)]
pub enum LockError {
    #[error("lock I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("lock for job {key} was removed before its owner was recorded")]
    Vanished { key: JobKey },

    #[error("lock for job {key} no longer holds the start sentinel ({found})")]
    NotSentinel { key: JobKey, found: LockState },
}
