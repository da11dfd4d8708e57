//! Job lifecycle: claiming, launching, stopping and finishing seed jobs.
//!
//! [`JobSupervisor`] is the orchestrating side. It is stateless; every
//! decision comes from the lock file and the process table, so any number
//! of supervisors may serve requests for the same cache concurrently.
//! The worker side lives in [`run_worker`].
//!
//! A `stop` can land at any point of a `seed`. The supervisor re-checks
//! that it still holds its lock right before launching the worker, and only
//! records the worker's pid in a lock that still holds the sentinel. If the
//! lock is gone by then and the worker is still running, the worker is
//! terminated and the seed reports `cancelled`; a worker that already
//! finished counts as started. Workers wait for their pid to appear in the
//! lock before doing any work, and every release compares the lock content
//! first, so neither side removes a lock it does not own.

mod engine;
mod error;
mod outcome;
mod worker;

pub use engine::{CommandEngine, SeedEngine, OUTPUT_ENV};
pub use error::{SupervisorError, WorkerError};
pub use outcome::{SeedOutcome, StopOutcome};
pub use worker::{finalize_artifact, run_worker, spec_from_env};

use crate::job::{backup_millis, rename_aside, JobKey, JobSpec, JobSpecBuilder};
use crate::lock::{AcquireOutcome, LockError, LockHandle, LockState, LockStore};
use crate::process::{is_alive, terminate_tree, LaunchedWorker, WorkerLauncher};
use crate::progress::ProgressLog;
use crate::tileset::Tileset;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Default time a stopped worker gets to exit before SIGKILL.
pub const DEFAULT_STOP_GRACE: Duration = Duration::from_secs(5);

/// Starts and stops seed jobs.
#[derive(Debug, Clone)]
pub struct JobSupervisor {
    locks: LockStore,
    builder: JobSpecBuilder,
    launcher: WorkerLauncher,
    stop_grace: Duration,
}

impl JobSupervisor {
    pub fn new(locks: LockStore, builder: JobSpecBuilder, launcher: WorkerLauncher) -> Self {
        Self {
            locks,
            builder,
            launcher,
            stop_grace: DEFAULT_STOP_GRACE,
        }
    }

    pub fn with_stop_grace(mut self, grace: Duration) -> Self {
        self.stop_grace = grace;
        self
    }

    /// Start seeding `tileset` unless a job for it is already claimed.
    ///
    /// Returns once the worker is launched; the job itself runs detached.
    pub fn seed(&self, tileset: &Tileset) -> Result<SeedOutcome, SupervisorError> {
        let key = &tileset.id;
        let handle = match self.locks.acquire(key)? {
            AcquireOutcome::Acquired(handle) => handle,
            AcquireOutcome::AlreadyLocked => {
                info!(key = %key, "Seed already started");
                return Ok(SeedOutcome::AlreadyStarted);
            }
        };

        let spec = match self.builder.build(tileset) {
            Ok(spec) => spec,
            Err(e) => {
                warn!(key = %key, error = %e, "Unable to start seed");
                self.locks.release_held(&handle)?;
                return Ok(SeedOutcome::UnableToStart {
                    error: e.to_string(),
                });
            }
        };

        match self.launch(&handle, &spec) {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                if let Err(release_err) = self.locks.release_held(&handle) {
                    warn!(key = %key, error = %release_err, "Lock not released");
                }
                Err(e)
            }
        }
    }

    fn launch(&self, handle: &LockHandle, spec: &JobSpec) -> Result<SeedOutcome, SupervisorError> {
        let millis = backup_millis();
        for path in [&spec.paths.generating, &spec.paths.progress_log] {
            rename_aside(path, millis).map_err(|source| io_error(path, source))?;
        }

        let log = ProgressLog::new(&spec.paths.progress_log);
        let writer = log
            .open()
            .map_err(|source| io_error(log.path(), source))?;
        let stdout = writer
            .try_clone_file()
            .map_err(|source| io_error(log.path(), source))?;
        let stderr = writer.into_file();
        let job_json = serde_json::to_string(spec)?;

        if !self.locks.is_held(handle)? || self.locks.read(handle.key())? != LockState::Sentinel {
            info!(key = %spec.key, "Seed cancelled before launch");
            return Ok(SeedOutcome::Cancelled);
        }

        let mut worker = self.launcher.launch(&job_json, stdout, stderr)?;
        self.hand_over(handle, &mut worker)
    }

    /// Record `worker` as the owner of the lock `handle` created.
    fn hand_over(
        &self,
        handle: &LockHandle,
        worker: &mut LaunchedWorker,
    ) -> Result<SeedOutcome, SupervisorError> {
        let key = handle.key();
        let pid = worker.pid();
        match self.locks.set_owner(handle, pid) {
            Ok(()) => {
                info!(key = %key, pid, "Seed started");
                Ok(SeedOutcome::Started)
            }
            Err(LockError::Vanished { .. }) | Err(LockError::NotSentinel { .. }) => {
                if worker.has_exited()? {
                    info!(key = %key, pid, "Worker finished before its pid was recorded");
                    return Ok(SeedOutcome::Started);
                }
                self.abort_worker(key, worker);
                Ok(SeedOutcome::Cancelled)
            }
            Err(e) => {
                self.abort_worker(key, worker);
                Err(e.into())
            }
        }
    }

    fn abort_worker(&self, key: &JobKey, worker: &LaunchedWorker) {
        let pid = worker.pid();
        info!(key = %key, pid, "Lock released during start, terminating worker");
        if let Err(e) = terminate_tree(pid, self.stop_grace) {
            warn!(key = %key, pid, error = %e, "Failed to terminate worker");
        }
    }

    /// Stop the job for `key`, whatever state it is in.
    ///
    /// A live worker and all of its descendants are terminated before the
    /// lock is released. Stale locks are cleaned up.
    pub fn stop(&self, key: &JobKey) -> Result<StopOutcome, SupervisorError> {
        let mut state = self.locks.read(key)?;
        loop {
            let outcome = match &state {
                LockState::Absent => return Ok(StopOutcome::NotInProgress),
                LockState::Sentinel => StopOutcome::StartCancelled,
                LockState::Pid(pid) if is_alive(*pid) => {
                    let killed = terminate_tree(*pid, self.stop_grace)?;
                    info!(
                        key = %key,
                        pid,
                        signalled = killed.signalled.len(),
                        forced = killed.forced.len(),
                        "Worker stopped"
                    );
                    StopOutcome::Stopped
                }
                LockState::Pid(pid) => {
                    warn!(key = %key, pid, "Lock held by a worker that is gone");
                    StopOutcome::CleanedUp
                }
                LockState::Unrecognized(content) => {
                    warn!(key = %key, content = %content, "Lock content unrecognized");
                    StopOutcome::CleanedUp
                }
            };

            if self.locks.release_if(key, &state)? {
                return Ok(outcome);
            }

            // A seed may have recorded its worker after the sentinel was read.
            match self.locks.read(key)? {
                next @ LockState::Pid(_) if state == LockState::Sentinel => state = next,
                next => {
                    debug!(key = %key, found = %next, "Lock changed during stop, left in place");
                    return Ok(outcome);
                }
            }
        }
    }
}

fn io_error(path: &Path, source: std::io::Error) -> SupervisorError {
    SupervisorError::Io {
        path: path.to_path_buf(),
        source,
    }
}

#[cfg(test)]
mod tests;
