//! Read-only job status.
//!
//! Status is derived entirely from the filesystem and the process table:
//! the artifact, the lock, whether the lock's pid is alive and the tail of
//! the progress log. Nothing is modified, so status may be polled freely
//! while jobs start and stop.

mod artifact;
mod snapshot;

pub use artifact::ArtifactMetadata;
pub use snapshot::{ArtifactState, CurrentStatus, JobState, PendingStatus, StatusSnapshot};

use crate::job::{ConfigurationError, JobSpecBuilder};
use crate::lock::{LockError, LockState, LockStore};
use crate::process::is_alive;
use crate::progress::ProgressLog;
use crate::tileset::Tileset;
use std::io;
use std::path::PathBuf;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum StatusError {
    #[error(transparent)]
    Lock(#[from] LockError),

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error("failed to inspect {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Reports tileset status without touching any job state.
#[derive(Debug, Clone)]
pub struct StatusReporter {
    locks: LockStore,
    builder: JobSpecBuilder,
}

impl StatusReporter {
    pub fn new(locks: LockStore, builder: JobSpecBuilder) -> Self {
        Self { locks, builder }
    }

    pub fn status(&self, tileset: &Tileset) -> Result<StatusSnapshot, StatusError> {
        let paths = self.builder.paths_for(tileset)?;
        let stat = |path: &PathBuf| {
            ArtifactMetadata::stat(path).map_err(|source| StatusError::Io {
                path: path.clone(),
                source,
            })
        };

        let current = CurrentStatus::from_artifact(stat(&paths.artifact)?);
        if current.status == ArtifactState::NotGenerated {
            return Ok(StatusSnapshot {
                current,
                pending: None,
            });
        }

        let mut pending = match self.locks.read(&tileset.id)? {
            LockState::Absent => PendingStatus::new(JobState::NotInProgress),
            LockState::Sentinel => PendingStatus::new(JobState::Starting),
            LockState::Pid(pid) if is_alive(pid) => {
                in_progress(&ProgressLog::new(&paths.progress_log))
            }
            LockState::Pid(_) | LockState::Unrecognized(_) => PendingStatus::new(JobState::Stopped),
        };

        if pending.status != JobState::NotInProgress {
            if let Some(partial) = stat(&paths.generating)? {
                pending.size = Some(partial.size);
                pending.updated = Some(partial.updated);
            }
        }

        Ok(StatusSnapshot {
            current,
            pending: Some(pending),
        })
    }
}

fn in_progress(log: &ProgressLog) -> PendingStatus {
    if !log.exists() {
        return PendingStatus::new(JobState::InProgressLogNotFound);
    }

    let mut pending = PendingStatus::new(JobState::InProgress);
    match log.tail_latest() {
        Ok(latest) => {
            pending.progress = latest.percent().map(str::to_string);
            pending.current_zoom_level = latest.zoom_level();
            pending.estimated_completion_time = latest.eta();
        }
        Err(e) => {
            warn!(path = %log.path().display(), error = %e, "Failed to read progress log");
        }
    }
    pending
}
