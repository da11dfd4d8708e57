//! The worker side of a job: run the engine, promote the artifact, release
//! the lock.

use super::{SeedEngine, WorkerError};
use crate::job::{backup_millis, rename_aside, JobPaths, JobSpec};
use crate::lock::{LockState, LockStore};
use crate::process::JOB_ENV;
use crate::status::ArtifactMetadata;
use crate::tileset::TilesetRegistry;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info, warn};

/// How long a worker waits for the supervisor to record its pid.
const OWNER_WAIT: Duration = Duration::from_secs(30);

/// Read the job description a supervisor passed to this process.
pub fn spec_from_env() -> Result<JobSpec, WorkerError> {
    let raw = std::env::var(JOB_ENV).map_err(|_| WorkerError::MissingJob(JOB_ENV))?;
    Ok(serde_json::from_str(&raw)?)
}

/// Run a job to completion.
///
/// The job only starts once the lock names this process as its owner; a
/// lock that disappears first means the start was cancelled. On success the
/// new artifact replaces the canonical one (which is kept as a timestamped
/// backup) before the lock is released. On failure the partial output stays
/// at its `.generating` path and the lock is released all the same. Registry
/// updates are best effort.
pub fn run_worker(
    spec: &JobSpec,
    engine: &dyn SeedEngine,
    registry: Option<&dyn TilesetRegistry>,
) -> Result<ArtifactMetadata, WorkerError> {
    let locks = LockStore::new(&spec.paths.root);
    let pid = std::process::id();
    info!(key = %spec.key, name = %spec.name, pid, "Worker started");

    if !locks.wait_for_owner(&spec.key, pid, OWNER_WAIT)? {
        warn!(key = %spec.key, pid, "Lock not handed to this worker, giving up");
        return Err(WorkerError::Cancelled(spec.key.clone()));
    }

    let result = engine
        .seed(spec)
        .and_then(|()| finalize_artifact(&spec.paths));

    let released = locks.release_if(&spec.key, &LockState::Pid(pid)).map(|removed| {
        if !removed {
            warn!(key = %spec.key, pid, "Lock no longer owned by this worker, left in place");
        }
    });
    let backup = match result {
        Ok(backup) => backup,
        Err(e) => {
            error!(key = %spec.key, error = %e, "Seeding failed");
            if let Err(release_err) = released {
                warn!(key = %spec.key, error = %release_err, "Lock not released");
            }
            return Err(e);
        }
    };
    released?;

    let metadata = ArtifactMetadata::stat(&spec.paths.artifact)
        .map_err(|source| WorkerError::Promote {
            path: spec.paths.artifact.clone(),
            source,
        })?
        .ok_or_else(|| WorkerError::MissingOutput(spec.paths.artifact.clone()))?;

    info!(
        key = %spec.key,
        size = metadata.size,
        backup = ?backup,
        "Seeding finished"
    );

    if let Some(registry) = registry {
        if let Err(e) = registry.record_artifact(&spec.key, &metadata) {
            warn!(key = %spec.key, error = %e, "Failed to record artifact in registry");
        }
    }

    Ok(metadata)
}

/// Move the generated output to the canonical path.
///
/// Any existing artifact is renamed aside first; its backup path is
/// returned.
pub fn finalize_artifact(paths: &JobPaths) -> Result<Option<PathBuf>, WorkerError> {
    if fs::symlink_metadata(&paths.generating).is_err() {
        return Err(WorkerError::MissingOutput(paths.generating.clone()));
    }

    let backup = rename_aside(&paths.artifact, backup_millis()).map_err(|source| {
        WorkerError::Promote {
            path: paths.artifact.clone(),
            source,
        }
    })?;

    fs::rename(&paths.generating, &paths.artifact).map_err(|source| WorkerError::Promote {
        path: paths.generating.clone(),
        source,
    })?;

    info!(artifact = %paths.artifact.display(), "Artifact promoted");
    Ok(backup)
}
