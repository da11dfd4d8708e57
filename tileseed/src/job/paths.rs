//! On-disk layout of a seeding job.
//!
//! Every path is namespaced by the job key or tileset name under the cache
//! root, so jobs for different tilesets never touch the same files:
//!
//! ```text
//! <root>/generate_tileset_<key>.lck     lock
//! <root>/<name>.gpkg | <root>/<name>/    artifact (packaged file | tile directory)
//! <root>/<name>.generating               artifact in progress
//! <root>/<name>.progress_log             worker progress
//! <path>_<unix millis>                   backups
//! ```

use crate::job::JobKey;
use crate::tileset::CacheKind;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::info;

/// Resolved file locations for one tileset's job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobPaths {
    /// Cache root shared by all jobs
    pub root: PathBuf,
    /// Lock file marking a claimed or running job
    pub lock: PathBuf,
    /// Canonical artifact location
    pub artifact: PathBuf,
    /// Where the worker writes the artifact before promotion
    pub generating: PathBuf,
    /// Progress stream written by the worker
    pub progress_log: PathBuf,
}

impl JobPaths {
    /// Lay out paths for `name` under `root`.
    ///
    /// `name` must already be validated as a single path component.
    pub fn new(root: &Path, key: &JobKey, name: &str, cache: CacheKind) -> Self {
        let artifact = match cache {
            CacheKind::Gpkg => root.join(format!("{}.gpkg", name)),
            CacheKind::File => root.join(name),
        };

        Self {
            root: root.to_path_buf(),
            lock: lock_path(root, key),
            artifact,
            generating: root.join(format!("{}.generating", name)),
            progress_log: root.join(format!("{}.progress_log", name)),
        }
    }
}

/// Lock file location for `key` under `root`.
pub fn lock_path(root: &Path, key: &JobKey) -> PathBuf {
    root.join(format!("generate_tileset_{}.lck", key))
}

/// Path with `_<millis>` appended to its final component.
pub fn backup_path(path: &Path, millis: i64) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(OsString::new);
    name.push(format!("_{}", millis));
    path.with_file_name(name)
}

/// Rename `path` aside with a millisecond timestamp suffix.
///
/// Returns the backup location, or `None` when there was nothing to move.
/// A file that disappears between the check and the rename counts as
/// nothing to move.
pub fn rename_aside(path: &Path, millis: i64) -> io::Result<Option<PathBuf>> {
    if fs::symlink_metadata(path).is_err() {
        return Ok(None);
    }

    let backup = backup_path(path, millis);
    match fs::rename(path, &backup) {
        Ok(()) => {
            info!(from = %path.display(), to = %backup.display(), "Backed up previous file");
            Ok(Some(backup))
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

/// Current wall-clock time in milliseconds, used for backup suffixes.
pub fn backup_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_gpkg_layout() {
        let key = JobKey::from(4);
        let paths = JobPaths::new(Path::new("/cache"), &key, "boston", CacheKind::Gpkg);

        assert_eq!(paths.lock, PathBuf::from("/cache/generate_tileset_4.lck"));
        assert_eq!(paths.artifact, PathBuf::from("/cache/boston.gpkg"));
        assert_eq!(paths.generating, PathBuf::from("/cache/boston.generating"));
        assert_eq!(paths.progress_log, PathBuf::from("/cache/boston.progress_log"));
    }

    #[test]
    fn test_file_cache_artifact_is_directory_named_after_tileset() {
        let key = JobKey::from(4);
        let paths = JobPaths::new(Path::new("/cache"), &key, "boston", CacheKind::File);
        assert_eq!(paths.artifact, PathBuf::from("/cache/boston"));
    }

    #[test]
    fn test_backup_path_appends_millis() {
        let backup = backup_path(Path::new("/cache/boston.gpkg"), 1700000000123);
        assert_eq!(backup, PathBuf::from("/cache/boston.gpkg_1700000000123"));
    }

    #[test]
    fn test_rename_aside_moves_existing_file() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("boston.progress_log");
        fs::write(&file, "old").unwrap();

        let backup = rename_aside(&file, 99).unwrap().expect("file should be moved");

        assert!(!file.exists());
        assert_eq!(backup, temp.path().join("boston.progress_log_99"));
        assert_eq!(fs::read_to_string(backup).unwrap(), "old");
    }

    #[test]
    fn test_rename_aside_moves_directories() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("boston.generating");
        fs::create_dir_all(dir.join("05")).unwrap();

        let backup = rename_aside(&dir, 1).unwrap().unwrap();
        assert!(backup.join("05").is_dir());
    }

    #[test]
    fn test_rename_aside_missing_is_noop() {
        let temp = TempDir::new().unwrap();
        let result = rename_aside(&temp.path().join("absent"), 1).unwrap();
        assert!(result.is_none());
    }
}
