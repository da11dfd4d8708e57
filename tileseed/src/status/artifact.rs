use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;
use std::time::SystemTime;

/// Size and modification time of an artifact on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    /// Bytes; the sum of all files for directory caches
    pub size: u64,
    /// Latest modification time of the artifact or anything inside it
    pub updated: DateTime<Utc>,
}

impl ArtifactMetadata {
    /// Stat `path`, returning `None` when nothing exists there.
    ///
    /// Workers rename and delete files while this runs. Entries that vanish
    /// during a directory walk are skipped, and a directory that is itself
    /// gone by the end of the walk counts as absent.
    pub fn stat(path: &Path) -> io::Result<Option<Self>> {
        let metadata = match fs::metadata(path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        };

        if !metadata.is_dir() {
            return Ok(Some(Self {
                size: metadata.len(),
                updated: metadata.modified()?.into(),
            }));
        }

        let mut size = 0;
        let mut updated = metadata.modified()?;
        walk(path, &mut size, &mut updated)?;
        if !path.is_dir() {
            return Ok(None);
        }
        Ok(Some(Self {
            size,
            updated: updated.into(),
        }))
    }
}

fn walk(dir: &Path, size: &mut u64, updated: &mut SystemTime) -> io::Result<()> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e),
    };

    for entry in entries {
        let (path, metadata) = match entry.and_then(|e| Ok((e.path(), e.metadata()?))) {
            Ok(found) => found,
            Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
            Err(e) => return Err(e),
        };
        let modified = metadata.modified()?;
        if modified > *updated {
            *updated = modified;
        }
        if metadata.is_dir() {
            walk(&path, size, updated)?;
        } else {
            *size += metadata.len();
        }
    }
    Ok(())
}
