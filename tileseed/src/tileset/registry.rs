//! Tileset registry backed by one JSON document per tileset.

use super::Tileset;
use crate::job::JobKey;
use crate::status::ArtifactMetadata;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Errors from reading or updating the registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("tileset '{0}' not found in registry")]
    NotFound(JobKey),

    #[error("failed to access registry file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid tileset record {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("tileset record {path} has id '{found}', expected '{expected}'")]
    IdMismatch {
        path: PathBuf,
        expected: JobKey,
        found: JobKey,
    },

    /// Artifacts are named after the tileset, so names must be unique.
    #[error("tileset name '{name}' is shared by tilesets {}", join_keys(.keys))]
    DuplicateName { name: String, keys: Vec<JobKey> },
}

fn join_keys(keys: &[JobKey]) -> String {
    keys.iter()
        .map(JobKey::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Source of tileset records and sink for artifact metadata.
pub trait TilesetRegistry: Send + Sync {
    /// Load one tileset by key.
    fn load(&self, key: &JobKey) -> Result<Tileset, RegistryError>;

    /// All tilesets, ordered by key.
    fn list(&self) -> Result<Vec<Tileset>, RegistryError>;

    /// Store the size and timestamp of a freshly promoted artifact.
    fn record_artifact(&self, key: &JobKey, artifact: &ArtifactMetadata)
        -> Result<(), RegistryError>;
}

/// Registry stored as `<directory>/<key>.json`.
#[derive(Debug, Clone)]
pub struct JsonRegistry {
    directory: PathBuf,
}

impl JsonRegistry {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn record_path(&self, key: &JobKey) -> PathBuf {
        self.directory.join(format!("{}.json", key))
    }

    fn read_record(path: &Path) -> Result<Tileset, RegistryError> {
        let content = fs::read_to_string(path).map_err(|source| RegistryError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| RegistryError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Every record in the directory, unordered.
    fn records(&self) -> Result<Vec<(PathBuf, Result<Tileset, RegistryError>)>, RegistryError> {
        let entries = match fs::read_dir(&self.directory) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(RegistryError::Io {
                    path: self.directory.clone(),
                    source,
                })
            }
        };

        let mut records = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| RegistryError::Io {
                path: self.directory.clone(),
                source,
            })?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let record = Self::read_record(&path);
            records.push((path, record));
        }
        Ok(records)
    }

    /// Fail when another readable record uses the name of `tileset`.
    fn ensure_unique_name(&self, tileset: &Tileset) -> Result<(), RegistryError> {
        let mut keys: Vec<JobKey> = Vec::new();
        for (path, record) in self.records()? {
            match record {
                Ok(other) if other.name == tileset.name => keys.push(other.id),
                Ok(_) => {}
                Err(e) => debug!(path = %path.display(), error = %e, "Skipping unreadable record"),
            }
        }
        if keys.len() > 1 {
            keys.sort();
            return Err(RegistryError::DuplicateName {
                name: tileset.name.clone(),
                keys,
            });
        }
        Ok(())
    }

    /// Write through a temporary file so readers never see a partial record.
    fn write_record(&self, path: &Path, tileset: &Tileset) -> Result<(), RegistryError> {
        let io_err = |source| RegistryError::Io {
            path: path.to_path_buf(),
            source,
        };
        let content = serde_json::to_string_pretty(tileset).map_err(|source| {
            RegistryError::Parse {
                path: path.to_path_buf(),
                source,
            }
        })?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, content).map_err(io_err)?;
        fs::rename(&tmp, path).map_err(io_err)
    }
}

impl TilesetRegistry for JsonRegistry {
    fn load(&self, key: &JobKey) -> Result<Tileset, RegistryError> {
        let path = self.record_path(key);
        if !path.exists() {
            return Err(RegistryError::NotFound(key.clone()));
        }
        let tileset = Self::read_record(&path)?;
        if &tileset.id != key {
            return Err(RegistryError::IdMismatch {
                path,
                expected: key.clone(),
                found: tileset.id,
            });
        }
        self.ensure_unique_name(&tileset)?;
        Ok(tileset)
    }

    fn list(&self) -> Result<Vec<Tileset>, RegistryError> {
        let mut tilesets = self
            .records()?
            .into_iter()
            .map(|(_, record)| record)
            .collect::<Result<Vec<_>, _>>()?;
        tilesets.sort_by(|a, b| a.id.cmp(&b.id));

        let mut by_name: BTreeMap<&str, Vec<JobKey>> = BTreeMap::new();
        for tileset in &tilesets {
            by_name
                .entry(tileset.name.as_str())
                .or_default()
                .push(tileset.id.clone());
        }
        if let Some((name, keys)) = by_name.into_iter().find(|(_, keys)| keys.len() > 1) {
            return Err(RegistryError::DuplicateName {
                name: name.to_string(),
                keys,
            });
        }
        Ok(tilesets)
    }

    fn record_artifact(
        &self,
        key: &JobKey,
        artifact: &ArtifactMetadata,
    ) -> Result<(), RegistryError> {
        let path = self.record_path(key);
        let mut tileset = self.load(key)?;
        tileset.filesize = Some(artifact.size);
        tileset.updated_at = Some(artifact.updated);
        self.write_record(&path, &tileset)?;
        debug!(key = %key, size = artifact.size, "Recorded artifact in registry");
        Ok(())
    }
}
