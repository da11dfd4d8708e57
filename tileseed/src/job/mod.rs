//! Seeding job description.
//!
//! A job is identified by a [`JobKey`], lays its files out according to
//! [`JobPaths`] and is fully described by a [`JobSpec`] built from a tileset
//! record with [`JobSpecBuilder`].

mod builder;
mod error;
mod key;
mod paths;
mod spec;

pub use builder::{check_name, table_name, JobSpecBuilder, DIRECTORY_LAYOUTS, GRID_SRS};
pub use error::ConfigurationError;
pub use key::{InvalidJobKey, JobKey};
pub use paths::{backup_millis, backup_path, lock_path, rename_aside, JobPaths};
pub use spec::{
    CacheBackend, GridOrigin, GridSpec, HttpAuth, JobSpec, LayerSpec, SeedCoverage,
    SourceBackend, ZoomRange,
};
