use crate::tileset::SourceKind;
use thiserror::Error;

/// A tileset that cannot be turned into a seeding job.
///
/// These are raised before any lock is held for longer than the build
/// attempt and are reported to the caller as `unable to start`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    #[error("invalid configuration - zoom start ({start}) is greater than zoom stop ({stop})")]
    InvalidZoomRange { start: u8, stop: u8 },

    #[error("invalid configuration - tileset name '{0}' must be a single file name without path separators")]
    InvalidName(String),

    #[error("invalid configuration - {source_kind} source requires {parameter}")]
    MissingSourceParameter {
        source_kind: SourceKind,
        parameter: &'static str,
    },

    #[error("invalid configuration - bounding box: {0}")]
    InvalidBoundingBox(String),

    #[error("invalid configuration - unknown directory layout '{0}'")]
    InvalidDirectoryLayout(String),
}
