use super::ArtifactMetadata;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;

/// Status of a tileset's artifact and of any job producing a new one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusSnapshot {
    pub current: CurrentStatus,
    /// Omitted while no artifact has ever been generated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending: Option<PendingStatus>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ArtifactState {
    #[serde(rename = "ready")]
    Ready,
    #[serde(rename = "not generated")]
    NotGenerated,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrentStatus {
    pub status: ArtifactState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated: Option<DateTime<Utc>>,
}

impl CurrentStatus {
    pub(crate) fn from_artifact(artifact: Option<ArtifactMetadata>) -> Self {
        match artifact {
            Some(meta) => Self {
                status: ArtifactState::Ready,
                size: Some(meta.size),
                updated: Some(meta.updated),
            },
            None => Self {
                status: ArtifactState::NotGenerated,
                size: None,
                updated: None,
            },
        }
    }
}

/// State of the job as seen from its lock and process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum JobState {
    #[serde(rename = "not in progress")]
    NotInProgress,
    /// Lock claimed, worker not yet recorded
    #[serde(rename = "starting")]
    Starting,
    #[serde(rename = "in progress")]
    InProgress,
    #[serde(rename = "in progress, but log not found")]
    InProgressLogNotFound,
    /// Lock left behind by a worker that is gone
    #[serde(rename = "stopped")]
    Stopped,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PendingStatus {
    pub status: JobState,
    /// Percentage string, e.g. `45.00`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_zoom_level: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_completion_time: Option<NaiveDateTime>,
    /// Size of the partially generated artifact
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated: Option<DateTime<Utc>>,
}

impl PendingStatus {
    pub(crate) fn new(status: JobState) -> Self {
        Self {
            status,
            progress: None,
            current_zoom_level: None,
            estimated_completion_time: None,
            size: None,
            updated: None,
        }
    }
}
