use serde::{Deserialize, Serialize};

/// Result of a seed request, serialized as `{"status": ..., "error"?: ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status")]
pub enum SeedOutcome {
    /// A worker was launched and owns the lock
    #[serde(rename = "started")]
    Started,
    /// Another request holds the lock
    #[serde(rename = "already started")]
    AlreadyStarted,
    /// The tileset could not be turned into a job; no lock is held
    #[serde(rename = "unable to start")]
    UnableToStart { error: String },
    /// A concurrent stop released the lock before the worker took over
    #[serde(rename = "cancelled")]
    Cancelled,
}

/// Result of a stop request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status")]
pub enum StopOutcome {
    #[serde(rename = "not in progress")]
    NotInProgress,
    /// The lock was claimed but no worker had been recorded yet
    #[serde(rename = "start cancelled")]
    StartCancelled,
    #[serde(rename = "stopped")]
    Stopped,
    /// The lock named a worker that no longer exists
    #[serde(rename = "cleaned up")]
    CleanedUp,
}
