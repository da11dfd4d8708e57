//! Worker progress log.
//!
//! The worker's output is a plain text stream: a step line whenever a zoom
//! level starts and percent lines (redrawn with `\r`) in between. Readers
//! only need the latest values, which [`ProgressLog::tail_latest`] extracts.
//! Anything unparseable is ignored.

mod log;
mod record;

pub use log::{ProgressLog, ProgressWriter};
pub use record::{LatestProgress, PercentRecord, StepRecord};
