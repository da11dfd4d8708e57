//! Worker process control: launching, liveness and tree termination.

mod liveness;
mod spawn;
mod tree;

pub use liveness::is_alive;
pub use spawn::{LaunchedWorker, WorkerLauncher, JOB_ENV};
pub use tree::{terminate_tree, ProcessError, TreeKill};
