//! Filesystem job locks.
//!
//! A lock file exists exactly while a job is claimed or running. It holds
//! [`SENTINEL`] from the moment it is claimed until the worker's pid is
//! recorded, then the pid. Removing it is how a job is cancelled or
//! finished.

mod store;
mod types;

pub use store::LockStore;
pub use types::{AcquireOutcome, LockError, LockHandle, LockState, SENTINEL};
