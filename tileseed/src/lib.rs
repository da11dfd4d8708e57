//! tileseed - tile cache seeding jobs
//!
//! This library runs long seeding jobs that fill a tile cache for a
//! tileset, one job per tileset at a time, coordinated only through the
//! filesystem and the process table.
//!
//! - [`lock`]: exclusive per-job lock files
//! - [`job`]: job identity, file layout and the `JobSpec` built from a tileset
//! - [`progress`]: the worker's progress log
//! - [`process`]: detached workers, liveness and tree termination
//! - [`supervisor`]: `seed`, `stop` and the worker entry point
//! - [`status`]: read-only status snapshots
//! - [`tileset`]: tileset records and their registry
//!
//! ```ignore
//! use tileseed::job::JobSpecBuilder;
//! use tileseed::lock::LockStore;
//! use tileseed::process::WorkerLauncher;
//! use tileseed::supervisor::JobSupervisor;
//!
//! let supervisor = JobSupervisor::new(
//!     LockStore::new(&cache_dir),
//!     JobSpecBuilder::new(&cache_dir, "tms"),
//!     WorkerLauncher::new(worker_exe, vec!["worker".into()]),
//! );
//! let outcome = supervisor.seed(&tileset)?;
//! ```

pub mod config;
pub mod coord;
pub mod job;
pub mod lock;
pub mod logging;
pub mod process;
pub mod progress;
pub mod status;
pub mod supervisor;
pub mod tileset;

/// Version of the tileseed library and CLI.
///
/// This is synchronized across all components in the workspace.
/// The version is defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
