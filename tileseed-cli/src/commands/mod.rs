//! CLI command implementations.
//!
//! Each subcommand has its own module with its handler.
//!
//! # Command Modules
//!
//! - [`seed`] - Start a seed job
//! - [`stop`] - Stop a seed job
//! - [`status`] - Artifact and job status
//! - [`list`] - Registered tilesets
//! - [`config`] - Configuration management (path, init, show)
//! - [`worker`] - Worker process entry point

pub mod config;
pub mod list;
pub mod seed;
pub mod status;
pub mod stop;
pub mod worker;
