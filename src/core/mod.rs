//! Core plumbing shared by every command
//!
//! - **config**: catalog-rail.toml parsing, validation and selection persistence
//! - **context**: config + catalog + promotion graph, loaded once per run
//! - **error**: error kinds with help messages and exit codes
//! - **telemetry**: tracing subscriber setup
//! - **vcs**: git and pull-request collaborators

pub mod config;
pub mod context;
pub mod error;
pub mod telemetry;
pub mod vcs;
