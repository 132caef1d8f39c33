//! catalog-rail: promote releases across the environments of a GitOps catalog
//!
//! The binary in `main.rs` is a thin clap layer over [`commands`]; everything
//! else is usable as a library.

pub mod catalog;
pub mod commands;
pub mod core;
pub mod cross;
pub mod graph;
pub mod hydrate;
pub mod promote;
pub mod prompt;
pub mod render;
pub mod ui;
