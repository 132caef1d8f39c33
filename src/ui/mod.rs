//! Terminal output helpers

pub mod diff;
pub mod style;
