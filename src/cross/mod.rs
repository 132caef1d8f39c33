//! Cross-environment release matching and promotion staging

pub mod release_list;

pub use release_list::{CrossRelease, CrossReleaseList, stage_promotion};
