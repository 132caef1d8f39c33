//! Chart rendering of hydrated release values
//!
//! The renderer itself is external; [`HelmRenderer`] runs `helm template`.
//! [`ManifestColorWriter`] highlights document separators and source comments
//! in the rendered manifest.

pub mod helm;
pub mod manifest;

pub use helm::HelmRenderer;
pub use manifest::ManifestColorWriter;

use crate::catalog::{ChartRef, Value};
use crate::core::error::RailResult;

/// Renders a chart with fully hydrated values into manifest text
pub trait ChartRenderer {
  fn render(&self, release_name: &str, chart: &ChartRef, values: &Value) -> RailResult<String>;
}
