//! `helm template` renderer

use super::ChartRenderer;
use crate::catalog::{ChartRef, Value};
use crate::core::error::{RailError, RailResult, ResultExt};
use std::io::Write;
use std::process::Command;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct HelmRenderer {
  binary: String,
}

impl Default for HelmRenderer {
  fn default() -> Self {
    Self {
      binary: "helm".to_string(),
    }
  }
}

impl HelmRenderer {
  pub fn new(binary: impl Into<String>) -> Self {
    Self { binary: binary.into() }
  }

  fn args(release_name: &str, chart: &ChartRef, values_path: &str) -> Vec<String> {
    let mut args = vec![
      "template".to_string(),
      release_name.to_string(),
      chart.name.clone(),
    ];
    if let Some(repo) = &chart.repo_url {
      args.push("--repo".to_string());
      args.push(repo.clone());
    }
    if let Some(version) = &chart.version {
      args.push("--version".to_string());
      args.push(version.clone());
    }
    args.push("--values".to_string());
    args.push(values_path.to_string());
    args
  }
}

impl ChartRenderer for HelmRenderer {
  fn render(&self, release_name: &str, chart: &ChartRef, values: &Value) -> RailResult<String> {
    let mut values_file = tempfile::Builder::new()
      .prefix("catalog-rail-values-")
      .suffix(".yaml")
      .tempfile()
      .context("creating values file")?;
    values_file
      .write_all(values.to_yaml_string()?.as_bytes())
      .context("writing values file")?;
    let values_path = values_file.path().to_string_lossy().to_string();

    let args = Self::args(release_name, chart, &values_path);
    debug!(release = release_name, "{} {}", self.binary, args.join(" "));
    let output = Command::new(&self.binary)
      .args(&args)
      .output()
      .with_context(|| format!("Failed to execute {}", self.binary))?;

    if !output.status.success() {
      return Err(RailError::ExternalTool {
        tool: self.binary.clone(),
        message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
      });
    }
    Ok(String::from_utf8(output.stdout)?)
  }
}
