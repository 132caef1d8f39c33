//! Release entity

use crate::catalog::document::YamlFile;
use crate::catalog::environment::Environment;
use crate::catalog::value::Value;
use crate::core::error::{RailError, RailResult};
use semver::Version;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Chart reference consumed by the chart renderer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartRef {
  pub repo_url: Option<String>,
  pub name: String,
  pub version: Option<String>,
}

impl ChartRef {
  fn from_value(value: &Value) -> Option<Self> {
    Some(Self {
      name: value.get("name").and_then(Value::scalar_text)?,
      repo_url: value.get("repoUrl").and_then(Value::scalar_text),
      version: value.get("version").and_then(Value::scalar_text),
    })
  }

  pub fn to_value(&self) -> Value {
    let mut map = crate::catalog::value::Mapping::new();
    map.insert("Name".into(), Value::from(self.name.clone()));
    map.insert("RepoUrl".into(), self.repo_url.clone().map(Value::from).unwrap_or_default());
    map.insert("Version".into(), self.version.clone().map(Value::from).unwrap_or_default());
    Value::Mapping(map)
  }
}

/// One release of a project within one environment
#[derive(Debug, Clone)]
pub struct Release {
  pub name: String,
  pub project: String,
  pub version: Option<String>,
  pub values: Value,
  pub chart: Option<ChartRef>,
  pub environment: Arc<Environment>,
  /// Path below the environment's `releases/` directory
  pub relative_path: PathBuf,
  pub file: YamlFile,
}

impl Release {
  pub fn load(path: &Path, environment: Arc<Environment>) -> RailResult<Self> {
    let relative_path = path.strip_prefix(environment.releases_dir())?.to_path_buf();
    Self::from_file(YamlFile::load(path)?, environment, relative_path)
  }

  pub fn from_file(file: YamlFile, environment: Arc<Environment>, relative_path: PathBuf) -> RailResult<Self> {
    let doc = file.value();
    let name = doc
      .get_path(&["metadata", "name"])
      .and_then(Value::scalar_text)
      .or_else(|| release_name_from_path(file.path()))
      .ok_or_else(|| RailError::message(format!("release file {} has no name", file.path().display())))?;

    Ok(Self {
      project: doc
        .get_path(&["spec", "project"])
        .and_then(Value::scalar_text)
        .unwrap_or_default(),
      version: doc
        .get_path(&["spec", "version"])
        .and_then(Value::scalar_text)
        .filter(|v| !v.is_empty()),
      values: match doc.get_path(&["spec", "values"]) {
        Some(Value::Null) | None => Value::mapping(),
        Some(values) => values.clone(),
      },
      chart: doc.get_path(&["spec", "chart"]).and_then(ChartRef::from_value),
      name,
      environment,
      relative_path,
      file,
    })
  }

  /// Whether promoting `source` over this release is allowed by its version
  pub fn accepts_version_from(&self, source: &Release) -> bool {
    match &self.version {
      None => true,
      Some(version) => source.version.as_deref() == Some(version.as_str()) || is_standard_version(version),
    }
  }
}

fn release_name_from_path(path: &Path) -> Option<String> {
  let file_name = path.file_name()?.to_string_lossy();
  let name = [".release.yaml", ".release.yml", ".yaml", ".yml"]
    .iter()
    .find_map(|suffix| file_name.strip_suffix(suffix))
    .unwrap_or(&file_name);
  (!name.is_empty()).then(|| name.to_string())
}

/// A plain release version: optional `v`, one to three numeric components,
/// no pre-release or build metadata. Anything else is pinned/custom.
pub fn is_standard_version(version: &str) -> bool {
  let trimmed = version.strip_prefix('v').unwrap_or(version);
  let components: Vec<&str> = trimmed.split('.').collect();
  if components.is_empty() || components.len() > 3 || components.iter().any(|c| c.is_empty()) {
    return false;
  }
  let mut padded = components.clone();
  padded.resize(3, "0");
  match Version::parse(&padded.join(".")) {
    Ok(parsed) => parsed.pre.is_empty() && parsed.build.is_empty(),
    Err(_) => false,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn environment() -> Arc<Environment> {
    let file = YamlFile::parse("/c/environments/prod.yaml", "spec: {}\n").unwrap();
    Arc::new(Environment::from_file(file).unwrap())
  }

  fn release(raw: &str) -> Release {
    let file = YamlFile::parse("/c/environments/prod/releases/team/api.release.yaml", raw).unwrap();
    Release::from_file(file, environment(), PathBuf::from("team/api.release.yaml")).unwrap()
  }

  #[test]
  fn test_release_fields() {
    let rel = release(
      "metadata:\n  name: api\nspec:\n  project: api-project\n  version: 1.0\n  chart:\n    name: generic\n    version: 2.1.0\n  values:\n    replicas: 2\n",
    );
    assert_eq!(rel.name, "api");
    assert_eq!(rel.project, "api-project");
    assert_eq!(rel.version.as_deref(), Some("1.0"));
    assert_eq!(rel.values.get("replicas"), Some(&Value::from(2)));
    assert_eq!(rel.chart.as_ref().map(|c| c.name.as_str()), Some("generic"));
    assert_eq!(rel.environment.name, "prod");
  }

  #[test]
  fn test_name_from_file_name_and_missing_values() {
    let rel = release("spec:\n  project: api\n");
    assert_eq!(rel.name, "api");
    assert_eq!(rel.version, None);
    assert_eq!(rel.values, Value::mapping());
  }

  #[test]
  fn test_standard_versions() {
    for v in ["1", "1.0", "0.9", "1.2.3", "v2.0.1", "10.20.30"] {
      assert!(is_standard_version(v), "{v} should be standard");
    }
    for v in ["latest", "1.2.3-hotfix", "1.2.3+build", "sha-abc", "1.2.3.4", "", "1..2"] {
      assert!(!is_standard_version(v), "{v} should be pinned");
    }
  }

  #[test]
  fn test_accepts_version_from() {
    let source = release("spec:\n  version: 1.0\n");
    assert!(release("spec:\n  version: 0.9\n").accepts_version_from(&source));
    assert!(release("spec: {}\n").accepts_version_from(&source));
    assert!(release("spec:\n  version: 1.0\n").accepts_version_from(&source));
    assert!(!release("spec:\n  version: 0.9-pinned\n").accepts_version_from(&source));
  }
}
