//! catalog-rail configuration
//!
//! Searched in the catalog directory in order: `catalog-rail.toml`,
//! `.catalog-rail.toml`, `.config/catalog-rail.toml`. A missing file means
//! defaults everywhere.

use crate::core::error::{ConfigError, RailError, RailResult, ResultExt};
use crate::hydrate::mapping::{ValueMapping, split_into_path_segments};
use crate::hydrate::template::Template;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use toml_edit::{Array, DocumentMut, Item, Table, value};

pub const CONFIG_FILE_NAME: &str = "catalog-rail.toml";

/// Configuration for catalog-rail
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogRailConfig {
  #[serde(default)]
  pub catalog: CatalogConfig,
  #[serde(default)]
  pub selection: SelectionConfig,
  #[serde(default)]
  pub promotion: PromotionConfig,
  #[serde(default)]
  pub value_mapping: ValueMapping,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
  /// Directory holding `<env>.yaml` files, relative to the catalog root
  #[serde(default = "default_environments_dir")]
  pub environments_dir: PathBuf,
}

fn default_environments_dir() -> PathBuf {
  PathBuf::from("environments")
}

impl Default for CatalogConfig {
  fn default() -> Self {
    Self {
      environments_dir: default_environments_dir(),
    }
  }
}

/// Persisted environment/release selection (written by `env select` / `release select`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionConfig {
  /// Empty selects every environment
  #[serde(default)]
  pub environments: Vec<String>,
  /// Empty selects every release
  #[serde(default)]
  pub releases: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromotionConfig {
  #[serde(default = "default_branch_prefix")]
  pub branch_prefix: String,

  #[serde(default = "default_remote")]
  pub remote: String,

  /// Label added to pull requests created with auto-merge
  #[serde(default = "default_auto_merge_label")]
  pub auto_merge_label: String,

  #[serde(default = "default_commit_template")]
  pub commit_template: String,

  #[serde(default = "default_pull_request_title_template")]
  pub pull_request_title_template: String,

  #[serde(default = "default_pull_request_body_template")]
  pub pull_request_body_template: String,
}

fn default_branch_prefix() -> String {
  "catalog-rail/promote".to_string()
}

fn default_remote() -> String {
  "origin".to_string()
}

fn default_auto_merge_label() -> String {
  "auto-merge".to_string()
}

fn default_commit_template() -> String {
  "Promote {{ join \", \" .ReleaseNames }} from {{ .Source }} to {{ .Target }}".to_string()
}

fn default_pull_request_title_template() -> String {
  "Promote {{ len .Releases }} release(s) from {{ .Source }} to {{ .Target }}".to_string()
}

fn default_pull_request_body_template() -> String {
  concat!(
    "Promotes the following releases from `{{ .Source }}` to `{{ .Target }}`:\n\n",
    "| Release | Project | {{ .Source }} | {{ .Target }} |\n",
    "|---|---|---|---|\n",
    "{{- range .Releases }}\n",
    "| {{ .Name }} | {{ .Project }} | {{ .SourceVersion }} | {{ .TargetVersion | default \"-\" }} |\n",
    "{{- end }}\n",
  )
  .to_string()
}

impl Default for PromotionConfig {
  fn default() -> Self {
    Self {
      branch_prefix: default_branch_prefix(),
      remote: default_remote(),
      auto_merge_label: default_auto_merge_label(),
      commit_template: default_commit_template(),
      pull_request_title_template: default_pull_request_title_template(),
      pull_request_body_template: default_pull_request_body_template(),
    }
  }
}

impl PromotionConfig {
  pub fn validate(&self) -> RailResult<()> {
    for (field, source) in [
      ("promotion.commit_template", &self.commit_template),
      ("promotion.pull_request_title_template", &self.pull_request_title_template),
      ("promotion.pull_request_body_template", &self.pull_request_body_template),
    ] {
      Template::parse(source).map_err(|e| invalid(field, e.to_string()))?;
    }

    if self.branch_prefix.trim().is_empty() {
      return Err(invalid("promotion.branch_prefix", "must not be empty"));
    }
    if self.remote.trim().is_empty() {
      return Err(invalid("promotion.remote", "must not be empty"));
    }
    Ok(())
  }
}

fn invalid(field: &str, message: impl Into<String>) -> RailError {
  RailError::Config(ConfigError::Invalid {
    field: field.to_string(),
    message: message.into(),
  })
}

fn validate_value_mapping(mapping: &ValueMapping) -> RailResult<()> {
  for path in mapping.mappings.keys() {
    let segments = split_into_path_segments(path);
    if segments.is_empty() || segments.iter().any(|s| s.is_empty()) {
      return Err(invalid(
        "value_mapping.mappings",
        format!("path {:?} has an empty segment", path),
      ));
    }
  }
  Ok(())
}

impl CatalogRailConfig {
  /// Find config file in search order
  pub fn find_config_path(path: &Path) -> Option<PathBuf> {
    let candidates = [
      path.join(CONFIG_FILE_NAME),
      path.join(".catalog-rail.toml"),
      path.join(".config").join(CONFIG_FILE_NAME),
    ];

    candidates.into_iter().find(|p| p.exists())
  }

  /// Load config from the catalog directory, falling back to defaults
  pub fn load(path: &Path) -> RailResult<Self> {
    let Some(config_path) = Self::find_config_path(path) else {
      tracing::debug!(dir = %path.display(), "no config file found, using defaults");
      return Ok(Self::default());
    };

    let content = fs::read_to_string(&config_path)
      .with_context(|| format!("Failed to read config from {}", config_path.display()))?;
    let config = Self::parse(&content).with_context(|| format!("Invalid config in {}", config_path.display()))?;
    tracing::debug!(path = %config_path.display(), "loaded config");
    Ok(config)
  }

  pub fn parse(content: &str) -> RailResult<Self> {
    let config: CatalogRailConfig = toml_edit::de::from_str(content)?;
    config.validate()?;
    Ok(config)
  }

  pub fn validate(&self) -> RailResult<()> {
    self.promotion.validate()?;
    validate_value_mapping(&self.value_mapping)
  }

  /// Rewrite only the `[selection]` table, creating the config file when absent
  pub fn save_selection(path: &Path, selection: &SelectionConfig) -> RailResult<PathBuf> {
    let config_path = Self::find_config_path(path).unwrap_or_else(|| path.join(CONFIG_FILE_NAME));

    let mut doc = if config_path.exists() {
      let content = fs::read_to_string(&config_path)
        .with_context(|| format!("Failed to read config from {}", config_path.display()))?;
      content
        .parse::<DocumentMut>()
        .with_context(|| format!("Failed to parse config from {}", config_path.display()))?
    } else {
      DocumentMut::new()
    };

    apply_selection(&mut doc, selection);

    fs::write(&config_path, doc.to_string())
      .with_context(|| format!("Failed to write config to {}", config_path.display()))?;
    tracing::info!(path = %config_path.display(), "saved selection");
    Ok(config_path)
  }
}

fn string_array(items: &[String]) -> Array {
  items.iter().map(String::as_str).collect()
}

fn apply_selection(doc: &mut DocumentMut, selection: &SelectionConfig) {
  if !doc.contains_table("selection") {
    doc.insert("selection", Item::Table(Table::new()));
  }
  let table = &mut doc["selection"];
  table["environments"] = value(string_array(&selection.environments));
  table["releases"] = value(string_array(&selection.releases));
}
