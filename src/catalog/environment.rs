//! Environment entity

use crate::catalog::document::YamlFile;
use crate::catalog::value::Value;
use crate::core::error::{NotFoundError, RailError, RailResult};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Which environments may promote into this one
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromotionPolicy {
  pub from_environments: Vec<String>,
  pub allow_auto_merge: bool,
}

/// A named deployment target, loaded from `environments/<env>.yaml`
#[derive(Debug, Clone)]
pub struct Environment {
  pub name: String,
  pub order: i64,
  pub promotion: PromotionPolicy,
  pub values: Value,
  /// `environments/<env>/`, holding the `releases/` tree
  pub dir: PathBuf,
  pub file: YamlFile,
}

impl Environment {
  pub fn load(path: &Path) -> RailResult<Self> {
    Self::from_file(YamlFile::load(path)?)
  }

  pub fn from_file(file: YamlFile) -> RailResult<Self> {
    let doc = file.value();
    let stem = file
      .path()
      .file_stem()
      .map(|s| s.to_string_lossy().into_owned())
      .unwrap_or_default();
    let name = doc
      .get_path(&["metadata", "name"])
      .and_then(Value::scalar_text)
      .unwrap_or_else(|| stem.clone());
    if name.is_empty() {
      return Err(RailError::message(format!(
        "environment file {} has no name",
        file.path().display()
      )));
    }

    let promotion = PromotionPolicy {
      from_environments: doc
        .get_path(&["spec", "promotion", "fromEnvironments"])
        .map(Value::string_list)
        .unwrap_or_default(),
      allow_auto_merge: doc
        .get_path(&["spec", "promotion", "allowAutoMerge"])
        .and_then(Value::as_bool)
        .unwrap_or(false),
    };

    Ok(Self {
      order: doc.get_path(&["spec", "order"]).and_then(Value::as_i64).unwrap_or(0),
      values: doc.get_path(&["spec", "values"]).cloned().unwrap_or_else(Value::mapping),
      dir: file.path().with_file_name(&stem),
      name,
      promotion,
      file,
    })
  }

  pub fn releases_dir(&self) -> PathBuf {
    self.dir.join("releases")
  }

  /// Whether this environment lists `source` as an allowed promotion source
  pub fn accepts_promotions_from(&self, source: &str) -> bool {
    self.promotion.from_environments.iter().any(|s| s == source)
  }
}

/// Look an environment up by name
pub fn get_environment_by_name(environments: &[Arc<Environment>], name: &str) -> RailResult<Arc<Environment>> {
  environments
    .iter()
    .find(|env| env.name == name)
    .cloned()
    .ok_or_else(|| RailError::NotFound(NotFoundError::Environment { name: name.to_string() }))
}

/// Environments matching `names`, in catalog order. An empty list selects all.
pub fn get_environments_by_names(environments: &[Arc<Environment>], names: &[String]) -> Vec<Arc<Environment>> {
  if names.is_empty() {
    return environments.to_vec();
  }
  environments
    .iter()
    .filter(|env| names.contains(&env.name))
    .cloned()
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_environment_fields() {
    let file = YamlFile::parse(
      "/catalog/environments/prod.yaml",
      "metadata:\n  name: prod\nspec:\n  order: 2\n  promotion:\n    fromEnvironments: [staging]\n    allowAutoMerge: true\n  values:\n    region: ca\n",
    )
    .unwrap();
    let env = Environment::from_file(file).unwrap();
    assert_eq!(env.name, "prod");
    assert_eq!(env.order, 2);
    assert_eq!(env.promotion.from_environments, vec!["staging".to_string()]);
    assert!(env.promotion.allow_auto_merge);
    assert!(env.accepts_promotions_from("staging"));
    assert!(!env.accepts_promotions_from("dev"));
    assert_eq!(env.releases_dir(), PathBuf::from("/catalog/environments/prod/releases"));
    assert_eq!(env.values.get("region").and_then(Value::as_str), Some("ca"));
  }

  #[test]
  fn test_name_falls_back_to_file_stem() {
    let file = YamlFile::parse("/catalog/environments/staging.yaml", "spec: {}\n").unwrap();
    let env = Environment::from_file(file).unwrap();
    assert_eq!(env.name, "staging");
    assert!(env.promotion.from_environments.is_empty());
    assert_eq!(env.values, Value::mapping());
  }

  #[test]
  fn test_lookup_by_name() {
    let envs: Vec<Arc<Environment>> = ["dev", "prod"]
      .iter()
      .map(|n| {
        let file = YamlFile::parse(format!("/c/environments/{n}.yaml"), "spec: {}\n").unwrap();
        Arc::new(Environment::from_file(file).unwrap())
      })
      .collect();

    assert_eq!(get_environment_by_name(&envs, "prod").unwrap().name, "prod");
    assert!(matches!(
      get_environment_by_name(&envs, "qa"),
      Err(RailError::NotFound(NotFoundError::Environment { .. }))
    ));
    assert_eq!(get_environments_by_names(&envs, &[]).len(), 2);
    assert_eq!(get_environments_by_names(&envs, &["prod".to_string()])[0].name, "prod");
  }
}
