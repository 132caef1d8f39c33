//! Releases aligned by name across environments

use crate::catalog::document::{Subtree, find_node};
use crate::catalog::{Environment, Release, Value};
use crate::core::error::{RailError, RailResult, ResultExt};
use std::collections::BTreeMap;
use std::sync::Arc;

/// One release name with one slot per environment of its list
#[derive(Debug, Clone)]
pub struct CrossRelease {
  pub name: String,
  /// Parallel to `CrossReleaseList::environments`
  pub releases: Vec<Option<Release>>,
  /// Target release after copying the source's version and values.
  /// Only set on promotion lists, and only when something differs.
  pub promoted: Option<Release>,
}

impl CrossRelease {
  pub fn release_in(&self, environment: &str) -> Option<&Release> {
    self
      .releases
      .iter()
      .flatten()
      .find(|release| release.environment.name == environment)
  }

  pub fn is_promotable(&self) -> bool {
    self.promoted.is_some()
  }

  /// Whether every present release carries the same version
  pub fn all_versions_equal(&self) -> bool {
    let mut versions = self.releases.iter().flatten().map(|r| r.version.as_deref());
    match versions.next() {
      Some(first) => versions.all(|v| v == first),
      None => true,
    }
  }
}

/// Ordered cross-environment rows plus the environments they were built for
#[derive(Debug, Clone)]
pub struct CrossReleaseList {
  pub environments: Vec<Arc<Environment>>,
  pub items: Vec<CrossRelease>,
}

impl CrossReleaseList {
  /// Group releases by name into rows, one column per environment, rows sorted by name
  pub fn build(environments: &[Arc<Environment>], releases: &[Release]) -> Self {
    let mut rows: BTreeMap<String, Vec<Option<Release>>> = BTreeMap::new();
    for release in releases {
      let Some(column) = environments.iter().position(|e| e.name == release.environment.name) else {
        continue;
      };
      let slots = rows
        .entry(release.name.clone())
        .or_insert_with(|| vec![None; environments.len()]);
      slots[column] = Some(release.clone());
    }

    Self {
      environments: environments.to_vec(),
      items: rows
        .into_iter()
        .map(|(name, releases)| CrossRelease {
          name,
          releases,
          promoted: None,
        })
        .collect(),
    }
  }

  fn environment(&self, name: &str) -> RailResult<Arc<Environment>> {
    crate::catalog::get_environment_by_name(&self.environments, name)
  }

  /// Two-column (source, target) list with promoted releases staged on differing rows
  pub fn get_releases_for_promotion(&self, source: &str, target: &str) -> RailResult<CrossReleaseList> {
    let source_env = self.environment(source)?;
    let target_env = self.environment(target)?;

    let mut items = Vec::new();
    for item in &self.items {
      let source_release = item.release_in(source).cloned();
      let target_release = item.release_in(target).cloned();
      if source_release.is_none() && target_release.is_none() {
        continue;
      }
      let promoted = match &source_release {
        Some(src) => stage_promotion(src, target_release.as_ref(), &target_env)
          .with_context(|| format!("staging promotion of release {}", item.name))?,
        None => None,
      };
      items.push(CrossRelease {
        name: item.name.clone(),
        releases: vec![source_release, target_release],
        promoted,
      });
    }
    tracing::debug!(
      source,
      target,
      rows = items.len(),
      promotable = items.iter().filter(|i| i.is_promotable()).count(),
      "built promotion list"
    );

    Ok(Self {
      environments: vec![source_env, target_env],
      items,
    })
  }

  pub fn has_any_promotable_releases(&self) -> bool {
    self.items.iter().any(CrossRelease::is_promotable)
  }

  pub fn promotable(&self) -> impl Iterator<Item = &CrossRelease> {
    self.items.iter().filter(|item| item.is_promotable())
  }

  /// Keep only rows named in `names`, in this list's order. Unknown names are dropped.
  pub fn only_specific_releases(&self, names: &[String]) -> CrossReleaseList {
    for name in names {
      if !self.items.iter().any(|item| &item.name == name) {
        tracing::debug!(release = %name, "requested release not in list");
      }
    }
    Self {
      environments: self.environments.clone(),
      items: self
        .items
        .iter()
        .filter(|item| names.contains(&item.name))
        .cloned()
        .collect(),
    }
  }

  /// Rows whose target release pins a version that promotion must not overwrite
  pub fn get_non_promotable_releases(&self, source: &str, target: &str) -> Vec<String> {
    self
      .items
      .iter()
      .filter(|item| match (item.release_in(source), item.release_in(target)) {
        (Some(src), Some(tgt)) => !tgt.accepts_version_from(src),
        _ => false,
      })
      .map(|item| item.name.clone())
      .collect()
  }

  pub fn names(&self) -> Vec<String> {
    self.items.iter().map(|item| item.name.clone()).collect()
  }
}

/// Build the target release as it will look after promotion, or `None` if nothing differs
pub fn stage_promotion(
  source: &Release,
  target: Option<&Release>,
  target_env: &Arc<Environment>,
) -> RailResult<Option<Release>> {
  let Some(target) = target else {
    let path = target_env.releases_dir().join(&source.relative_path);
    let file = source.file.relocated(path);
    return Release::from_file(file, target_env.clone(), source.relative_path.clone()).map(Some);
  };

  let version_differs = source.version.is_some() && source.version != target.version;
  let values_differ = source.values != target.values;
  if !version_differs && !values_differ {
    return Ok(None);
  }

  let mut file = target.file.clone();
  if version_differs && let Some(version) = &source.version {
    if find_node(file.tree(), "spec.version").is_ok_and(|node| node.as_scalar().is_some()) {
      file.set_scalar("spec.version", version)?;
    } else {
      file.set_subtree("spec.version", &Subtree::from_value(Value::from(version.as_str())))?;
    }
  }
  if values_differ {
    let values = source
      .file
      .subtree("spec.values")
      .or_else(|err| match err.root() {
        RailError::Yaml(_) => Ok(Subtree::from_value(Value::mapping())),
        _ => Err(err),
      })?;
    file.set_subtree("spec.values", &values)?;
  }

  Release::from_file(file, target_env.clone(), target.relative_path.clone()).map(Some)
}
