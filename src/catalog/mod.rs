//! Release catalog model
//!
//! A catalog is a directory of environment files plus, per environment, a
//! tree of release files:
//!
//! ```text
//! environments/
//!   staging.yaml
//!   staging/releases/<team>/api.release.yaml
//!   prod.yaml
//!   prod/releases/<team>/api.release.yaml
//! ```
//!
//! - **value**: closed YAML value type shared by every component
//! - **document**: owned YAML document with a structural (span) view and a typed view
//! - **environment** / **release**: the two catalog entities
//! - **filter**: release selection strategies applied at load time

pub mod document;
pub mod environment;
pub mod filter;
pub mod release;
pub mod value;

pub use document::YamlFile;
pub use environment::{Environment, PromotionPolicy, get_environment_by_name, get_environments_by_names};
pub use filter::ReleaseFilter;
pub use release::{ChartRef, Release, is_standard_version};
pub use value::{Mapping, Value};

use crate::core::error::{ConfigError, NotFoundError, RailError, RailResult, ResultExt};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// What to load and from where
#[derive(Debug, Clone)]
pub struct LoadOpts {
  pub dir: PathBuf,
  pub environments_dir: PathBuf,
  pub release_filter: ReleaseFilter,
}

impl LoadOpts {
  pub fn new(dir: impl Into<PathBuf>) -> Self {
    Self {
      dir: dir.into(),
      environments_dir: PathBuf::from("environments"),
      release_filter: ReleaseFilter::All,
    }
  }
}

/// All environments and releases of a catalog checkout
#[derive(Debug, Clone)]
pub struct Catalog {
  pub dir: PathBuf,
  /// Sorted by (`spec.order`, name)
  pub environments: Vec<Arc<Environment>>,
  /// Grouped by environment in environment order, then by file path
  pub releases: Vec<Release>,
  pub release_filter: ReleaseFilter,
}

impl Catalog {
  pub fn load(opts: &LoadOpts) -> RailResult<Self> {
    let env_root = opts.dir.join(&opts.environments_dir);
    if !env_root.is_dir() {
      return Err(RailError::Config(ConfigError::CatalogNotFound { dir: env_root }));
    }

    let mut environments = Vec::new();
    for path in sorted_entries(&env_root)? {
      if path.is_file() && is_yaml(&path) {
        let env = Environment::load(&path).with_context(|| format!("loading environment {}", path.display()))?;
        tracing::debug!(environment = %env.name, path = %path.display(), "loaded environment");
        environments.push(env);
      }
    }
    environments.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.name.cmp(&b.name)));

    let mut seen = HashSet::new();
    for env in &environments {
      if !seen.insert(env.name.clone()) {
        return Err(RailError::message(format!("duplicate environment name: {}", env.name)));
      }
    }
    let environments: Vec<Arc<Environment>> = environments.into_iter().map(Arc::new).collect();

    let mut releases = Vec::new();
    for env in &environments {
      let releases_dir = env.releases_dir();
      if !releases_dir.is_dir() {
        continue;
      }
      let mut files = Vec::new();
      collect_release_files(&releases_dir, &mut files)?;
      let mut names = HashSet::new();
      for path in files {
        let release = Release::load(&path, env.clone()).with_context(|| format!("loading release {}", path.display()))?;
        if !opts.release_filter.matches(&release.name) {
          continue;
        }
        if !names.insert(release.name.clone()) {
          return Err(RailError::message(format!(
            "duplicate release name {} in environment {}",
            release.name, env.name
          )));
        }
        releases.push(release);
      }
    }
    tracing::debug!(
      environments = environments.len(),
      releases = releases.len(),
      "loaded catalog from {}",
      opts.dir.display()
    );

    Ok(Self {
      dir: opts.dir.clone(),
      environments,
      releases,
      release_filter: opts.release_filter.clone(),
    })
  }

  pub fn environment(&self, name: &str) -> RailResult<Arc<Environment>> {
    get_environment_by_name(&self.environments, name)
  }

  pub fn releases_in<'a>(&'a self, environment: &str) -> impl Iterator<Item = &'a Release> + use<'a> {
    let environment = environment.to_string();
    self.releases.iter().filter(move |r| r.environment.name == environment)
  }

  pub fn release(&self, name: &str, environment: &str) -> RailResult<&Release> {
    self.environment(environment)?;
    self
      .releases
      .iter()
      .find(|r| r.environment.name == environment && r.name == name)
      .ok_or_else(|| {
        RailError::NotFound(NotFoundError::Release {
          name: name.to_string(),
          environment: Some(environment.to_string()),
        })
      })
  }
}

fn sorted_entries(dir: &Path) -> RailResult<Vec<PathBuf>> {
  let mut entries = fs::read_dir(dir)
    .with_context(|| format!("reading {}", dir.display()))?
    .map(|entry| entry.map(|e| e.path()))
    .collect::<Result<Vec<_>, _>>()?;
  entries.sort();
  Ok(entries)
}

fn collect_release_files(dir: &Path, out: &mut Vec<PathBuf>) -> RailResult<()> {
  for path in sorted_entries(dir)? {
    if path.is_dir() {
      collect_release_files(&path, out)?;
    } else if path
      .file_name()
      .map(|n| n.to_string_lossy().ends_with(".release.yaml"))
      .unwrap_or(false)
    {
      out.push(path);
    }
  }
  Ok(())
}

fn is_yaml(path: &Path) -> bool {
  matches!(path.extension().and_then(|e| e.to_str()), Some("yaml" | "yml"))
}
