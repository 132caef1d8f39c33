//! Catalog context - build once, pass everywhere
//!
//! Commands receive a [`CatalogContext`] holding the config, the loaded
//! catalog and its promotion graph, so nothing is read from disk twice.

use crate::catalog::{Catalog, Environment, LoadOpts, ReleaseFilter, get_environments_by_names};
use crate::core::config::CatalogRailConfig;
use crate::core::error::RailResult;
use crate::cross::CrossReleaseList;
use crate::graph::PromotionGraph;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub struct CatalogContext {
  /// Catalog root directory
  pub root: PathBuf,

  /// catalog-rail.toml (defaults when absent)
  pub config: Arc<CatalogRailConfig>,

  pub catalog: Catalog,

  pub graph: Arc<PromotionGraph>,
}

impl CatalogContext {
  /// Load config, catalog and graph. `release_patterns` overrides the saved release selection.
  pub fn build(root: &Path, release_patterns: Option<&str>) -> RailResult<Self> {
    let config = CatalogRailConfig::load(root)?;
    let filter = ReleaseFilter::resolve(release_patterns, &config.selection.releases)?;
    Self::with_filter(root, config, filter)
  }

  /// Load every release regardless of the saved selection
  pub fn build_unfiltered(root: &Path) -> RailResult<Self> {
    let config = CatalogRailConfig::load(root)?;
    Self::with_filter(root, config, ReleaseFilter::All)
  }

  fn with_filter(root: &Path, config: CatalogRailConfig, release_filter: ReleaseFilter) -> RailResult<Self> {
    let opts = LoadOpts {
      dir: root.to_path_buf(),
      environments_dir: config.catalog.environments_dir.clone(),
      release_filter,
    };
    let catalog = Catalog::load(&opts)?;
    let graph = Arc::new(PromotionGraph::build(&catalog.environments));

    Ok(Self {
      root: root.to_path_buf(),
      config: Arc::new(config),
      catalog,
      graph,
    })
  }

  /// Environments in the saved selection, in catalog order
  pub fn selected_environments(&self) -> Vec<Arc<Environment>> {
    get_environments_by_names(&self.catalog.environments, &self.config.selection.environments)
  }

  /// Rows for every loaded release, one column per selected environment
  pub fn cross_releases(&self) -> CrossReleaseList {
    CrossReleaseList::build(&self.selected_environments(), &self.catalog.releases)
  }
}
