//! Promotion graph built from `spec.promotion.fromEnvironments` + petgraph
//!
//! ## Graph Structure
//!
//! - **Directed Graph**: `A → B` means "B accepts promotions from A"
//! - **Nodes**: Environments, in catalog order
//! - **Index**: environment name → node index
//!
//! No transitive closure is computed: `staging → qa → prod` does not make
//! staging promotable to prod.

use crate::catalog::Environment;
use crate::core::error::{GraphError, RailResult};
use petgraph::algo;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;
use std::sync::Arc;

/// Directed promotion graph over the catalog's environments
pub struct PromotionGraph {
  graph: DiGraph<Arc<Environment>, ()>,
  name_to_node: HashMap<String, NodeIndex>,
}

impl PromotionGraph {
  /// Build the graph. Unknown or self-referencing sources produce no edge.
  pub fn build(environments: &[Arc<Environment>]) -> Self {
    let mut graph = DiGraph::new();
    let mut name_to_node = HashMap::new();

    for env in environments {
      let idx = graph.add_node(env.clone());
      name_to_node.insert(env.name.clone(), idx);
    }

    for env in environments {
      let target = name_to_node[&env.name];
      for source in &env.promotion.from_environments {
        if source == &env.name {
          tracing::warn!(environment = %env.name, "ignoring promotion from environment to itself");
          continue;
        }
        match name_to_node.get(source) {
          Some(&from) => {
            if !graph.contains_edge(from, target) {
              graph.add_edge(from, target, ());
            }
          }
          None => {
            tracing::warn!(environment = %env.name, source = %source, "ignoring promotion from unknown environment");
          }
        }
      }
    }
    tracing::debug!(nodes = graph.node_count(), edges = graph.edge_count(), "built promotion graph");

    Self { graph, name_to_node }
  }

  /// Environments within `within` that can promote to another environment in `within`
  pub fn source_candidates(&self, within: &[Arc<Environment>]) -> RailResult<Vec<Arc<Environment>>> {
    let candidates: Vec<_> = within
      .iter()
      .filter(|source| {
        within
          .iter()
          .any(|target| target.name != source.name && self.is_promotable(&source.name, &target.name))
      })
      .cloned()
      .collect();
    if candidates.is_empty() {
      return Err(GraphError::NoSourceEnvironments.into());
    }
    Ok(candidates)
  }

  /// Environments within `within` that accept promotions from `source`
  pub fn target_candidates(&self, within: &[Arc<Environment>], source: &str) -> RailResult<Vec<Arc<Environment>>> {
    let candidates: Vec<_> = within
      .iter()
      .filter(|target| target.name != source && self.is_promotable(source, &target.name))
      .cloned()
      .collect();
    if candidates.is_empty() {
      return Err(
        GraphError::NoTargetEnvironments {
          source: source.to_string(),
        }
        .into(),
      );
    }
    Ok(candidates)
  }

  /// Whether `target` lists `source` in its allowed sources
  pub fn is_promotable(&self, source: &str, target: &str) -> bool {
    match (self.name_to_node.get(source), self.name_to_node.get(target)) {
      (Some(&from), Some(&to)) => self.graph.contains_edge(from, to),
      _ => false,
    }
  }

  /// Check the edge and the auto-merge policy for a chosen pair
  pub fn validate_promotion(&self, source: &str, target: &Environment, auto_merge: bool) -> RailResult<()> {
    if auto_merge && !target.promotion.allow_auto_merge {
      return Err(
        GraphError::AutoMergeNotAllowed {
          target: target.name.clone(),
        }
        .into(),
      );
    }
    if !self.is_promotable(source, &target.name) {
      return Err(
        GraphError::NotPromotable {
          source: source.to_string(),
          target: target.name.clone(),
        }
        .into(),
      );
    }
    Ok(())
  }

  /// Names of the environments `source` can promote to, in catalog order
  pub fn targets_of(&self, source: &str) -> Vec<String> {
    let Some(&from) = self.name_to_node.get(source) else {
      return Vec::new();
    };
    let mut targets: Vec<NodeIndex> = self.graph.neighbors(from).collect();
    targets.sort();
    targets.into_iter().map(|idx| self.graph[idx].name.clone()).collect()
  }

  pub fn has_cycle(&self) -> bool {
    algo::is_cyclic_directed(&self.graph)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::catalog::YamlFile;

  fn env(name: &str, from: &[&str], auto_merge: bool) -> Arc<Environment> {
    let raw = format!(
      "metadata:\n  name: {}\nspec:\n  promotion:\n    fromEnvironments: [{}]\n    allowAutoMerge: {}\n",
      name,
      from.join(", "),
      auto_merge
    );
    let file = YamlFile::parse(format!("/c/environments/{}.yaml", name), raw).unwrap();
    Arc::new(Environment::from_file(file).unwrap())
  }

  fn envs() -> Vec<Arc<Environment>> {
    vec![
      env("dev", &[], false),
      env("staging", &["dev"], true),
      env("prod", &["staging", "unknown", "prod"], false),
    ]
  }

  #[test]
  fn test_candidates() {
    let envs = envs();
    let graph = PromotionGraph::build(&envs);
    let sources: Vec<_> = graph.source_candidates(&envs).unwrap().iter().map(|e| e.name.clone()).collect();
    assert_eq!(sources, vec!["dev", "staging"]);
    let targets: Vec<_> = graph
      .target_candidates(&envs, "staging")
      .unwrap()
      .iter()
      .map(|e| e.name.clone())
      .collect();
    assert_eq!(targets, vec!["prod"]);
    assert_eq!(graph.targets_of("dev"), vec!["staging"]);
  }

  #[test]
  fn test_environment_without_sources_is_never_a_target() {
    let envs = envs();
    let graph = PromotionGraph::build(&envs);
    for source in &envs {
      assert!(!graph.is_promotable(&source.name, "dev"));
    }
    let err = graph.target_candidates(&envs, "prod").unwrap_err();
    assert_eq!(err.to_string(), "no target environments found to promote from prod");
  }

  #[test]
  fn test_not_symmetric_and_not_transitive() {
    let graph = PromotionGraph::build(&envs());
    assert!(graph.is_promotable("staging", "prod"));
    assert!(!graph.is_promotable("prod", "staging"));
    assert!(!graph.is_promotable("dev", "prod"));
    assert!(!graph.is_promotable("prod", "prod"));
    assert!(!graph.has_cycle());
  }

  #[test]
  fn test_restricted_selection_without_sources() {
    let envs = envs();
    let graph = PromotionGraph::build(&envs);
    let only_prod = vec![envs[2].clone()];
    assert!(matches!(
      graph.source_candidates(&only_prod).unwrap_err(),
      crate::core::error::RailError::Graph(GraphError::NoSourceEnvironments)
    ));
  }

  #[test]
  fn test_validate_promotion() {
    let envs = envs();
    let graph = PromotionGraph::build(&envs);
    assert!(graph.validate_promotion("dev", &envs[1], true).is_ok());
    assert!(matches!(
      graph.validate_promotion("staging", &envs[2], true).unwrap_err(),
      crate::core::error::RailError::Graph(GraphError::AutoMergeNotAllowed { .. })
    ));
    assert!(matches!(
      graph.validate_promotion("dev", &envs[2], false).unwrap_err(),
      crate::core::error::RailError::Graph(GraphError::NotPromotable { .. })
    ));
  }

  #[test]
  fn test_cycle_detection() {
    let envs = vec![env("a", &["b"], false), env("b", &["a"], false)];
    let graph = PromotionGraph::build(&envs);
    assert!(graph.has_cycle());
    assert!(graph.is_promotable("a", "b") && graph.is_promotable("b", "a"));
  }
}
