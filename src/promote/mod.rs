//! Release promotion between environments
//!
//! [`Promotion::run`] drives one promotion end to end:
//!
//! ```text
//! clean check → source → target → policy → list → select → validate
//!   → preview → pull-request choice → write files → commit/push → PR
//! ```
//!
//! Every interactive step goes through [`PromotionPrompts`]; cancellation at
//! any step ends the run with [`PromotionOutcome::Canceled`] and no changes.
//! Dry runs follow the same path and stop right before the first write.

pub mod message;
pub mod prompts;

pub use prompts::{PromotionPrompts, PullRequestChoice};

use crate::catalog::{Catalog, Environment, get_environment_by_name};
use crate::core::config::PromotionConfig;
use crate::core::error::{RailError, RailResult, ResultExt};
use crate::core::vcs::{GitProvider, PullRequest, PullRequestProvider};
use crate::cross::CrossReleaseList;
use crate::graph::PromotionGraph;
use crate::prompt::{Prompt, Selection};
use std::sync::Arc;
use tracing::debug;

/// Inputs of one promotion run
#[derive(Debug, Clone, Default)]
pub struct PromotionOpts {
  /// Source environment name; prompted for when absent
  pub source: Option<String>,
  /// Target environment name; prompted for when absent
  pub target: Option<String>,
  /// Explicit release names; prompted for when empty
  pub releases: Vec<String>,
  /// Environments offered by the source/target prompts (empty = all)
  pub selected_environments: Vec<String>,
  pub auto_merge: bool,
  pub draft: bool,
  pub no_prompt: bool,
  pub dry_run: bool,
  /// Colour preview diffs
  pub color: bool,
}

/// Result of a promotion run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromotionOutcome {
  Created { url: String, releases: Vec<String> },
  DryRun { releases: Vec<String> },
  NothingToPromote,
  Canceled,
}

/// How the pull request will be opened once the user has decided
#[derive(Debug, Clone, Copy)]
struct PerformOpts {
  auto_merge: bool,
  draft: bool,
}

/// Collaborators and catalog state for promotions
pub struct Promotion<'a> {
  catalog: &'a Catalog,
  graph: &'a PromotionGraph,
  config: &'a PromotionConfig,
  git: &'a dyn GitProvider,
  pull_requests: &'a dyn PullRequestProvider,
}

impl<'a> Promotion<'a> {
  pub fn new(
    catalog: &'a Catalog,
    graph: &'a PromotionGraph,
    config: &'a PromotionConfig,
    git: &'a dyn GitProvider,
    pull_requests: &'a dyn PullRequestProvider,
  ) -> Self {
    Self {
      catalog,
      graph,
      config,
      git,
      pull_requests,
    }
  }

  pub fn run(&self, prompt: &mut dyn Prompt, opts: &PromotionOpts) -> RailResult<PromotionOutcome> {
    let mut prompts = PromotionPrompts::new(prompt, opts.color);

    if opts.dry_run {
      prompts.print_dry_run();
    }

    self
      .git
      .ensure_clean_and_up_to_date()
      .context("checking working copy")?;

    let environments =
      crate::catalog::get_environments_by_names(&self.catalog.environments, &opts.selected_environments);

    let source = match &opts.source {
      Some(name) => get_environment_by_name(&self.catalog.environments, name)?,
      None => {
        let candidates = self.graph.source_candidates(&environments)?;
        match prompts.select_source_environment(&candidates)? {
          Selection::Selected(env) => env,
          Selection::Canceled => return Ok(canceled(&mut prompts)),
        }
      }
    };

    let target = match &opts.target {
      Some(name) => get_environment_by_name(&self.catalog.environments, name)?,
      None => {
        let candidates = self.graph.target_candidates(&environments, &source.name)?;
        match prompts.select_target_environment(&candidates)? {
          Selection::Selected(env) => env,
          Selection::Canceled => return Ok(canceled(&mut prompts)),
        }
      }
    };

    self.graph.validate_promotion(&source.name, &target, opts.auto_merge)?;
    debug!(source = %source.name, target = %target.name, "promotion validated");

    let list = CrossReleaseList::build(&self.catalog.environments, &self.catalog.releases)
      .get_releases_for_promotion(&source.name, &target.name)
      .context("getting releases for promotion")?;

    if !list.has_any_promotable_releases() {
      prompts.print_no_promotable_releases_found(self.catalog.release_filter.is_filtered(), &source.name, &target.name);
      return Ok(PromotionOutcome::NothingToPromote);
    }

    let selected = if opts.releases.is_empty() {
      match prompts.select_releases(&list)? {
        Selection::Selected(selected) => selected,
        Selection::Canceled => return Ok(canceled(&mut prompts)),
      }
    } else {
      list.only_specific_releases(&opts.releases)
    };

    let non_promotable = selected.get_non_promotable_releases(&source.name, &target.name);
    if !non_promotable.is_empty() {
      prompts.print_selected_non_promotable_releases(&non_promotable, &target.name);
      return Err(RailError::NonPromotable {
        target: target.name.clone(),
        releases: non_promotable,
      });
    }

    if !selected.has_any_promotable_releases() {
      prompts.print_nothing_selected();
      return Ok(PromotionOutcome::NothingToPromote);
    }

    if !opts.no_prompt {
      preview(&mut prompts, &selected, &target);
    }

    let mut perform = PerformOpts {
      auto_merge: opts.auto_merge,
      draft: opts.draft,
    };

    if !opts.no_prompt {
      if opts.auto_merge || opts.draft {
        match prompts.confirm_creating_promotion_pull_request(opts.auto_merge, opts.draft)? {
          Selection::Selected(true) => {}
          Selection::Selected(false) | Selection::Canceled => return Ok(canceled(&mut prompts)),
        }
      } else {
        match prompts.select_creating_promotion_pull_request()? {
          Selection::Selected(PullRequestChoice::Ready) => {
            if target.promotion.allow_auto_merge {
              match prompts.confirm_auto_merge_pull_request()? {
                Selection::Selected(confirmed) => perform.auto_merge = confirmed,
                Selection::Canceled => return Ok(canceled(&mut prompts)),
              }
            }
          }
          Selection::Selected(PullRequestChoice::Draft) => perform.draft = true,
          Selection::Selected(PullRequestChoice::Cancel) | Selection::Canceled => {
            return Ok(canceled(&mut prompts));
          }
        }
      }
    }

    self.perform(&mut prompts, &selected, &source, &target, perform, opts.dry_run)
  }

  fn perform(
    &self,
    prompts: &mut PromotionPrompts<'_>,
    list: &CrossReleaseList,
    source: &Environment,
    target: &Environment,
    perform: PerformOpts,
    dry_run: bool,
  ) -> RailResult<PromotionOutcome> {
    let promoted = message::promoted_releases(list);
    let names: Vec<String> = promoted.iter().map(|r| r.name.clone()).collect();

    if dry_run {
      prompts.print(&format!(
        "ℹ️ Dry run: would promote {} release(s) from {} to {}: {}",
        names.len(),
        source.name,
        target.name,
        names.join(", ")
      ));
      return Ok(PromotionOutcome::DryRun { releases: names });
    }

    let data = message::template_data(&source.name, &target.name, &promoted);
    let commit_message = message::render(&self.config.commit_template, &data, "commit")?;
    let title = message::render(&self.config.pull_request_title_template, &data, "pull request title")?;
    let body = message::render(&self.config.pull_request_body_template, &data, "pull request body")?;

    let original_branch = self.git.current_branch()?;
    let branch = message::branch_name(&self.config.branch_prefix, &source.name, &target.name, list);
    self.git.create_and_checkout_branch(&branch)?;

    for item in list.promotable() {
      if let Some(release) = &item.promoted {
        release
          .file
          .write_yaml()
          .with_context(|| format!("writing promoted release {}", item.name))?;
      }
    }

    self.git.commit_all(&commit_message)?;
    self.git.push(&self.config.remote, &branch)?;

    let mut labels = Vec::new();
    if perform.auto_merge {
      labels.push(self.config.auto_merge_label.clone());
    }
    let url = self.pull_requests.create(&PullRequest {
      title,
      body,
      branch: branch.clone(),
      draft: perform.draft,
      labels,
    })?;

    self.git.checkout(&original_branch)?;
    prompts.print(&format!("🎉 Created promotion pull request: {}", url));

    Ok(PromotionOutcome::Created { url, releases: names })
  }
}

fn canceled(prompts: &mut PromotionPrompts<'_>) -> PromotionOutcome {
  prompts.print_canceled();
  PromotionOutcome::Canceled
}

fn preview(prompts: &mut PromotionPrompts<'_>, list: &CrossReleaseList, target: &Arc<Environment>) {
  prompts.print_start_preview();
  for item in list.promotable() {
    let Some(promoted) = &item.promoted else {
      continue;
    };
    let before = item.releases.get(1).and_then(Option::as_ref).map(|r| &r.file);
    prompts.print_release_preview(&target.name, &item.name, before, &promoted.file);
  }
  prompts.print_end_preview();
}

#[cfg(test)]
mod tests;
