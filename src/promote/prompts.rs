//! Domain prompts of the promotion flow, built on [`Prompt`]

use crate::catalog::{Environment, YamlFile};
use crate::cross::CrossReleaseList;
use crate::core::error::RailResult;
use crate::prompt::{Prompt, Selection};
use crate::ui::diff::unified_diff;
use std::sync::Arc;

/// How the promotion pull request should be opened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullRequestChoice {
  Ready,
  Draft,
  Cancel,
}

impl PullRequestChoice {
  const ALL: [PullRequestChoice; 3] = [Self::Ready, Self::Draft, Self::Cancel];

  fn label(self) -> &'static str {
    match self {
      Self::Ready => "Ready for review",
      Self::Draft => "Draft",
      Self::Cancel => "Cancel",
    }
  }
}

pub struct PromotionPrompts<'a> {
  prompt: &'a mut dyn Prompt,
  color: bool,
}

fn version_label(version: Option<&str>) -> &str {
  version.unwrap_or("-")
}

impl<'a> PromotionPrompts<'a> {
  pub fn new(prompt: &'a mut dyn Prompt, color: bool) -> Self {
    Self { prompt, color }
  }

  pub fn select_source_environment(&mut self, environments: &[Arc<Environment>]) -> RailResult<Selection<Arc<Environment>>> {
    self.select_environment("Select source environment", environments)
  }

  pub fn select_target_environment(&mut self, environments: &[Arc<Environment>]) -> RailResult<Selection<Arc<Environment>>> {
    self.select_environment("Select target environment", environments)
  }

  fn select_environment(
    &mut self,
    message: &str,
    environments: &[Arc<Environment>],
  ) -> RailResult<Selection<Arc<Environment>>> {
    let names: Vec<String> = environments.iter().map(|env| env.name.clone()).collect();
    Ok(
      self
        .prompt
        .select_one(message, &names)?
        .map(|index| environments[index].clone()),
    )
  }

  /// Multi-select over the promotable rows; the result keeps list order
  pub fn select_releases(&mut self, list: &CrossReleaseList) -> RailResult<Selection<CrossReleaseList>> {
    let candidates: Vec<String> = list.promotable().map(|item| item.name.clone()).collect();
    let width = candidates.iter().map(String::len).max().unwrap_or(0);
    let labels: Vec<String> = list
      .promotable()
      .map(|item| {
        let source = item.releases.first().and_then(Option::as_ref);
        let target = item.releases.get(1).and_then(Option::as_ref);
        format!(
          "{:<width$}  {} → {}",
          item.name,
          version_label(source.and_then(|r| r.version.as_deref())),
          version_label(target.and_then(|r| r.version.as_deref())),
          width = width
        )
      })
      .collect();

    Ok(
      self
        .prompt
        .select_many("Select releases to promote", &labels)?
        .map(|indices| {
          let names: Vec<String> = indices.into_iter().map(|i| candidates[i].clone()).collect();
          list.only_specific_releases(&names)
        }),
    )
  }

  pub fn confirm_creating_promotion_pull_request(&mut self, auto_merge: bool, draft: bool) -> RailResult<Selection<bool>> {
    let kind = if auto_merge {
      "an auto-merge"
    } else if draft {
      "a draft"
    } else {
      "a"
    };
    self
      .prompt
      .confirm(&format!("Create {} promotion pull request?", kind), true)
  }

  pub fn select_creating_promotion_pull_request(&mut self) -> RailResult<Selection<PullRequestChoice>> {
    let labels: Vec<String> = PullRequestChoice::ALL.iter().map(|c| c.label().to_string()).collect();
    Ok(
      self
        .prompt
        .select_one("Create promotion pull request?", &labels)?
        .map(|index| PullRequestChoice::ALL[index]),
    )
  }

  pub fn confirm_auto_merge_pull_request(&mut self) -> RailResult<Selection<bool>> {
    self.prompt.confirm("Auto-merge the pull request once checks pass?", false)
  }

  pub fn print_dry_run(&mut self) {
    self.prompt.print("ℹ️ Dry-run mode enabled: No changes will be made.");
  }

  pub fn print_canceled(&mut self) {
    self.prompt.print("❌ Canceled");
  }

  pub fn print_no_promotable_releases_found(&mut self, releases_filtered: bool, source: &str, target: &str) {
    let filter_note = if releases_filtered {
      " (releases are filtered; run `catalog-rail release select --all` to include every release)"
    } else {
      ""
    };
    self.prompt.print(&format!(
      "🤷 No promotable releases found from {} to {}{}",
      source, target, filter_note
    ));
  }

  pub fn print_nothing_selected(&mut self) {
    self.prompt.print("🤷 No releases selected");
  }

  pub fn print_selected_non_promotable_releases(&mut self, releases: &[String], target: &str) {
    self.prompt.print(&format!(
      "🚫 Selected releases have pinned or custom versions in {}: {}",
      target,
      releases.join(", ")
    ));
  }

  pub fn print_start_preview(&mut self) {
    self.prompt.print("🔍 Preview of changes:");
  }

  /// Diff of one target release file before and after promotion
  pub fn print_release_preview(&mut self, target: &str, release: &str, before: Option<&YamlFile>, after: &YamlFile) {
    let old = before.map(YamlFile::raw).unwrap_or("");
    let header = if before.is_some() {
      format!("📝 {} / {}", target, release)
    } else {
      format!("📝 {} / {} (new file)", target, release)
    };
    let path = after.path().display().to_string();
    let diff = unified_diff(old, after.raw(), &path, &path, self.color);
    self.prompt.print(&format!("{}\n{}", header, diff.trim_end()));
  }

  pub fn print_end_preview(&mut self) {
    self.prompt.print("");
  }

  pub fn print(&mut self, text: &str) {
    self.prompt.print(text);
  }
}
