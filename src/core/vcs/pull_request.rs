//! Pull-request creation via the `gh` CLI

use crate::core::error::{RailError, RailResult, ResultExt};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

/// A pull request to open from an already pushed branch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequest {
  pub title: String,
  pub body: String,
  pub branch: String,
  pub draft: bool,
  pub labels: Vec<String>,
}

/// Opens pull requests; returns the URL of the created pull request
pub trait PullRequestProvider {
  fn create(&self, pull_request: &PullRequest) -> RailResult<String>;
}

/// GitHub pull requests through `gh pr create`
#[derive(Debug, Clone)]
pub struct GitHubPullRequests {
  repo_path: PathBuf,
}

impl GitHubPullRequests {
  pub fn new(repo_path: &Path) -> Self {
    Self {
      repo_path: repo_path.to_path_buf(),
    }
  }

  fn args(pull_request: &PullRequest) -> Vec<String> {
    let mut args = vec![
      "pr".to_string(),
      "create".to_string(),
      "--head".to_string(),
      pull_request.branch.clone(),
      "--title".to_string(),
      pull_request.title.clone(),
      "--body".to_string(),
      pull_request.body.clone(),
    ];
    if pull_request.draft {
      args.push("--draft".to_string());
    }
    for label in &pull_request.labels {
      args.push("--label".to_string());
      args.push(label.clone());
    }
    args
  }
}

impl PullRequestProvider for GitHubPullRequests {
  fn create(&self, pull_request: &PullRequest) -> RailResult<String> {
    debug!(branch = %pull_request.branch, draft = pull_request.draft, "gh pr create");
    let output = Command::new("gh")
      .current_dir(&self.repo_path)
      .args(Self::args(pull_request))
      .output()
      .context("Failed to execute gh")?;

    if !output.status.success() {
      return Err(RailError::ExternalTool {
        tool: "gh".to_string(),
        message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
      });
    }

    // gh prints progress lines before the URL
    let stdout = String::from_utf8_lossy(&output.stdout);
    stdout
      .lines()
      .rev()
      .map(str::trim)
      .find(|line| line.starts_with("http"))
      .map(str::to_string)
      .ok_or_else(|| RailError::ExternalTool {
        tool: "gh".to_string(),
        message: format!("no pull request URL in output: {}", stdout.trim()),
      })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_gh_args() {
    let pr = PullRequest {
      title: "Promote staging to prod".into(),
      body: "- api".into(),
      branch: "catalog-rail/promote/staging-to-prod-abc".into(),
      draft: true,
      labels: vec!["auto-merge".into()],
    };
    let args = GitHubPullRequests::args(&pr);
    assert_eq!(&args[..4], &["pr", "create", "--head", "catalog-rail/promote/staging-to-prod-abc"]);
    assert!(args.contains(&"--draft".to_string()));
    assert_eq!(&args[args.len() - 2..], &["--label", "auto-merge"]);

    let ready = PullRequest {
      draft: false,
      labels: vec![],
      ..pr
    };
    assert!(!GitHubPullRequests::args(&ready).contains(&"--draft".to_string()));
  }
}
