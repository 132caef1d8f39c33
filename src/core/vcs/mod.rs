//! Version control collaborators
//!
//! Promotion only needs a handful of git operations and one pull-request call,
//! so both sit behind small traits. [`SystemGit`] and [`GitHubPullRequests`]
//! shell out to `git` and `gh`; tests substitute recording doubles.

pub mod pull_request;
pub mod system_git;

pub use pull_request::{GitHubPullRequests, PullRequest, PullRequestProvider};
pub use system_git::SystemGit;

use crate::core::error::RailResult;

/// Git operations used by a promotion run
pub trait GitProvider {
  /// Fails unless the working copy has no changes and is not behind its upstream
  fn ensure_clean_and_up_to_date(&self) -> RailResult<()>;

  fn current_branch(&self) -> RailResult<String>;

  fn create_and_checkout_branch(&self, branch: &str) -> RailResult<()>;

  /// Stage every change and commit it
  fn commit_all(&self, message: &str) -> RailResult<()>;

  fn push(&self, remote: &str, branch: &str) -> RailResult<()>;

  fn checkout(&self, branch: &str) -> RailResult<()>;
}
