//! System git backend
//!
//! Every operation is one `git` subprocess with an isolated environment.

use super::GitProvider;
use crate::core::error::{GitError, RailError, RailResult, ResultExt};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tracing::debug;

/// Git backend using the system `git` binary
#[derive(Debug, Clone)]
pub struct SystemGit {
  /// Directory git commands run in
  repo_path: PathBuf,

  /// Working tree root
  work_tree: PathBuf,
}

impl SystemGit {
  /// Open the repository containing `path`
  pub fn open(path: &Path) -> RailResult<Self> {
    let output = Command::new("git")
      .arg("-C")
      .arg(path)
      .args(["rev-parse", "--show-toplevel"])
      .output()
      .context("Failed to execute git rev-parse")?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      if stderr.contains("not a git repository") {
        return Err(RailError::Git(GitError::RepoNotFound {
          path: path.to_path_buf(),
        }));
      }
      return Err(RailError::message(format!("Failed to open git repository: {}", stderr)));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    Ok(Self {
      repo_path: path.to_path_buf(),
      work_tree: PathBuf::from(stdout.trim()),
    })
  }

  pub fn work_tree(&self) -> &Path {
    &self.work_tree
  }

  /// Run git and return trimmed stdout, mapping a non-zero exit to `GitError::CommandFailed`
  fn run(&self, args: &[&str]) -> RailResult<String> {
    Ok(self.run_raw(args)?.trim().to_string())
  }

  /// Like `run`, but stdout is returned byte-for-byte
  fn run_raw(&self, args: &[&str]) -> RailResult<String> {
    let output = self.output(args)?;
    if !output.status.success() {
      return Err(RailError::Git(GitError::CommandFailed {
        command: format!("git {}", args.join(" ")),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
      }));
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
  }

  fn output(&self, args: &[&str]) -> RailResult<Output> {
    debug!(repo = %self.repo_path.display(), "git {}", args.join(" "));
    self
      .git_cmd()
      .args(args)
      .output()
      .with_context(|| format!("Failed to execute git {}", args.join(" ")))
  }

  /// Upstream of the current branch, if one is configured
  fn upstream(&self) -> RailResult<Option<String>> {
    let output = self.output(&["rev-parse", "--abbrev-ref", "--symbolic-full-name", "@{upstream}"])?;
    if !output.status.success() {
      return Ok(None);
    }
    let upstream = String::from_utf8_lossy(&output.stdout).trim().to_string();
    Ok((!upstream.is_empty()).then_some(upstream))
  }

  /// Create a safe git command with isolated environment
  ///
  /// - Sets working directory to repo path
  /// - Clears environment variables
  /// - Whitelists only PATH and HOME
  /// - Adds safe configuration overrides
  fn git_cmd(&self) -> Command {
    let mut cmd = Command::new("git");

    cmd.arg("-C").arg(&self.repo_path);

    cmd.env_clear();
    if let Ok(path) = std::env::var("PATH") {
      cmd.env("PATH", path);
    }
    if let Ok(home) = std::env::var("HOME") {
      cmd.env("HOME", home);
    }

    cmd.arg("-c").arg("advice.detachedHead=false");
    cmd.arg("-c").arg("core.quotePath=false");

    cmd
  }
}

/// Paths listed by `git status --porcelain -z` (`XY path`, NUL-terminated;
/// renames and copies are followed by their source path)
fn parse_porcelain(stdout: &str) -> Vec<String> {
  let mut changes = Vec::new();
  let mut entries = stdout.split('\0');
  while let Some(entry) = entries.next() {
    let Some(path) = entry.get(3..).filter(|p| !p.is_empty()) else {
      continue;
    };
    changes.push(path.to_string());
    if matches!(entry.as_bytes().first(), Some(b'R' | b'C')) {
      entries.next();
    }
  }
  changes
}

impl GitProvider for SystemGit {
  fn ensure_clean_and_up_to_date(&self) -> RailResult<()> {
    let changes = parse_porcelain(&self.run_raw(&["status", "--porcelain", "-z"])?);
    if !changes.is_empty() {
      return Err(RailError::Git(GitError::DirtyWorkingCopy { changes }));
    }

    let Some(upstream) = self.upstream()? else {
      debug!("no upstream configured for the current branch; skipping up-to-date check");
      return Ok(());
    };

    self.run(&["fetch", "--quiet"])?;
    let behind = self.run(&["rev-list", "--count", "HEAD..@{upstream}"])?;
    let commits = behind
      .parse::<usize>()
      .map_err(|e| RailError::message(format!("unexpected rev-list output {:?}: {}", behind, e)))?;
    if commits > 0 {
      return Err(RailError::Git(GitError::BehindUpstream { upstream, commits }));
    }
    Ok(())
  }

  fn current_branch(&self) -> RailResult<String> {
    self.run(&["rev-parse", "--abbrev-ref", "HEAD"])
  }

  fn create_and_checkout_branch(&self, branch: &str) -> RailResult<()> {
    self.run(&["checkout", "-b", branch])?;
    Ok(())
  }

  fn commit_all(&self, message: &str) -> RailResult<()> {
    self.run(&["add", "-A"])?;
    self.run(&["commit", "--quiet", "-m", message])?;
    Ok(())
  }

  fn push(&self, remote: &str, branch: &str) -> RailResult<()> {
    let output = self.output(&["push", "-u", remote, branch])?;
    if !output.status.success() {
      return Err(RailError::Git(GitError::PushFailed {
        remote: remote.to_string(),
        branch: branch.to_string(),
        reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
      }));
    }
    Ok(())
  }

  fn checkout(&self, branch: &str) -> RailResult<()> {
    self.run(&["checkout", branch])?;
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::fs;

  fn git(dir: &Path, args: &[&str]) {
    let status = Command::new("git").arg("-C").arg(dir).args(args).status().unwrap();
    assert!(status.success(), "git {:?} failed", args);
  }

  fn init_repo() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    git(dir.path(), &["init", "--quiet", "-b", "main"]);
    git(dir.path(), &["config", "user.name", "Test"]);
    git(dir.path(), &["config", "user.email", "test@example.com"]);
    git(dir.path(), &["config", "commit.gpgsign", "false"]);
    fs::write(dir.path().join("README.md"), "catalog\n").unwrap();
    git(dir.path(), &["add", "-A"]);
    git(dir.path(), &["commit", "--quiet", "-m", "init"]);
    dir
  }

  #[test]
  fn test_parse_porcelain() {
    let changes = parse_porcelain(" M x\0?? new.yaml\0R  prod/api.yaml\0staging/api.yaml\0");
    assert_eq!(changes, vec!["x", "new.yaml", "prod/api.yaml"]);
    assert!(parse_porcelain("").is_empty());
  }

  #[test]
  fn test_unstaged_change_to_short_name_is_dirty() {
    let repo = init_repo();
    fs::write(repo.path().join("x"), "one\n").unwrap();
    git(repo.path(), &["add", "x"]);
    git(repo.path(), &["commit", "--quiet", "-m", "add x"]);
    let git_provider = SystemGit::open(repo.path()).unwrap();
    git_provider.ensure_clean_and_up_to_date().unwrap();

    fs::write(repo.path().join("x"), "two\n").unwrap();
    let err = git_provider.ensure_clean_and_up_to_date().unwrap_err();
    assert!(matches!(err, RailError::Git(GitError::DirtyWorkingCopy { ref changes }) if changes == &["x"]));
  }

  #[test]
  fn test_open_outside_repository() {
    let dir = tempfile::tempdir().unwrap();
    let err = SystemGit::open(dir.path()).unwrap_err();
    assert!(matches!(err, RailError::Git(GitError::RepoNotFound { .. })));
  }

  #[test]
  fn test_clean_check_and_commit() {
    let repo = init_repo();
    let git_provider = SystemGit::open(repo.path()).unwrap();
    git_provider.ensure_clean_and_up_to_date().unwrap();
    assert_eq!(git_provider.current_branch().unwrap(), "main");

    fs::write(repo.path().join("README.md"), "changed\n").unwrap();
    let err = git_provider.ensure_clean_and_up_to_date().unwrap_err();
    assert!(matches!(err, RailError::Git(GitError::DirtyWorkingCopy { ref changes }) if changes == &["README.md"]));

    git_provider.create_and_checkout_branch("promote/test").unwrap();
    git_provider.commit_all("update readme").unwrap();
    git_provider.ensure_clean_and_up_to_date().unwrap();
    assert_eq!(git_provider.current_branch().unwrap(), "promote/test");

    git_provider.checkout("main").unwrap();
    assert_eq!(fs::read_to_string(repo.path().join("README.md")).unwrap(), "catalog\n");
  }
}
