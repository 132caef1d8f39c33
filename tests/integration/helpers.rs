//! Test helpers for integration tests

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// A catalog checkout with git history
pub struct TestCatalog {
  _root: TempDir,
  pub path: PathBuf,
}

impl TestCatalog {
  /// Empty git repository with an `environments/` directory
  pub fn empty() -> Result<Self> {
    let root = TempDir::new()?;
    let path = root.path().to_path_buf();

    git(&path, &["init", "--initial-branch=main"])?;
    git(&path, &["config", "user.name", "Test User"])?;
    git(&path, &["config", "user.email", "test@example.com"])?;
    std::fs::create_dir_all(path.join("environments"))?;

    Ok(Self { _root: root, path })
  }

  /// `staging` → `prod` catalog with `api` ahead in staging and `web` in sync
  pub fn new() -> Result<Self> {
    let catalog = Self::empty()?;
    catalog.add_environment("staging", 1, &[], false)?;
    catalog.add_environment("prod", 2, &["staging"], false)?;
    catalog.add_release(
      "staging",
      "backend/api",
      "metadata:\n  name: api\nspec:\n  project: backend\n  version: 1.0\n  values:\n    host: $ref(.Environment.Spec.Values.domain)\n    name: '{{ .Release.Name }}-{{ .Environment.Name }}'\n",
    )?;
    catalog.add_release(
      "prod",
      "backend/api",
      "metadata:\n  name: api\nspec:\n  project: backend\n  version: 0.9  # current\n  values:\n    host: $ref(.Environment.Spec.Values.domain)\n    name: '{{ .Release.Name }}-{{ .Environment.Name }}'\n",
    )?;
    catalog.add_release("staging", "web", "spec:\n  project: frontend\n  version: 2.0\n")?;
    catalog.add_release("prod", "web", "spec:\n  project: frontend\n  version: 2.0\n")?;
    catalog.commit("Initial catalog")?;
    Ok(catalog)
  }

  /// Write `environments/<name>.yaml`
  pub fn add_environment(&self, name: &str, order: i64, from: &[&str], allow_auto_merge: bool) -> Result<()> {
    let content = format!(
      "spec:\n  order: {}\n  values:\n    domain: {}.example.com\n  promotion:\n    fromEnvironments: [{}]\n    allowAutoMerge: {}\n",
      order,
      name,
      from.join(", "),
      allow_auto_merge
    );
    self.write_file(&format!("environments/{}.yaml", name), &content)
  }

  /// Write `environments/<env>/releases/<path>.release.yaml`
  pub fn add_release(&self, env: &str, path: &str, content: &str) -> Result<()> {
    self.write_file(&format!("environments/{}/releases/{}.release.yaml", env, path), content)
  }

  pub fn write_file(&self, path: &str, content: &str) -> Result<()> {
    let full = self.path.join(path);
    if let Some(parent) = full.parent() {
      std::fs::create_dir_all(parent)?;
    }
    std::fs::write(full, content)?;
    Ok(())
  }

  /// Commit current changes
  pub fn commit(&self, message: &str) -> Result<String> {
    git(&self.path, &["add", "."])?;
    git(&self.path, &["commit", "-m", message])?;

    let output = git(&self.path, &["rev-parse", "HEAD"])?;
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
  }

  /// Short porcelain status, empty when clean
  pub fn status(&self) -> Result<String> {
    let output = git(&self.path, &["status", "--porcelain"])?;
    Ok(String::from_utf8_lossy(&output.stdout).to_string())
  }

  pub fn read_file(&self, path: &str) -> Result<String> {
    Ok(std::fs::read_to_string(self.path.join(path))?)
  }
}

/// Run git command in a directory
pub fn git(cwd: &Path, args: &[&str]) -> Result<Output> {
  let output = Command::new("git")
    .current_dir(cwd)
    .args(args)
    .output()
    .context("Failed to run git command")?;

  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr);
    anyhow::bail!("Git command failed: git {}\n{}", args.join(" "), stderr);
  }

  Ok(output)
}

/// Run catalog-rail without checking the exit status
pub fn run_catalog_rail_raw(cwd: &Path, args: &[&str]) -> Result<Output> {
  Command::new(env!("CARGO_BIN_EXE_catalog-rail"))
    .current_dir(cwd)
    .args(args)
    .env_remove("CATALOG_RAIL_DIR")
    .env_remove("RUST_LOG")
    .output()
    .context("Failed to run catalog-rail")
}

/// Run catalog-rail and require success
pub fn run_catalog_rail(cwd: &Path, args: &[&str]) -> Result<Output> {
  let output = run_catalog_rail_raw(cwd, args)?;

  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);
    anyhow::bail!(
      "catalog-rail command failed: catalog-rail {}\nstdout: {}\nstderr: {}",
      args.join(" "),
      stdout,
      stderr
    );
  }

  Ok(output)
}

pub fn stdout(output: &Output) -> String {
  String::from_utf8_lossy(&output.stdout).to_string()
}

pub fn stderr(output: &Output) -> String {
  String::from_utf8_lossy(&output.stderr).to_string()
}
