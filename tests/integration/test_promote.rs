//! Tests for `release promote` that stop short of pushing

use crate::helpers::*;
use anyhow::Result;

#[test]
fn test_promote_dry_run_changes_nothing() -> Result<()> {
  let catalog = TestCatalog::new()?;

  let output = run_catalog_rail(
    &catalog.path,
    &["release", "promote", "api", "-s", "staging", "-t", "prod", "--no-prompt", "--dry-run"],
  )?;
  let out = stdout(&output);
  assert!(out.contains("Dry-run mode enabled"), "{}", out);
  assert!(out.contains("would promote 1 release(s) from staging to prod: api"), "{}", out);

  assert!(catalog.status()?.is_empty());
  let branch = git(&catalog.path, &["branch", "--show-current"])?;
  assert_eq!(String::from_utf8_lossy(&branch.stdout).trim(), "main");

  Ok(())
}

#[test]
fn test_promote_in_sync_release_is_nothing_to_do() -> Result<()> {
  let catalog = TestCatalog::new()?;

  let output = run_catalog_rail(
    &catalog.path,
    &["release", "promote", "web", "-s", "staging", "-t", "prod", "--no-prompt", "--dry-run"],
  )?;
  assert!(!stdout(&output).contains("would promote"));

  Ok(())
}

#[test]
fn test_promote_requires_clean_working_copy() -> Result<()> {
  let catalog = TestCatalog::new()?;
  catalog.write_file("notes.txt", "wip\n")?;

  let output = run_catalog_rail_raw(
    &catalog.path,
    &["release", "promote", "api", "-s", "staging", "-t", "prod", "--no-prompt", "--dry-run"],
  )?;
  assert_eq!(output.status.code(), Some(2));
  assert!(stderr(&output).contains("checking working copy"));

  Ok(())
}

#[test]
fn test_promote_reverse_direction_is_rejected() -> Result<()> {
  let catalog = TestCatalog::new()?;

  let output = run_catalog_rail_raw(
    &catalog.path,
    &["release", "promote", "api", "-s", "prod", "-t", "staging", "--no-prompt", "--dry-run"],
  )?;
  assert_eq!(output.status.code(), Some(3));

  Ok(())
}

#[test]
fn test_promote_pinned_target_version_aborts() -> Result<()> {
  let catalog = TestCatalog::new()?;
  catalog.add_release("prod", "web", "spec:\n  project: frontend\n  version: 1.9-hotfix\n")?;
  catalog.commit("Pin web")?;

  let output = run_catalog_rail_raw(
    &catalog.path,
    &["release", "promote", "api,web", "-s", "staging", "-t", "prod", "--no-prompt", "--dry-run"],
  )?;
  assert_eq!(output.status.code(), Some(3));
  assert!(stderr(&output).contains("cannot promote releases with non-standard version to prod environment: web"));
  assert!(catalog.status()?.is_empty());

  Ok(())
}

#[test]
fn test_promote_auto_merge_not_allowed() -> Result<()> {
  let catalog = TestCatalog::new()?;

  let output = run_catalog_rail_raw(
    &catalog.path,
    &["release", "promote", "api", "-s", "staging", "-t", "prod", "--auto-merge", "--no-prompt", "--dry-run"],
  )?;
  assert_eq!(output.status.code(), Some(3));

  Ok(())
}
