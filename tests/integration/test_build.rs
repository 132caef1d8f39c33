//! Tests for `build promote`

use crate::helpers::*;
use anyhow::Result;

#[test]
fn test_build_promote_edits_version_in_place() -> Result<()> {
  let catalog = TestCatalog::new()?;

  let output = run_catalog_rail(
    &catalog.path,
    &["build", "promote", "--env", "prod", "--project", "backend", "1.2"],
  )?;
  let out = stdout(&output);
  assert!(out.contains("✅ Promoted release api to version 1.2"));
  assert!(out.contains("🍺 Promoted 1 release(s) of project backend in environment prod to version 1.2"));

  let api = catalog.read_file("environments/prod/releases/backend/api.release.yaml")?;
  assert!(api.contains("  version: 1.2  # current\n"), "{}", api);
  let staging = catalog.read_file("environments/staging/releases/backend/api.release.yaml")?;
  assert!(staging.contains("version: 1.0\n"));

  Ok(())
}

#[test]
fn test_build_promote_ignores_release_selection() -> Result<()> {
  let catalog = TestCatalog::new()?;
  run_catalog_rail(&catalog.path, &["release", "select", "web"])?;

  run_catalog_rail(
    &catalog.path,
    &["build", "promote", "--env", "staging", "--project", "backend", "1.1"],
  )?;
  let api = catalog.read_file("environments/staging/releases/backend/api.release.yaml")?;
  assert!(api.contains("version: 1.1\n"));

  Ok(())
}

#[test]
fn test_build_promote_unknown_project() -> Result<()> {
  let catalog = TestCatalog::new()?;

  let output = run_catalog_rail_raw(
    &catalog.path,
    &["build", "promote", "--env", "prod", "--project", "mobile", "1.0"],
  )?;
  assert_eq!(output.status.code(), Some(1));
  assert!(stderr(&output).contains("no releases found for project mobile"));
  assert!(catalog.status()?.is_empty());

  Ok(())
}
