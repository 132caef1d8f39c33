//! Error reporting and exit codes

use crate::helpers::*;
use anyhow::Result;

#[test]
fn test_missing_catalog() -> Result<()> {
  let dir = tempfile::TempDir::new()?;

  let output = run_catalog_rail_raw(dir.path(), &["env", "list"])?;
  assert_eq!(output.status.code(), Some(1));
  assert!(stderr(&output).contains("No catalog found."));

  Ok(())
}

#[test]
fn test_catalog_dir_flag() -> Result<()> {
  let catalog = TestCatalog::new()?;
  let elsewhere = tempfile::TempDir::new()?;
  let dir = catalog.path.to_string_lossy().to_string();

  let output = run_catalog_rail(elsewhere.path(), &["--catalog-dir", &dir, "release", "list", "--json"])?;
  let json: serde_json::Value = serde_json::from_slice(&output.stdout)?;
  assert_eq!(json["releases"].as_array().map(Vec::len), Some(2));

  Ok(())
}

#[test]
fn test_invalid_config_is_reported() -> Result<()> {
  let catalog = TestCatalog::new()?;
  catalog.write_file("catalog-rail.toml", "[promotion]\nbranch_prefix = \"\"\n")?;

  let output = run_catalog_rail_raw(&catalog.path, &["env", "list"])?;
  assert_eq!(output.status.code(), Some(1));
  assert!(stderr(&output).contains("promotion.branch_prefix"));

  Ok(())
}

#[test]
fn test_unknown_release_in_environment() -> Result<()> {
  let catalog = TestCatalog::new()?;

  let output = run_catalog_rail_raw(&catalog.path, &["release", "values", "nope", "-e", "prod"])?;
  assert_eq!(output.status.code(), Some(1));
  let err = stderr(&output);
  assert!(err.contains("not found within environment prod: release nope"));
  assert!(err.contains("💡 Help:"));

  Ok(())
}

#[test]
fn test_dsl_error_exit_code() -> Result<()> {
  let catalog = TestCatalog::new()?;
  catalog.add_release(
    "prod",
    "broken",
    "spec:\n  values:\n    x: $ref(.Environment.Spec.Values.missing)\n",
  )?;

  let output = run_catalog_rail_raw(&catalog.path, &["release", "values", "broken", "-e", "prod"])?;
  assert_eq!(output.status.code(), Some(3));

  Ok(())
}
