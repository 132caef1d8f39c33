//! Tests for `release list` and `release select`

use crate::helpers::*;
use anyhow::Result;

#[test]
fn test_release_list_table() -> Result<()> {
  let catalog = TestCatalog::new()?;

  let output = run_catalog_rail(&catalog.path, &["release", "list"])?;
  let out = stdout(&output);

  assert!(out.contains("  NAME  STAGING  PROD\n"), "{}", out);
  assert!(out.contains("* api   1.0      0.9\n"), "{}", out);
  assert!(out.contains("  web   2.0      2.0\n"), "{}", out);

  Ok(())
}

#[test]
fn test_release_list_json() -> Result<()> {
  let catalog = TestCatalog::new()?;

  let output = run_catalog_rail(&catalog.path, &["release", "list", "--json"])?;
  let json: serde_json::Value = serde_json::from_slice(&output.stdout)?;

  assert_eq!(json["environments"], serde_json::json!(["staging", "prod"]));
  assert_eq!(json["releases"][0]["name"], "api");
  assert_eq!(json["releases"][0]["versions"]["staging"], "1.0");
  assert_eq!(json["releases"][0]["in_sync"], false);
  assert_eq!(json["releases"][1]["name"], "web");
  assert_eq!(json["releases"][1]["in_sync"], true);

  Ok(())
}

#[test]
fn test_release_list_patterns_override_selection() -> Result<()> {
  let catalog = TestCatalog::new()?;
  run_catalog_rail(&catalog.path, &["release", "select", "web"])?;

  let out = stdout(&run_catalog_rail(&catalog.path, &["release", "list"])?);
  assert!(out.contains("web"));
  assert!(!out.contains("api"));

  let out = stdout(&run_catalog_rail(&catalog.path, &["release", "list", "-r", "a*"])?);
  assert!(out.contains("api"));
  assert!(!out.contains("web"));

  Ok(())
}

#[test]
fn test_release_select_all_clears_selection() -> Result<()> {
  let catalog = TestCatalog::new()?;
  run_catalog_rail(&catalog.path, &["release", "select", "api"])?;
  assert!(catalog.read_file("catalog-rail.toml")?.contains("releases = [\"api\"]"));

  let output = run_catalog_rail(&catalog.path, &["release", "select", "--all"])?;
  assert!(stdout(&output).contains("✅ Selected all releases"));
  assert!(catalog.read_file("catalog-rail.toml")?.contains("releases = []"));

  Ok(())
}
