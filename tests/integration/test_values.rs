//! Tests for `release values` and `release render`

use crate::helpers::*;
use anyhow::Result;

#[test]
fn test_values_yaml() -> Result<()> {
  let catalog = TestCatalog::new()?;

  let output = run_catalog_rail(&catalog.path, &["release", "values", "api", "-e", "prod"])?;
  assert_eq!(stdout(&output), "host: prod.example.com\nname: api-prod\n");

  Ok(())
}

#[test]
fn test_values_json() -> Result<()> {
  let catalog = TestCatalog::new()?;

  let output = run_catalog_rail(&catalog.path, &["release", "values", "api", "-e", "staging", "--json"])?;
  let json: serde_json::Value = serde_json::from_slice(&output.stdout)?;
  assert_eq!(json, serde_json::json!({"host": "staging.example.com", "name": "api-staging"}));

  Ok(())
}

#[test]
fn test_values_mapping_from_config() -> Result<()> {
  let catalog = TestCatalog::new()?;
  catalog.write_file(
    "catalog-rail.toml",
    "[value_mapping]\nrelease_ignore_list = [\"web\"]\n[value_mapping.mappings]\n\"image.pullPolicy\" = \"IfNotPresent\"\n",
  )?;

  let out = stdout(&run_catalog_rail(&catalog.path, &["release", "values", "api", "-e", "prod"])?);
  assert!(out.contains("image:\n  pullPolicy: IfNotPresent\n"), "{}", out);

  let out = stdout(&run_catalog_rail(&catalog.path, &["release", "values", "web", "-e", "prod"])?);
  assert!(!out.contains("pullPolicy"), "{}", out);

  Ok(())
}

#[test]
fn test_values_all_continues_past_failures() -> Result<()> {
  let catalog = TestCatalog::new()?;
  catalog.add_release(
    "prod",
    "broken",
    "spec:\n  project: misc\n  values:\n    x: $ref(.Environment.Spec.Values.missing)\n",
  )?;

  let output = run_catalog_rail_raw(&catalog.path, &["release", "values", "--all", "-e", "prod"])?;
  assert!(!output.status.success());

  let out = stdout(&output);
  assert!(out.contains("---\n# Release: api\nhost: prod.example.com\n"), "{}", out);
  assert!(out.contains("# Release: web\n"), "{}", out);
  assert!(!out.contains("# Release: broken"));

  let err = stderr(&output);
  assert!(err.contains("broken"), "{}", err);
  assert!(err.contains("failed to hydrate 1 release(s) in environment prod"), "{}", err);

  Ok(())
}

#[test]
fn test_render_without_chart_fails_with_help() -> Result<()> {
  let catalog = TestCatalog::new()?;

  let output = run_catalog_rail_raw(&catalog.path, &["release", "render", "web", "-e", "prod"])?;
  assert_eq!(output.status.code(), Some(1));
  let err = stderr(&output);
  assert!(err.contains("release web has no chart"));
  assert!(err.contains("spec.chart"));

  Ok(())
}
