//! Tests for the `env` commands

use crate::helpers::*;
use anyhow::Result;

#[test]
fn test_env_list_shows_promotion_edges() -> Result<()> {
  let catalog = TestCatalog::new()?;

  let output = run_catalog_rail(&catalog.path, &["env", "list"])?;
  let out = stdout(&output);

  let staging = out.lines().find(|l| l.contains("staging") && l.contains("✓")).unwrap_or_default();
  assert!(staging.trim_end().ends_with("prod"), "{}", out);
  let prod = out
    .lines()
    .find(|l| l.split_whitespace().nth(1) == Some("prod"))
    .unwrap_or_default();
  assert!(prod.contains("staging"), "{}", out);
  assert!(!out.contains("cycle"));

  Ok(())
}

#[test]
fn test_env_select_persists_selection() -> Result<()> {
  let catalog = TestCatalog::new()?;
  catalog.write_file("catalog-rail.toml", "# team settings\n[promotion]\nremote = \"upstream\"\n")?;

  let output = run_catalog_rail(&catalog.path, &["env", "select", "prod"])?;
  assert!(stdout(&output).contains("✅ Selected environments: prod"));

  let config = catalog.read_file("catalog-rail.toml")?;
  assert!(config.starts_with("# team settings\n[promotion]\nremote = \"upstream\"\n"));
  assert!(config.contains("environments = [\"prod\"]"));

  let output = run_catalog_rail(&catalog.path, &["release", "list"])?;
  let out = stdout(&output);
  assert!(out.contains("PROD"));
  assert!(!out.contains("STAGING"));

  run_catalog_rail(&catalog.path, &["env", "select", "--all"])?;
  let config = catalog.read_file("catalog-rail.toml")?;
  assert!(config.contains("environments = []"));

  Ok(())
}

#[test]
fn test_env_select_unknown_environment() -> Result<()> {
  let catalog = TestCatalog::new()?;

  let output = run_catalog_rail_raw(&catalog.path, &["env", "select", "qa"])?;
  assert_eq!(output.status.code(), Some(1));
  assert!(stderr(&output).contains("not found: environment qa"));
  assert!(!catalog.path.join("catalog-rail.toml").exists());

  Ok(())
}
