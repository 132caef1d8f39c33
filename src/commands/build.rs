//! `build promote`: pin a freshly built version across one project's releases

use crate::catalog::document::find_node;
use crate::core::context::CatalogContext;
use crate::core::error::{RailError, RailResult, ResultExt};

/// Set `spec.version` on every release of `project` in `environment`
pub fn run_build_promote(ctx: &CatalogContext, environment: &str, project: &str, version: &str) -> RailResult<()> {
  let env = ctx.catalog.environment(environment)?;
  let releases: Vec<_> = ctx
    .catalog
    .releases_in(&env.name)
    .filter(|release| release.project == project)
    .collect();

  if releases.is_empty() {
    return Err(RailError::with_help(
      format!("no releases found for project {}", project),
      format!("Check `spec.project` of the releases in environment {}.", env.name),
    ));
  }

  for release in &releases {
    if !find_node(release.file.tree(), "spec.version").is_ok_and(|node| node.as_scalar().is_some()) {
      return Err(RailError::message(format!("release {} has no version property", release.name)));
    }
  }

  for release in &releases {
    let mut file = release.file.clone();
    file
      .set_scalar("spec.version", version)
      .with_context(|| format!("setting version of release {}", release.name))?;
    file.write_yaml()?;
    println!("✅ Promoted release {} to version {}", release.name, version);
  }

  println!(
    "🍺 Promoted {} release(s) of project {} in environment {} to version {}",
    releases.len(),
    project,
    env.name,
    version
  );
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::fs;
  use std::path::Path;

  fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
  }

  fn catalog() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(root, "environments/dev.yaml", "spec:\n  order: 1\n");
    write(
      root,
      "environments/dev/releases/api.release.yaml",
      "# api\nspec:\n  project: backend\n  version: 1.0  # bumped by CI\n",
    );
    write(
      root,
      "environments/dev/releases/worker.release.yaml",
      "spec:\n  project: backend\n  version: 1.0\n  values:\n    queue: jobs\n",
    );
    write(root, "environments/dev/releases/web.release.yaml", "spec:\n  project: frontend\n  version: 3.0\n");
    dir
  }

  #[test]
  fn test_sets_version_on_project_releases() {
    let dir = catalog();
    let ctx = CatalogContext::build(dir.path(), None).unwrap();
    run_build_promote(&ctx, "dev", "backend", "1.1").unwrap();

    let releases = dir.path().join("environments/dev/releases");
    assert_eq!(
      fs::read_to_string(releases.join("api.release.yaml")).unwrap(),
      "# api\nspec:\n  project: backend\n  version: 1.1  # bumped by CI\n"
    );
    assert_eq!(
      fs::read_to_string(releases.join("worker.release.yaml")).unwrap(),
      "spec:\n  project: backend\n  version: 1.1\n  values:\n    queue: jobs\n"
    );
    assert_eq!(
      fs::read_to_string(releases.join("web.release.yaml")).unwrap(),
      "spec:\n  project: frontend\n  version: 3.0\n"
    );
  }

  #[test]
  fn test_blank_version_is_filled_in_place() {
    let dir = catalog();
    write(
      dir.path(),
      "environments/dev/releases/cron.release.yaml",
      "spec:\n  version:\n  project: backend\n",
    );
    let ctx = CatalogContext::build(dir.path(), None).unwrap();
    run_build_promote(&ctx, "dev", "backend", "1.1").unwrap();
    assert_eq!(
      fs::read_to_string(dir.path().join("environments/dev/releases/cron.release.yaml")).unwrap(),
      "spec:\n  version: 1.1\n  project: backend\n"
    );
  }

  #[test]
  fn test_unknown_project_fails() {
    let dir = catalog();
    let ctx = CatalogContext::build(dir.path(), None).unwrap();
    let err = run_build_promote(&ctx, "dev", "mobile", "1.1").unwrap_err();
    assert_eq!(err.to_string(), "no releases found for project mobile");
  }

  #[test]
  fn test_missing_version_writes_nothing() {
    let dir = catalog();
    write(
      dir.path(),
      "environments/dev/releases/cron.release.yaml",
      "spec:\n  project: backend\n",
    );
    let ctx = CatalogContext::build(dir.path(), None).unwrap();
    let err = run_build_promote(&ctx, "dev", "backend", "1.1").unwrap_err();
    assert_eq!(err.to_string(), "release cron has no version property");
    let api = fs::read_to_string(dir.path().join("environments/dev/releases/api.release.yaml")).unwrap();
    assert!(api.contains("version: 1.0"));
  }
}
