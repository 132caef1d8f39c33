//! `release` subcommands

use crate::catalog::{Environment, Release};
use crate::core::config::{CatalogRailConfig, SelectionConfig};
use crate::core::context::CatalogContext;
use crate::core::error::{NotFoundError, RailError, RailResult, ResultExt};
use crate::core::vcs::{GitHubPullRequests, SystemGit};
use crate::cross::CrossReleaseList;
use crate::hydrate::hydrate_values;
use crate::promote::{Promotion, PromotionOpts, PromotionOutcome};
use crate::prompt::{Prompt, Selection};
use crate::render::{ChartRenderer, ManifestColorWriter};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

/// JSON shape of `release list --json`
#[derive(Debug, Serialize)]
struct ReleaseListJson {
  environments: Vec<String>,
  releases: Vec<ReleaseRowJson>,
}

#[derive(Debug, Serialize)]
struct ReleaseRowJson {
  name: String,
  /// Version per environment; `null` when the release is absent or unversioned
  versions: BTreeMap<String, Option<String>>,
  in_sync: bool,
}

fn list_json(list: &CrossReleaseList) -> ReleaseListJson {
  ReleaseListJson {
    environments: list.environments.iter().map(|e| e.name.clone()).collect(),
    releases: list
      .items
      .iter()
      .map(|item| ReleaseRowJson {
        name: item.name.clone(),
        versions: list
          .environments
          .iter()
          .zip(&item.releases)
          .map(|(env, release)| (env.name.clone(), release.as_ref().and_then(|r| r.version.clone())))
          .collect(),
        in_sync: item.all_versions_equal(),
      })
      .collect(),
  }
}

/// Cross-environment table; `*` marks rows whose versions differ
fn render_table(list: &CrossReleaseList) -> String {
  let name_width = list.items.iter().map(|i| i.name.len()).max().unwrap_or(0).max("NAME".len());
  let column_widths: Vec<usize> = list
    .environments
    .iter()
    .enumerate()
    .map(|(col, env)| {
      list
        .items
        .iter()
        .filter_map(|item| item.releases[col].as_ref())
        .map(|r| r.version.as_deref().unwrap_or("-").len())
        .max()
        .unwrap_or(0)
        .max(env.name.len())
    })
    .collect();

  let mut out = format!("  {:<width$}", "NAME", width = name_width);
  for (env, width) in list.environments.iter().zip(&column_widths) {
    out.push_str(&format!("  {:<width$}", env.name.to_uppercase(), width = *width));
  }
  out = out.trim_end().to_string();
  out.push('\n');

  for item in &list.items {
    let marker = if item.all_versions_equal() { ' ' } else { '*' };
    let mut line = format!("{} {:<width$}", marker, item.name, width = name_width);
    for (release, width) in item.releases.iter().zip(&column_widths) {
      let version = match release {
        Some(release) => release.version.as_deref().unwrap_or("-"),
        None => "",
      };
      line.push_str(&format!("  {:<width$}", version, width = *width));
    }
    out.push_str(line.trim_end());
    out.push('\n');
  }
  out
}

pub fn run_release_list(ctx: &CatalogContext, json: bool) -> RailResult<()> {
  let list = ctx.cross_releases();

  if json {
    println!("{}", serde_json::to_string_pretty(&list_json(&list))?);
    return Ok(());
  }

  if list.items.is_empty() {
    println!("🤷 No releases found");
    return Ok(());
  }
  println!("\n📦 Releases\n");
  print!("{}", render_table(&list));
  println!();
  Ok(())
}

/// Persist the release selection; an empty selection means all releases
pub fn run_release_select(ctx: &CatalogContext, prompt: &mut dyn Prompt, names: Vec<String>, all: bool) -> RailResult<()> {
  let candidates = CrossReleaseList::build(&ctx.catalog.environments, &ctx.catalog.releases).names();
  for name in &names {
    if !candidates.contains(name) {
      return Err(RailError::NotFound(NotFoundError::Release {
        name: name.clone(),
        environment: None,
      }));
    }
  }

  let releases = match super::choose_names(prompt, "Select releases", names, all, &candidates)? {
    Selection::Selected(releases) => releases,
    Selection::Canceled => {
      prompt.print("❌ Canceled");
      return Ok(());
    }
  };

  let selection = SelectionConfig {
    environments: ctx.config.selection.environments.clone(),
    releases,
  };
  let path = CatalogRailConfig::save_selection(&ctx.root, &selection)?;

  if selection.releases.is_empty() {
    prompt.print(&format!("✅ Selected all releases ({})", path.display()));
  } else {
    prompt.print(&format!(
      "✅ Selected releases: {} ({})",
      selection.releases.join(", "),
      path.display()
    ));
  }
  Ok(())
}

/// Flags of `release promote`
#[derive(Debug, Clone, Default)]
pub struct PromoteArgs {
  /// Comma-separated release names
  pub releases: Option<String>,
  pub source: Option<String>,
  pub target: Option<String>,
  pub auto_merge: bool,
  pub draft: bool,
  pub no_prompt: bool,
  pub dry_run: bool,
}

pub fn run_release_promote(ctx: &CatalogContext, prompt: &mut dyn Prompt, args: PromoteArgs) -> RailResult<()> {
  if args.auto_merge && args.draft {
    return Err(RailError::message("--auto-merge and --draft cannot be used together"));
  }

  let git = SystemGit::open(&ctx.root)?;
  let pull_requests = GitHubPullRequests::new(&ctx.root);
  let opts = PromotionOpts {
    source: args.source,
    target: args.target,
    releases: args
      .releases
      .map(|list| {
        list
          .split(',')
          .map(str::trim)
          .filter(|s| !s.is_empty())
          .map(str::to_string)
          .collect()
      })
      .unwrap_or_default(),
    selected_environments: ctx.config.selection.environments.clone(),
    auto_merge: args.auto_merge,
    draft: args.draft,
    no_prompt: args.no_prompt,
    dry_run: args.dry_run,
    color: super::stdout_color(false),
  };

  let outcome = Promotion::new(&ctx.catalog, &ctx.graph, &ctx.config.promotion, &git, &pull_requests).run(prompt, &opts)?;
  tracing::debug!(?outcome, "promotion finished");
  if let PromotionOutcome::Created { releases, .. } = &outcome {
    println!("🍺 Promoted {} release(s): {}", releases.len(), releases.join(", "));
  }
  Ok(())
}

/// Release by name in `env`, or prompt over the environment's releases
fn release_or_prompt<'a>(
  ctx: &'a CatalogContext,
  prompt: &mut dyn Prompt,
  env: &Environment,
  name: Option<&str>,
) -> RailResult<Selection<&'a Release>> {
  if let Some(name) = name {
    return ctx.catalog.release(name, &env.name).map(Selection::Selected);
  }
  let releases: Vec<&Release> = ctx
    .catalog
    .releases
    .iter()
    .filter(|r| r.environment.name == env.name)
    .collect();
  if releases.is_empty() {
    return Err(RailError::message(format!("no releases found in environment {}", env.name)));
  }
  let names: Vec<String> = releases.iter().map(|r| r.name.clone()).collect();
  Ok(
    prompt
      .select_one("Select release", &names)?
      .map(|index| releases[index]),
  )
}

fn select_environment(
  ctx: &CatalogContext,
  prompt: &mut dyn Prompt,
  env: Option<&str>,
) -> RailResult<Option<Arc<Environment>>> {
  match env {
    Some(name) => ctx.catalog.environment(name).map(Some),
    None => Ok(super::environment_or_prompt(prompt, &ctx.selected_environments(), None)?.selected()),
  }
}

fn print_values(values: &crate::catalog::Value, json: bool) -> RailResult<()> {
  if json {
    println!("{}", serde_json::to_string_pretty(values)?);
  } else {
    print!("{}", values.to_yaml_string()?);
  }
  Ok(())
}

/// Print hydrated values of one release, or of every release of an environment with `all`
pub fn run_release_values(
  ctx: &CatalogContext,
  prompt: &mut dyn Prompt,
  release: Option<&str>,
  env: Option<&str>,
  all: bool,
  json: bool,
) -> RailResult<()> {
  let Some(env) = select_environment(ctx, prompt, env)? else {
    prompt.print("❌ Canceled");
    return Ok(());
  };
  let mapping = Some(&ctx.config.value_mapping);

  if !all {
    let release = match release_or_prompt(ctx, prompt, &env, release)? {
      Selection::Selected(release) => release,
      Selection::Canceled => {
        prompt.print("❌ Canceled");
        return Ok(());
      }
    };
    let values = hydrate_values(release, mapping).with_context(|| format!("release {}", release.name))?;
    return print_values(&values, json);
  }

  let mut failed = Vec::new();
  let mut hydrated = BTreeMap::new();
  for release in ctx.catalog.releases_in(&env.name) {
    match hydrate_values(release, mapping) {
      Ok(values) => {
        hydrated.insert(release.name.clone(), values);
      }
      Err(e) => {
        eprintln!("❌ {}: {}", release.name, e);
        failed.push(release.name.clone());
      }
    }
  }

  if json {
    println!("{}", serde_json::to_string_pretty(&hydrated)?);
  } else {
    for (name, values) in &hydrated {
      println!("---\n# Release: {}", name);
      print!("{}", values.to_yaml_string()?);
    }
  }

  if failed.is_empty() {
    Ok(())
  } else {
    Err(RailError::message(format!(
      "failed to hydrate {} release(s) in environment {}: {}",
      failed.len(),
      env.name,
      failed.join(", ")
    )))
  }
}

/// Hydrate a release and render its chart
pub fn run_release_render(
  ctx: &CatalogContext,
  prompt: &mut dyn Prompt,
  renderer: &dyn ChartRenderer,
  release: Option<&str>,
  env: Option<&str>,
  no_color: bool,
) -> RailResult<()> {
  let Some(env) = select_environment(ctx, prompt, env)? else {
    prompt.print("❌ Canceled");
    return Ok(());
  };
  let release = match release_or_prompt(ctx, prompt, &env, release)? {
    Selection::Selected(release) => release,
    Selection::Canceled => {
      prompt.print("❌ Canceled");
      return Ok(());
    }
  };

  let chart = release.chart.as_ref().ok_or_else(|| {
    RailError::with_help(
      format!("release {} has no chart", release.name),
      "Add `spec.chart` with `repoUrl`, `name` and `version` to the release file.",
    )
  })?;
  let values = hydrate_values(release, Some(&ctx.config.value_mapping))
    .with_context(|| format!("release {}", release.name))?;
  let manifest = renderer.render(&release.name, chart, &values)?;

  let mut writer = ManifestColorWriter::new(std::io::stdout().lock(), super::stdout_color(no_color));
  writer.write_manifest(&manifest)?;
  Ok(())
}
