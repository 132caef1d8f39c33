//! `env list` and `env select`

use crate::core::config::{CatalogRailConfig, SelectionConfig};
use crate::core::context::CatalogContext;
use crate::core::error::RailResult;
use crate::prompt::{Prompt, Selection};

/// Print environments with their promotion policy
pub fn run_env_list(ctx: &CatalogContext) -> RailResult<()> {
  let selected = &ctx.config.selection.environments;

  println!("\n🌍 Environments\n");
  println!("{:<3} {:<16} {:<24} {:<12} PROMOTES TO", "", "NAME", "FROM", "AUTO-MERGE");
  println!("{:-<80}", "");

  for env in &ctx.catalog.environments {
    let marker = if selected.is_empty() || selected.contains(&env.name) {
      "✓"
    } else {
      ""
    };
    let from = if env.promotion.from_environments.is_empty() {
      "-".to_string()
    } else {
      env.promotion.from_environments.join(", ")
    };
    let targets = ctx.graph.targets_of(&env.name);
    let targets = if targets.is_empty() {
      "-".to_string()
    } else {
      targets.join(", ")
    };
    let auto_merge = if env.promotion.allow_auto_merge { "yes" } else { "no" };
    println!("{:<3} {:<16} {:<24} {:<12} {}", marker, env.name, from, auto_merge, targets);
  }
  println!();

  if ctx.graph.has_cycle() {
    println!("⚠️  The promotion graph contains a cycle");
  }
  Ok(())
}

/// Persist the environment selection; an empty selection means all environments
pub fn run_env_select(ctx: &CatalogContext, prompt: &mut dyn Prompt, names: Vec<String>, all: bool) -> RailResult<()> {
  let candidates: Vec<String> = ctx.catalog.environments.iter().map(|e| e.name.clone()).collect();
  for name in &names {
    ctx.catalog.environment(name)?;
  }

  let environments = match super::choose_names(prompt, "Select environments", names, all, &candidates)? {
    Selection::Selected(environments) => environments,
    Selection::Canceled => {
      prompt.print("❌ Canceled");
      return Ok(());
    }
  };

  let selection = SelectionConfig {
    environments,
    releases: ctx.config.selection.releases.clone(),
  };
  let path = CatalogRailConfig::save_selection(&ctx.root, &selection)?;

  if selection.environments.is_empty() {
    prompt.print(&format!("✅ Selected all environments ({})", path.display()));
  } else {
    prompt.print(&format!(
      "✅ Selected environments: {} ({})",
      selection.environments.join(", "),
      path.display()
    ));
  }
  Ok(())
}
