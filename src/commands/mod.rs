//! CLI commands for catalog-rail
//!
//! ## Environments
//! - **env list**: environments, their promotion sources and targets
//! - **env select**: persist the environments to work with
//!
//! ## Releases
//! - **release list**: cross-environment version table
//! - **release select**: persist the releases to work with
//! - **release promote**: promote releases between environments via pull request
//! - **release values**: print hydrated values
//! - **release render**: render a release's chart with hydrated values
//!
//! ## Build
//! - **build promote**: set the version of every release of a project in one environment
//!
//! All commands accept `&CatalogContext` to avoid redundant catalog loads.

pub mod build;
pub mod env;
pub mod release;

pub use build::run_build_promote;
pub use env::{run_env_list, run_env_select};
pub use release::{
  PromoteArgs, run_release_list, run_release_promote, run_release_render, run_release_select, run_release_values,
};

use crate::catalog::Environment;
use crate::core::error::RailResult;
use crate::prompt::{Prompt, Selection};
use std::io::IsTerminal;
use std::sync::Arc;

/// Colour stdout output only for terminals
pub(crate) fn stdout_color(no_color: bool) -> bool {
  !no_color && std::io::stdout().is_terminal()
}

/// Names chosen on the command line, every name with `all`, or a multi-select prompt
pub(crate) fn choose_names(
  prompt: &mut dyn Prompt,
  message: &str,
  given: Vec<String>,
  all: bool,
  candidates: &[String],
) -> RailResult<Selection<Vec<String>>> {
  if all {
    return Ok(Selection::Selected(Vec::new()));
  }
  if !given.is_empty() {
    return Ok(Selection::Selected(given));
  }
  Ok(
    prompt
      .select_many(message, candidates)?
      .map(|indices| indices.into_iter().map(|i| candidates[i].clone()).collect()),
  )
}

/// Environment by name, or prompt over `environments` when no name was given
pub(crate) fn environment_or_prompt(
  prompt: &mut dyn Prompt,
  environments: &[Arc<Environment>],
  name: Option<&str>,
) -> RailResult<Selection<Arc<Environment>>> {
  if let Some(name) = name {
    return crate::catalog::get_environment_by_name(environments, name).map(Selection::Selected);
  }
  let names: Vec<String> = environments.iter().map(|env| env.name.clone()).collect();
  Ok(
    prompt
      .select_one("Select environment", &names)?
      .map(|index| environments[index].clone()),
  )
}
