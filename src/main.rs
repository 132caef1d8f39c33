use catalog_rail::commands;
use catalog_rail::core::context::CatalogContext;
use catalog_rail::core::error::{RailError, RailResult, print_error};
use catalog_rail::core::telemetry::init_tracing;
use catalog_rail::prompt::TerminalPrompt;
use catalog_rail::render::HelmRenderer;
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

/// Promote releases across GitOps catalog environments
#[derive(Parser)]
#[command(name = "catalog-rail")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
#[command(styles = get_styles())]
struct Cli {
  #[command(flatten)]
  global: GlobalArgs,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Args)]
struct GlobalArgs {
  /// Catalog root directory
  #[arg(long, global = true, env = "CATALOG_RAIL_DIR")]
  catalog_dir: Option<PathBuf>,

  /// Print debug logs to stderr
  #[arg(short, long, global = true)]
  verbose: bool,

  /// Emit logs as JSON
  #[arg(long, global = true)]
  log_json: bool,
}

#[derive(Subcommand)]
enum Commands {
  /// Inspect and select environments
  #[command(subcommand)]
  Env(EnvCommands),

  /// List, promote, hydrate and render releases
  #[command(subcommand)]
  Release(ReleaseCommands),

  /// Commands for CI pipelines
  #[command(subcommand)]
  Build(BuildCommands),
}

#[derive(Subcommand)]
enum EnvCommands {
  /// List environments and where they promote to
  List,

  /// Persist the environments to work with
  Select {
    /// Environment names (interactive selection when omitted)
    names: Vec<String>,
    /// Select every environment
    #[arg(long, conflicts_with = "names")]
    all: bool,
  },
}

#[derive(Subcommand)]
enum ReleaseCommands {
  /// Show release versions across environments
  List {
    /// Comma-separated release name patterns (overrides the saved selection)
    #[arg(short, long)]
    releases: Option<String>,
    /// Output in JSON format
    #[arg(long)]
    json: bool,
  },

  /// Persist the releases to work with
  Select {
    /// Release names (interactive selection when omitted)
    names: Vec<String>,
    /// Select every release
    #[arg(long, conflicts_with = "names")]
    all: bool,
  },

  /// Promote releases from one environment to another via pull request
  Promote {
    /// Comma-separated release names (interactive selection when omitted)
    releases: Option<String>,
    /// Source environment
    #[arg(short, long)]
    source: Option<String>,
    /// Target environment
    #[arg(short, long)]
    target: Option<String>,
    /// Label the pull request for auto-merge
    #[arg(long, conflicts_with = "draft")]
    auto_merge: bool,
    /// Open the pull request as a draft
    #[arg(long)]
    draft: bool,
    /// Skip the preview and confirmations
    #[arg(long)]
    no_prompt: bool,
    /// Show what would be promoted without changing anything
    #[arg(long)]
    dry_run: bool,
  },

  /// Print hydrated values of a release
  Values {
    /// Release name (interactive selection when omitted)
    release: Option<String>,
    /// Environment name
    #[arg(short, long)]
    env: Option<String>,
    /// Print values of every release in the environment
    #[arg(long, conflicts_with = "release")]
    all: bool,
    /// Output in JSON format
    #[arg(long)]
    json: bool,
  },

  /// Render a release's chart with hydrated values
  Render {
    /// Release name (interactive selection when omitted)
    release: Option<String>,
    /// Environment name
    #[arg(short, long)]
    env: Option<String>,
    /// Disable coloured output
    #[arg(long)]
    no_color: bool,
  },
}

#[derive(Subcommand)]
enum BuildCommands {
  /// Set the version of every release of a project in one environment
  Promote {
    /// Environment name
    #[arg(long)]
    env: String,
    /// Project name (`spec.project`)
    #[arg(long)]
    project: String,
    /// Version to set
    #[arg(id = "new_version", value_name = "VERSION")]
    new_version: String,
  },
}

fn get_styles() -> clap::builder::Styles {
  clap::builder::Styles::styled()
    .usage(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .header(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .literal(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))))
    .invalid(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .error(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .valid(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))),
    )
    .placeholder(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::White))))
}

fn main() {
  let cli = Cli::parse();

  let level = if cli.global.verbose {
    tracing::Level::DEBUG
  } else {
    tracing::Level::WARN
  };
  init_tracing(cli.global.log_json, level);

  let root = match cli.global.catalog_dir {
    Some(dir) => dir,
    None => match std::env::current_dir() {
      Ok(dir) => dir,
      Err(e) => handle_error(RailError::message(format!("Failed to get current directory: {}", e))),
    },
  };

  if let Err(err) = run(&root, cli.command) {
    handle_error(err);
  }
}

fn run(root: &Path, command: Commands) -> RailResult<()> {
  let mut prompt = TerminalPrompt::new();

  match command {
    Commands::Env(env_cmd) => {
      let ctx = CatalogContext::build(root, None)?;
      match env_cmd {
        EnvCommands::List => commands::run_env_list(&ctx),
        EnvCommands::Select { names, all } => commands::run_env_select(&ctx, &mut prompt, names, all),
      }
    }

    Commands::Release(release_cmd) => match release_cmd {
      ReleaseCommands::List { releases, json } => {
        let ctx = CatalogContext::build(root, releases.as_deref())?;
        commands::run_release_list(&ctx, json)
      }
      ReleaseCommands::Select { names, all } => {
        let ctx = CatalogContext::build_unfiltered(root)?;
        commands::run_release_select(&ctx, &mut prompt, names, all)
      }
      ReleaseCommands::Promote {
        releases,
        source,
        target,
        auto_merge,
        draft,
        no_prompt,
        dry_run,
      } => {
        let ctx = CatalogContext::build(root, None)?;
        let args = commands::PromoteArgs {
          releases,
          source,
          target,
          auto_merge,
          draft,
          no_prompt,
          dry_run,
        };
        commands::run_release_promote(&ctx, &mut prompt, args)
      }
      ReleaseCommands::Values {
        release,
        env,
        all,
        json,
      } => {
        let ctx = CatalogContext::build(root, None)?;
        commands::run_release_values(&ctx, &mut prompt, release.as_deref(), env.as_deref(), all, json)
      }
      ReleaseCommands::Render {
        release,
        env,
        no_color,
      } => {
        let ctx = CatalogContext::build(root, None)?;
        let renderer = HelmRenderer::default();
        commands::run_release_render(&ctx, &mut prompt, &renderer, release.as_deref(), env.as_deref(), no_color)
      }
    },

    Commands::Build(BuildCommands::Promote {
      env,
      project,
      new_version,
    }) => {
      let ctx = CatalogContext::build_unfiltered(root)?;
      commands::run_build_promote(&ctx, &env, &project, &new_version)
    }
  }
}

fn handle_error(err: RailError) -> ! {
  print_error(&err);
  std::process::exit(err.exit_code().as_i32());
}
