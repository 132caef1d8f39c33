use super::*;
use crate::catalog::LoadOpts;
use crate::core::error::{GitError, GraphError};
use crate::prompt::ScriptedPrompt;
use std::cell::RefCell;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const STAGING: &str = "metadata:\n  name: staging\nspec:\n  order: 1\n  promotion:\n    fromEnvironments: []\n";
const PROD: &str = "metadata:\n  name: prod\nspec:\n  order: 2\n  promotion:\n    fromEnvironments: [staging]\n";
const PROD_AUTO_MERGE: &str =
  "metadata:\n  name: prod\nspec:\n  order: 2\n  promotion:\n    fromEnvironments: [staging]\n    allowAutoMerge: true\n";

const API_STAGING: &str = "metadata:\n  name: api\nspec:\n  project: backend\n  version: 1.0\n  values:\n    replicas: 2\n";
const API_PROD: &str =
  "# prod api\nmetadata:\n  name: api\nspec:\n  project: backend\n  version: 0.9  # bumped by promotion\n  values:\n    replicas: 2\n";
const API_PROD_PROMOTED: &str =
  "# prod api\nmetadata:\n  name: api\nspec:\n  project: backend\n  version: 1.0  # bumped by promotion\n  values:\n    replicas: 2\n";

const API_PATH: &str = "environments/prod/releases/api.release.yaml";

#[derive(Default)]
struct RecordingGit {
  calls: RefCell<Vec<String>>,
  dirty: bool,
}

impl RecordingGit {
  fn calls(&self) -> Vec<String> {
    self.calls.borrow().clone()
  }

  fn record(&self, call: String) {
    self.calls.borrow_mut().push(call);
  }
}

impl GitProvider for RecordingGit {
  fn ensure_clean_and_up_to_date(&self) -> RailResult<()> {
    self.record("ensure_clean".into());
    if self.dirty {
      return Err(RailError::Git(GitError::DirtyWorkingCopy {
        changes: vec!["environments/prod.yaml".into()],
      }));
    }
    Ok(())
  }

  fn current_branch(&self) -> RailResult<String> {
    self.record("current_branch".into());
    Ok("main".into())
  }

  fn create_and_checkout_branch(&self, branch: &str) -> RailResult<()> {
    self.record(format!("branch {}", branch));
    Ok(())
  }

  fn commit_all(&self, message: &str) -> RailResult<()> {
    self.record(format!("commit {}", message));
    Ok(())
  }

  fn push(&self, remote: &str, branch: &str) -> RailResult<()> {
    self.record(format!("push {} {}", remote, branch));
    Ok(())
  }

  fn checkout(&self, branch: &str) -> RailResult<()> {
    self.record(format!("checkout {}", branch));
    Ok(())
  }
}

#[derive(Default)]
struct RecordingPullRequests {
  created: RefCell<Vec<PullRequest>>,
}

impl PullRequestProvider for RecordingPullRequests {
  fn create(&self, pull_request: &PullRequest) -> RailResult<String> {
    self.created.borrow_mut().push(pull_request.clone());
    Ok("https://github.com/acme/catalog/pull/7".into())
  }
}

struct Fixture {
  dir: TempDir,
  catalog: Catalog,
  graph: PromotionGraph,
  config: PromotionConfig,
  git: RecordingGit,
  pull_requests: RecordingPullRequests,
}

impl Fixture {
  fn new(files: &[(&str, &str)]) -> Self {
    let dir = TempDir::new().unwrap();
    for (path, content) in files {
      write(dir.path(), path, content);
    }
    let catalog = Catalog::load(&LoadOpts::new(dir.path())).unwrap();
    let graph = PromotionGraph::build(&catalog.environments);
    Self {
      dir,
      catalog,
      graph,
      config: PromotionConfig::default(),
      git: RecordingGit::default(),
      pull_requests: RecordingPullRequests::default(),
    }
  }

  fn standard() -> Self {
    Self::new(&[
      ("environments/staging.yaml", STAGING),
      ("environments/prod.yaml", PROD),
      ("environments/staging/releases/api.release.yaml", API_STAGING),
      (API_PATH, API_PROD),
    ])
  }

  fn run(&self, prompt: &mut ScriptedPrompt, opts: &PromotionOpts) -> RailResult<PromotionOutcome> {
    Promotion::new(&self.catalog, &self.graph, &self.config, &self.git, &self.pull_requests).run(prompt, opts)
  }

  fn read(&self, path: &str) -> String {
    fs::read_to_string(self.dir.path().join(path)).unwrap()
  }
}

fn write(root: &Path, rel: &str, content: &str) {
  let path = root.join(rel);
  fs::create_dir_all(path.parent().unwrap()).unwrap();
  fs::write(path, content).unwrap();
}

fn staging_to_prod() -> PromotionOpts {
  PromotionOpts {
    source: Some("staging".into()),
    target: Some("prod".into()),
    ..Default::default()
  }
}

#[test]
fn test_promotes_version_end_to_end() {
  let fx = Fixture::standard();
  let mut prompt = ScriptedPrompt::new().choose_many([0]).select(0);

  let outcome = fx.run(&mut prompt, &staging_to_prod()).unwrap();

  assert_eq!(
    outcome,
    PromotionOutcome::Created {
      url: "https://github.com/acme/catalog/pull/7".into(),
      releases: vec!["api".into()],
    }
  );
  assert_eq!(fx.read(API_PATH), API_PROD_PROMOTED);
  assert_eq!(prompt.remaining(), 0);

  let calls = fx.git.calls();
  assert_eq!(calls[0], "ensure_clean");
  assert_eq!(calls[1], "current_branch");
  assert!(calls[2].starts_with("branch catalog-rail/promote/staging-to-prod-"));
  assert_eq!(calls[2].len(), "branch catalog-rail/promote/staging-to-prod-".len() + 8);
  assert_eq!(calls[3], "commit Promote api from staging to prod");
  assert!(calls[4].starts_with("push origin catalog-rail/promote/staging-to-prod-"));
  assert_eq!(calls[5], "checkout main");

  let created = fx.pull_requests.created.borrow();
  assert_eq!(created.len(), 1);
  assert_eq!(created[0].title, "Promote 1 release(s) from staging to prod");
  assert!(!created[0].draft);
  assert!(created[0].labels.is_empty());
  assert!(prompt.output().contains("-  version: 0.9  # bumped by promotion"));
  assert!(prompt.output().contains("+  version: 1.0  # bumped by promotion"));
}

#[test]
fn test_prompts_for_source_and_target() {
  let fx = Fixture::standard();
  let mut prompt = ScriptedPrompt::new().select(0).select(0).choose_many([0]).select(1);

  let outcome = fx.run(&mut prompt, &PromotionOpts::default()).unwrap();

  assert!(matches!(outcome, PromotionOutcome::Created { .. }));
  assert_eq!(
    prompt.asked[..2],
    ["Select source environment".to_string(), "Select target environment".to_string()]
  );
  assert!(fx.pull_requests.created.borrow()[0].draft);
}

#[test]
fn test_dry_run_changes_nothing() {
  let fx = Fixture::standard();
  let mut prompt = ScriptedPrompt::new();
  let opts = PromotionOpts {
    releases: vec!["api".into()],
    dry_run: true,
    no_prompt: true,
    ..staging_to_prod()
  };

  let outcome = fx.run(&mut prompt, &opts).unwrap();

  assert_eq!(
    outcome,
    PromotionOutcome::DryRun {
      releases: vec!["api".into()]
    }
  );
  assert_eq!(fx.read(API_PATH), API_PROD);
  assert_eq!(fx.git.calls(), vec!["ensure_clean"]);
  assert!(fx.pull_requests.created.borrow().is_empty());
  assert!(prompt.output().starts_with("ℹ️ Dry-run mode enabled"));
}

#[test]
fn test_cancel_at_release_selection() {
  let fx = Fixture::standard();
  let mut prompt = ScriptedPrompt::new().cancel();

  let outcome = fx.run(&mut prompt, &staging_to_prod()).unwrap();

  assert_eq!(outcome, PromotionOutcome::Canceled);
  assert_eq!(fx.read(API_PATH), API_PROD);
  assert_eq!(fx.git.calls(), vec!["ensure_clean"]);
  assert!(prompt.output().contains("Canceled"));
}

#[test]
fn test_cancel_at_pull_request_choice() {
  let fx = Fixture::standard();
  let mut prompt = ScriptedPrompt::new().choose_many([0]).select(2);

  let outcome = fx.run(&mut prompt, &staging_to_prod()).unwrap();

  assert_eq!(outcome, PromotionOutcome::Canceled);
  assert_eq!(fx.read(API_PATH), API_PROD);
  assert!(fx.pull_requests.created.borrow().is_empty());
}

#[test]
fn test_non_standard_target_version_aborts_everything() {
  let fx = Fixture::new(&[
    ("environments/staging.yaml", STAGING),
    ("environments/prod.yaml", PROD),
    ("environments/staging/releases/api.release.yaml", API_STAGING),
    (
      API_PATH,
      "metadata:\n  name: api\nspec:\n  project: backend\n  version: 1.2.3-hotfix\n",
    ),
    (
      "environments/staging/releases/web.release.yaml",
      "spec:\n  project: frontend\n  version: 2.0\n",
    ),
  ]);
  let mut prompt = ScriptedPrompt::new();
  let opts = PromotionOpts {
    releases: vec!["api".into(), "web".into()],
    no_prompt: true,
    ..staging_to_prod()
  };

  let err = fx.run(&mut prompt, &opts).unwrap_err();

  match err {
    RailError::NonPromotable { target, releases } => {
      assert_eq!(target, "prod");
      assert_eq!(releases, vec!["api"]);
    }
    other => panic!("unexpected error: {}", other),
  }
  assert!(!fx.dir.path().join("environments/prod/releases/web.release.yaml").exists());
  assert!(fx.pull_requests.created.borrow().is_empty());
}

#[test]
fn test_auto_merge_not_allowed_fails_before_listing() {
  let fx = Fixture::standard();
  let mut prompt = ScriptedPrompt::new();
  let opts = PromotionOpts {
    auto_merge: true,
    ..staging_to_prod()
  };

  let err = fx.run(&mut prompt, &opts).unwrap_err();

  assert!(matches!(
    err.root(),
    RailError::Graph(GraphError::AutoMergeNotAllowed { target }) if target == "prod"
  ));
  assert!(prompt.asked.is_empty());
}

#[test]
fn test_reverse_direction_is_not_promotable() {
  let fx = Fixture::standard();
  let mut prompt = ScriptedPrompt::new();
  let opts = PromotionOpts {
    source: Some("prod".into()),
    target: Some("staging".into()),
    ..Default::default()
  };

  let err = fx.run(&mut prompt, &opts).unwrap_err();

  assert!(matches!(err.root(), RailError::Graph(GraphError::NotPromotable { .. })));
}

#[test]
fn test_ready_on_auto_merge_target_confirms_auto_merge() {
  let fx = Fixture::new(&[
    ("environments/staging.yaml", STAGING),
    ("environments/prod.yaml", PROD_AUTO_MERGE),
    ("environments/staging/releases/api.release.yaml", API_STAGING),
    (API_PATH, API_PROD),
  ]);
  let mut prompt = ScriptedPrompt::new().choose_many([0]).select(0).confirm_with(true);

  fx.run(&mut prompt, &staging_to_prod()).unwrap();

  let created = fx.pull_requests.created.borrow();
  assert_eq!(created[0].labels, vec!["auto-merge"]);
  assert!(!created[0].draft);
}

#[test]
fn test_auto_merge_flag_asks_for_confirmation() {
  let fx = Fixture::new(&[
    ("environments/staging.yaml", STAGING),
    ("environments/prod.yaml", PROD_AUTO_MERGE),
    ("environments/staging/releases/api.release.yaml", API_STAGING),
    (API_PATH, API_PROD),
  ]);
  let mut prompt = ScriptedPrompt::new().choose_many([0]).confirm_with(false);
  let opts = PromotionOpts {
    auto_merge: true,
    ..staging_to_prod()
  };

  let outcome = fx.run(&mut prompt, &opts).unwrap();

  assert_eq!(outcome, PromotionOutcome::Canceled);
  assert_eq!(prompt.asked.last().unwrap(), "Create an auto-merge promotion pull request?");
  assert_eq!(fx.read(API_PATH), API_PROD);
}

#[test]
fn test_identical_releases_have_nothing_to_promote() {
  let fx = Fixture::new(&[
    ("environments/staging.yaml", STAGING),
    ("environments/prod.yaml", PROD),
    ("environments/staging/releases/api.release.yaml", API_STAGING),
    (API_PATH, API_STAGING),
  ]);
  let mut prompt = ScriptedPrompt::new();

  let outcome = fx.run(&mut prompt, &staging_to_prod()).unwrap();

  assert_eq!(outcome, PromotionOutcome::NothingToPromote);
  assert!(prompt.output().contains("No promotable releases found from staging to prod"));
  assert!(prompt.asked.is_empty());
}

#[test]
fn test_unknown_release_names_promote_nothing() {
  let fx = Fixture::standard();
  let mut prompt = ScriptedPrompt::new();
  let opts = PromotionOpts {
    releases: vec!["apii".into()],
    no_prompt: true,
    ..staging_to_prod()
  };

  let outcome = fx.run(&mut prompt, &opts).unwrap();

  assert_eq!(outcome, PromotionOutcome::NothingToPromote);
  assert_eq!(fx.git.calls(), vec!["ensure_clean"]);
}

#[test]
fn test_missing_target_release_creates_file() {
  let fx = Fixture::new(&[
    ("environments/staging.yaml", STAGING),
    ("environments/prod.yaml", PROD),
    ("environments/staging/releases/team/web.release.yaml", "spec:\n  project: frontend\n  version: 2.0\n"),
  ]);
  let mut prompt = ScriptedPrompt::new();
  let opts = PromotionOpts {
    releases: vec!["web".into()],
    no_prompt: true,
    ..staging_to_prod()
  };

  fx.run(&mut prompt, &opts).unwrap();

  assert_eq!(
    fx.read("environments/prod/releases/team/web.release.yaml"),
    "spec:\n  project: frontend\n  version: 2.0\n"
  );
}

#[test]
fn test_dirty_working_copy_stops_before_prompts() {
  let mut fx = Fixture::standard();
  fx.git.dirty = true;
  let mut prompt = ScriptedPrompt::new().select(0);

  let err = fx.run(&mut prompt, &PromotionOpts::default()).unwrap_err();

  assert!(matches!(err.root(), RailError::Git(GitError::DirtyWorkingCopy { .. })));
  assert!(prompt.asked.is_empty());
}

#[test]
fn test_unknown_environment_flag() {
  let fx = Fixture::standard();
  let mut prompt = ScriptedPrompt::new();
  let opts = PromotionOpts {
    source: Some("qa".into()),
    ..Default::default()
  };

  let err = fx.run(&mut prompt, &opts).unwrap_err();

  assert_eq!(err.to_string(), "not found: environment qa");
}
