//! Error types for catalog-rail with contextual messages and exit codes
//!
//! Every failure in the engine maps to one of a small set of kinds (not found,
//! promotion graph, non-promotable, DSL, template, YAML, git/external tool, I/O).
//! Each kind knows its exit code and, where useful, a help message that guides
//! the user toward resolution.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Exit codes for catalog-rail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
  /// User error (config, invalid args, missing environments/releases)
  User = 1,
  /// System error (git, external tools, I/O)
  System = 2,
  /// Validation failure (promotion graph, non-promotable releases, DSL, templates)
  Validation = 3,
}

impl ExitCode {
  /// Convert to i32 for process exit
  pub fn as_i32(self) -> i32 {
    self as i32
  }
}

/// Main error type for catalog-rail
#[derive(Debug)]
pub enum RailError {
  /// Named environment or release is absent
  NotFound(NotFoundError),

  /// Promotion graph violations
  Graph(GraphError),

  /// Selected releases carry pinned/custom versions in the target environment
  NonPromotable { target: String, releases: Vec<String> },

  /// Value interpolation DSL errors
  Dsl(DslError),

  /// Template parse/execute errors
  Template(TemplateError),

  /// YAML document errors (parse, lookup, edit)
  Yaml(YamlError),

  /// Configuration errors
  Config(ConfigError),

  /// Git operation errors
  Git(GitError),

  /// Failure of an external tool other than git (gh, helm)
  ExternalTool { tool: String, message: String },

  /// I/O errors
  Io(io::Error),

  /// Any typed error wrapped with context
  Context { context: String, source: Box<RailError> },

  /// Generic error with message and optional context
  Message {
    message: String,
    context: Option<String>,
    help: Option<String>,
  },
}

impl RailError {
  /// Create a simple error message
  pub fn message(msg: impl Into<String>) -> Self {
    RailError::Message {
      message: msg.into(),
      context: None,
      help: None,
    }
  }

  /// Create an error with help text
  pub fn with_help(msg: impl Into<String>, help: impl Into<String>) -> Self {
    RailError::Message {
      message: msg.into(),
      context: None,
      help: Some(help.into()),
    }
  }

  /// Add context to an existing error
  pub fn context(self, ctx: impl Into<String>) -> Self {
    let ctx_str = ctx.into();
    match self {
      RailError::Message { message, context, help } => RailError::Message {
        message,
        context: Some(context.map(|c| format!("{}\n{}", ctx_str, c)).unwrap_or(ctx_str)),
        help,
      },
      other => RailError::Context {
        context: ctx_str,
        source: Box::new(other),
      },
    }
  }

  /// The innermost error, with all context layers removed
  pub fn root(&self) -> &RailError {
    match self {
      RailError::Context { source, .. } => source.root(),
      other => other,
    }
  }

  /// Get the appropriate exit code for this error
  pub fn exit_code(&self) -> ExitCode {
    match self {
      RailError::NotFound(_) => ExitCode::User,
      RailError::Graph(_) => ExitCode::Validation,
      RailError::NonPromotable { .. } => ExitCode::Validation,
      RailError::Dsl(_) => ExitCode::Validation,
      RailError::Template(_) => ExitCode::Validation,
      RailError::Yaml(_) => ExitCode::User,
      RailError::Config(_) => ExitCode::User,
      RailError::Git(_) => ExitCode::System,
      RailError::ExternalTool { .. } => ExitCode::System,
      RailError::Io(_) => ExitCode::System,
      RailError::Context { source, .. } => source.exit_code(),
      RailError::Message { .. } => ExitCode::User,
    }
  }

  /// Get contextual help message for this error
  pub fn help_message(&self) -> Option<String> {
    match self {
      RailError::NotFound(e) => e.help_message(),
      RailError::Graph(e) => e.help_message(),
      RailError::NonPromotable { .. } => Some(
        "Pinned or custom versions must be changed by hand (or with `catalog-rail build promote`) before promoting."
          .to_string(),
      ),
      RailError::Config(e) => e.help_message(),
      RailError::Git(e) => e.help_message(),
      RailError::ExternalTool { tool, .. } => Some(format!("Make sure `{}` is installed and on your PATH.", tool)),
      RailError::Context { source, .. } => source.help_message(),
      RailError::Message { help, .. } => help.clone(),
      _ => None,
    }
  }
}

impl fmt::Display for RailError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      RailError::NotFound(e) => write!(f, "{}", e),
      RailError::Graph(e) => write!(f, "{}", e),
      RailError::NonPromotable { target, releases } => write!(
        f,
        "cannot promote releases with non-standard version to {} environment: {}",
        target,
        releases.join(", ")
      ),
      RailError::Dsl(e) => write!(f, "{}", e),
      RailError::Template(e) => write!(f, "{}", e),
      RailError::Yaml(e) => write!(f, "{}", e),
      RailError::Config(e) => write!(f, "{}", e),
      RailError::Git(e) => write!(f, "{}", e),
      RailError::ExternalTool { tool, message } => write!(f, "{} failed: {}", tool, message),
      RailError::Io(e) => write!(f, "I/O error: {}", e),
      RailError::Context { context, source } => write!(f, "{}: {}", context, source),
      RailError::Message { message, context, .. } => {
        write!(f, "{}", message)?;
        if let Some(ctx) = context {
          write!(f, "\n{}", ctx)?;
        }
        Ok(())
      }
    }
  }
}

impl std::error::Error for RailError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      RailError::Io(e) => Some(e),
      RailError::Context { source, .. } => Some(source.as_ref()),
      _ => None,
    }
  }
}

impl From<io::Error> for RailError {
  fn from(err: io::Error) -> Self {
    RailError::Io(err)
  }
}

impl From<String> for RailError {
  fn from(msg: String) -> Self {
    RailError::message(msg)
  }
}

impl From<&str> for RailError {
  fn from(msg: &str) -> Self {
    RailError::message(msg)
  }
}

impl From<NotFoundError> for RailError {
  fn from(err: NotFoundError) -> Self {
    RailError::NotFound(err)
  }
}

impl From<GraphError> for RailError {
  fn from(err: GraphError) -> Self {
    RailError::Graph(err)
  }
}

impl From<DslError> for RailError {
  fn from(err: DslError) -> Self {
    RailError::Dsl(err)
  }
}

impl From<TemplateError> for RailError {
  fn from(err: TemplateError) -> Self {
    RailError::Template(err)
  }
}

impl From<YamlError> for RailError {
  fn from(err: YamlError) -> Self {
    RailError::Yaml(err)
  }
}

impl From<GitError> for RailError {
  fn from(err: GitError) -> Self {
    RailError::Git(err)
  }
}

impl From<toml_edit::TomlError> for RailError {
  fn from(err: toml_edit::TomlError) -> Self {
    RailError::message(format!("TOML parse error: {}", err))
  }
}

impl From<toml_edit::de::Error> for RailError {
  fn from(err: toml_edit::de::Error) -> Self {
    RailError::message(format!("TOML deserialization error: {}", err))
  }
}

impl From<serde_json::Error> for RailError {
  fn from(err: serde_json::Error) -> Self {
    RailError::message(format!("JSON error: {}", err))
  }
}

impl From<serde_yaml::Error> for RailError {
  fn from(err: serde_yaml::Error) -> Self {
    RailError::message(format!("YAML emit error: {}", err))
  }
}

impl From<std::string::FromUtf8Error> for RailError {
  fn from(err: std::string::FromUtf8Error) -> Self {
    RailError::message(format!("UTF-8 conversion error: {}", err))
  }
}

impl From<std::path::StripPrefixError> for RailError {
  fn from(err: std::path::StripPrefixError) -> Self {
    RailError::message(format!("Path strip prefix error: {}", err))
  }
}

/// A named environment or release could not be found
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotFoundError {
  Environment { name: String },
  Release { name: String, environment: Option<String> },
}

impl NotFoundError {
  fn help_message(&self) -> Option<String> {
    match self {
      NotFoundError::Environment { .. } => Some("List known environments with `catalog-rail env list`.".to_string()),
      NotFoundError::Release { .. } => Some("List known releases with `catalog-rail release list`.".to_string()),
    }
  }
}

impl fmt::Display for NotFoundError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      NotFoundError::Environment { name } => write!(f, "not found: environment {}", name),
      NotFoundError::Release {
        name,
        environment: Some(env),
      } => write!(f, "not found within environment {}: release {}", env, name),
      NotFoundError::Release { name, environment: None } => write!(f, "not found: release {}", name),
    }
  }
}

/// Promotion graph violations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
  /// No environment is listed as a promotion source
  NoSourceEnvironments,

  /// No environment accepts promotions from the source
  NoTargetEnvironments { source: String },

  /// The target does not list the source in `fromEnvironments`
  NotPromotable { source: String, target: String },

  /// Auto-merge requested for a target that does not allow it
  AutoMergeNotAllowed { target: String },
}

impl GraphError {
  fn help_message(&self) -> Option<String> {
    match self {
      GraphError::NoSourceEnvironments | GraphError::NoTargetEnvironments { .. } => Some(
        "Add the source environment to `spec.promotion.fromEnvironments` of the target environment.".to_string(),
      ),
      GraphError::NotPromotable { source, target } => Some(format!(
        "Add `{}` to `spec.promotion.fromEnvironments` of environment `{}`.",
        source, target
      )),
      GraphError::AutoMergeNotAllowed { target } => Some(format!(
        "Set `spec.promotion.allowAutoMerge: true` on environment `{}` or drop --auto-merge.",
        target
      )),
    }
  }
}

impl fmt::Display for GraphError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      GraphError::NoSourceEnvironments => write!(f, "no promotable source environments found"),
      GraphError::NoTargetEnvironments { source } => {
        write!(f, "no target environments found to promote from {}", source)
      }
      GraphError::NotPromotable { source, target } => {
        write!(f, "environment {} is not promotable to {}", source, target)
      }
      GraphError::AutoMergeNotAllowed { target } => {
        write!(f, "auto-merge is not allowed for target environment {}", target)
      }
    }
  }
}

/// Value interpolation DSL errors
///
/// Every variant names the offending path or expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DslError {
  /// Operator other than `ref`/`spread`
  UnsupportedOperator { operator: String, expression: String },

  /// Path not rooted at `.Environment.Spec.Values.`
  UnsupportedPrefix { path: String },

  /// A path segment is absent from the environment values
  MissingKey { path: String, key: String },

  /// A path segment resolved to something other than a mapping
  NotAMapping { path: String, key: String },

  /// `$spread()` resolved to a non-sequence value
  SpreadNotSequence { path: String },

  /// `$spread()` used outside of a sequence
  SpreadOutsideSequence { expression: String },
}

impl fmt::Display for DslError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      DslError::UnsupportedOperator { operator, expression } => write!(
        f,
        "unsupported object interpolation operator {:?} in expression: {}",
        operator, expression
      ),
      DslError::UnsupportedPrefix { path } => write!(
        f,
        "resolving object value for path {:?}: only {:?} prefix is supported",
        path,
        crate::hydrate::dsl::VALUES_PREFIX
      ),
      DslError::MissingKey { path, key } => {
        write!(f, "resolving object value for path {:?}: key {:?} not found in values", path, key)
      }
      DslError::NotAMapping { path, key } => write!(
        f,
        "resolving object value for path {:?}: value for key {:?} is not a map",
        path, key
      ),
      DslError::SpreadNotSequence { path } => {
        write!(f, "resolving {:?}: $spread() operator must resolve to an array", path)
      }
      DslError::SpreadOutsideSequence { expression } => {
        write!(f, "only $ref() operator supported within object: {}", expression)
      }
    }
  }
}

/// Template parse/execute errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
  /// Template text could not be parsed
  Parse { line: usize, message: String },

  /// Evaluation of an action failed
  Execute { expression: String, message: String },
}

impl fmt::Display for TemplateError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      TemplateError::Parse { line, message } => write!(f, "template: line {}: {}", line, message),
      TemplateError::Execute { expression, message } => {
        write!(f, "template: executing {{{{ {} }}}}: {}", expression, message)
      }
    }
  }
}

/// YAML document errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum YamlError {
  /// The document failed to parse
  Parse { path: PathBuf, message: String },

  /// A dotted path segment is missing from the structural tree
  PropertyNotFound { path: String, segment: String },

  /// The node at the path cannot be edited in place
  NotEditable { path: String, reason: String },
}

impl fmt::Display for YamlError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      YamlError::Parse { path, message } => write!(f, "parsing YAML {}: {}", path.display(), message),
      YamlError::PropertyNotFound { path, segment } => {
        write!(f, "property {:?} not found while resolving {:?}", segment, path)
      }
      YamlError::NotEditable { path, reason } => write!(f, "cannot edit {:?}: {}", path, reason),
    }
  }
}

/// Configuration-related errors
#[derive(Debug)]
pub enum ConfigError {
  /// Catalog directory has no `environments/` directory
  CatalogNotFound { dir: PathBuf },

  /// Invalid configuration value
  Invalid { field: String, message: String },
}

impl ConfigError {
  fn help_message(&self) -> Option<String> {
    match self {
      ConfigError::CatalogNotFound { .. } => {
        Some("Run from a catalog checkout or pass --catalog-dir (or set CATALOG_RAIL_DIR).".to_string())
      }
      ConfigError::Invalid { .. } => None,
    }
  }
}

impl fmt::Display for ConfigError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ConfigError::CatalogNotFound { dir } => {
        write!(f, "No catalog found.\nExpected directory: {}", dir.display())
      }
      ConfigError::Invalid { field, message } => write!(f, "Invalid config value for {}: {}", field, message),
    }
  }
}

/// Git operation errors
#[derive(Debug)]
pub enum GitError {
  /// Git command failed
  CommandFailed { command: String, stderr: String },

  /// Repository not found
  RepoNotFound { path: PathBuf },

  /// Uncommitted changes in the working copy
  DirtyWorkingCopy { changes: Vec<String> },

  /// Local branch is behind its upstream
  BehindUpstream { upstream: String, commits: usize },

  /// Push failed
  PushFailed {
    remote: String,
    branch: String,
    reason: String,
  },
}

impl GitError {
  fn help_message(&self) -> Option<String> {
    match self {
      GitError::PushFailed { reason, .. } => {
        if reason.contains("non-fast-forward") {
          Some("The remote has commits you don't have. Pull first and retry.".to_string())
        } else if reason.contains("permission denied") || reason.contains("403") {
          Some("Check your SSH key permissions and GitHub access.".to_string())
        } else {
          None
        }
      }
      GitError::RepoNotFound { path } => Some(format!(
        "The catalog must be a git working copy: {}",
        path.display()
      )),
      GitError::DirtyWorkingCopy { .. } => Some("Commit or stash your changes first.".to_string()),
      GitError::BehindUpstream { .. } => Some("Pull the latest changes first.".to_string()),
      _ => None,
    }
  }
}

impl fmt::Display for GitError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      GitError::CommandFailed { command, stderr } => {
        write!(f, "Git command failed: {}\n{}", command, stderr)
      }
      GitError::RepoNotFound { path } => {
        write!(f, "Git repository not found at: {}", path.display())
      }
      GitError::DirtyWorkingCopy { changes } => {
        write!(f, "working copy has uncommitted changes:\n  {}", changes.join("\n  "))
      }
      GitError::BehindUpstream { upstream, commits } => {
        write!(f, "working copy is {} commit(s) behind {}", commits, upstream)
      }
      GitError::PushFailed { remote, branch, reason } => {
        write!(f, "Push to {}/{} failed: {}", remote, branch, reason)
      }
    }
  }
}

/// Result type alias for catalog-rail
pub type RailResult<T> = Result<T, RailError>;

/// Helper trait to add context to Results
pub trait ResultExt<T> {
  /// Add context to an error result
  fn context(self, ctx: impl Into<String>) -> RailResult<T>;

  /// Add context using a closure (lazy evaluation)
  fn with_context<F>(self, f: F) -> RailResult<T>
  where
    F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
  E: Into<RailError>,
{
  fn context(self, ctx: impl Into<String>) -> RailResult<T> {
    self.map_err(|e| e.into().context(ctx))
  }

  fn with_context<F>(self, f: F) -> RailResult<T>
  where
    F: FnOnce() -> String,
  {
    self.map_err(|e| e.into().context(f()))
  }
}

/// Pretty-print an error to stderr with help text
pub fn print_error(error: &RailError) {
  eprintln!("\n❌ {}\n", error);

  if let Some(help) = error.help_message() {
    eprintln!("💡 Help: {}\n", help);
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_context_keeps_exit_code_of_typed_errors() {
    let err = RailError::from(GraphError::NoSourceEnvironments).context("promoting");
    assert_eq!(err.exit_code(), ExitCode::Validation);
    assert_eq!(err.to_string(), "promoting: no promotable source environments found");
    assert!(matches!(err.root(), RailError::Graph(GraphError::NoSourceEnvironments)));
  }

  #[test]
  fn test_context_on_message_appends() {
    let err = RailError::message("boom").context("outer");
    assert_eq!(err.to_string(), "boom\nouter");
    assert_eq!(err.exit_code(), ExitCode::User);
  }

  #[test]
  fn test_not_found_messages() {
    let env = NotFoundError::Environment { name: "qa".into() };
    assert_eq!(env.to_string(), "not found: environment qa");

    let rel = NotFoundError::Release {
      name: "api".into(),
      environment: Some("prod".into()),
    };
    assert_eq!(rel.to_string(), "not found within environment prod: release api");
  }

  #[test]
  fn test_dsl_messages_name_the_path() {
    let err = DslError::MissingKey {
      path: ".Environment.Spec.Values.a.b".into(),
      key: "b".into(),
    };
    let text = err.to_string();
    assert!(text.contains(".Environment.Spec.Values.a.b"));
    assert!(text.contains("key \"b\" not found in values"));
  }

  #[test]
  fn test_non_promotable_lists_releases() {
    let err = RailError::NonPromotable {
      target: "prod".into(),
      releases: vec!["api".into(), "web".into()],
    };
    assert_eq!(err.exit_code(), ExitCode::Validation);
    assert!(err.to_string().ends_with("api, web"));
    assert!(err.help_message().is_some());
  }
}
