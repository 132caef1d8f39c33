//! Release selection strategies

use crate::core::error::{RailError, RailResult};
use glob::Pattern;

/// How releases are selected when loading a catalog
#[derive(Debug, Clone, Default)]
pub enum ReleaseFilter {
  /// Every release
  #[default]
  All,
  /// Comma-separated wildcard patterns, e.g. `api*,web`
  NamePatterns(Vec<Pattern>),
  /// An explicit list of names (from a saved selection)
  Specific(Vec<String>),
}

impl ReleaseFilter {
  pub fn name_patterns(patterns: &str) -> RailResult<Self> {
    let compiled = patterns
      .split(',')
      .map(str::trim)
      .filter(|p| !p.is_empty())
      .map(|p| Pattern::new(p).map_err(|e| RailError::message(format!("invalid release pattern {:?}: {}", p, e))))
      .collect::<RailResult<Vec<_>>>()?;
    Ok(ReleaseFilter::NamePatterns(compiled))
  }

  pub fn specific(names: impl IntoIterator<Item = impl Into<String>>) -> Self {
    ReleaseFilter::Specific(names.into_iter().map(Into::into).collect())
  }

  /// Pick the filter for a command: explicit patterns win over a saved selection
  pub fn resolve(patterns: Option<&str>, selected: &[String]) -> RailResult<Self> {
    match patterns {
      Some(p) if !p.trim().is_empty() => Self::name_patterns(p),
      _ if !selected.is_empty() => Ok(Self::specific(selected.iter().cloned())),
      _ => Ok(ReleaseFilter::All),
    }
  }

  pub fn matches(&self, name: &str) -> bool {
    match self {
      ReleaseFilter::All => true,
      ReleaseFilter::NamePatterns(patterns) => patterns.iter().any(|p| p.matches(name)),
      ReleaseFilter::Specific(names) => names.iter().any(|n| n == name),
    }
  }

  pub fn is_filtered(&self) -> bool {
    !matches!(self, ReleaseFilter::All)
  }
}
