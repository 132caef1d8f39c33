//! Interactive prompt capability
//!
//! Every blocking question goes through [`Prompt`], so promotion logic can be
//! driven by a terminal ([`TerminalPrompt`]) or a queue of canned answers
//! ([`ScriptedPrompt`]). Cancellation is a value, not an error.

pub mod scripted;
pub mod terminal;

pub use scripted::ScriptedPrompt;
pub use terminal::TerminalPrompt;

use crate::core::error::RailResult;

/// Outcome of a prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection<T> {
  Selected(T),
  Canceled,
}

impl<T> Selection<T> {
  pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Selection<U> {
    match self {
      Selection::Selected(value) => Selection::Selected(f(value)),
      Selection::Canceled => Selection::Canceled,
    }
  }

  pub fn selected(self) -> Option<T> {
    match self {
      Selection::Selected(value) => Some(value),
      Selection::Canceled => None,
    }
  }
}

/// Blocking user interaction
pub trait Prompt {
  /// Pick one option; returns its index
  fn select_one(&mut self, message: &str, options: &[String]) -> RailResult<Selection<usize>>;

  /// Pick any number of options; returns their indices in option order
  fn select_many(&mut self, message: &str, options: &[String]) -> RailResult<Selection<Vec<usize>>>;

  fn confirm(&mut self, message: &str, default: bool) -> RailResult<Selection<bool>>;

  fn print(&mut self, text: &str);
}
