//! Terminal prompts via inquire

use super::{Prompt, Selection};
use crate::core::error::{RailError, RailResult};
use inquire::{Confirm, InquireError, MultiSelect, Select};

const PAGE_SIZE: usize = 20;

/// Prompts on the controlling terminal
#[derive(Debug, Default)]
pub struct TerminalPrompt;

impl TerminalPrompt {
  pub fn new() -> Self {
    Self
  }
}

fn canceled_or<T>(result: Result<T, InquireError>) -> RailResult<Selection<T>> {
  match result {
    Ok(value) => Ok(Selection::Selected(value)),
    Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => Ok(Selection::Canceled),
    Err(InquireError::NotTTY) => Err(RailError::with_help(
      "cannot prompt: not running in a terminal",
      "Pass the values as flags (see --help) or use --no-prompt.",
    )),
    Err(e) => Err(RailError::message(format!("prompt failed: {}", e))),
  }
}

impl Prompt for TerminalPrompt {
  fn select_one(&mut self, message: &str, options: &[String]) -> RailResult<Selection<usize>> {
    let answer = Select::new(message, options.to_vec()).with_page_size(PAGE_SIZE).raw_prompt();
    Ok(canceled_or(answer)?.map(|option| option.index))
  }

  fn select_many(&mut self, message: &str, options: &[String]) -> RailResult<Selection<Vec<usize>>> {
    let answer = MultiSelect::new(message, options.to_vec())
      .with_page_size(PAGE_SIZE)
      .raw_prompt();
    Ok(canceled_or(answer)?.map(|chosen| {
      let mut indices: Vec<usize> = chosen.into_iter().map(|option| option.index).collect();
      indices.sort_unstable();
      indices
    }))
  }

  fn confirm(&mut self, message: &str, default: bool) -> RailResult<Selection<bool>> {
    canceled_or(Confirm::new(message).with_default(default).prompt())
  }

  fn print(&mut self, text: &str) {
    println!("{}", text);
  }
}
