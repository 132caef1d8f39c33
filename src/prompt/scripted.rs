//! Prompt double that replays queued answers

use super::{Prompt, Selection};
use crate::core::error::{RailError, RailResult};
use std::collections::VecDeque;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Answer {
  One(usize),
  Many(Vec<usize>),
  Confirm(bool),
  Cancel,
}

/// Answers prompts from a queue and records everything printed
#[derive(Debug, Default)]
pub struct ScriptedPrompt {
  answers: VecDeque<Answer>,
  /// Messages of the prompts asked, in order
  pub asked: Vec<String>,
  pub printed: Vec<String>,
}

impl ScriptedPrompt {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn select(mut self, index: usize) -> Self {
    self.answers.push_back(Answer::One(index));
    self
  }

  pub fn choose_many(mut self, indices: impl IntoIterator<Item = usize>) -> Self {
    self.answers.push_back(Answer::Many(indices.into_iter().collect()));
    self
  }

  pub fn confirm_with(mut self, yes: bool) -> Self {
    self.answers.push_back(Answer::Confirm(yes));
    self
  }

  pub fn cancel(mut self) -> Self {
    self.answers.push_back(Answer::Cancel);
    self
  }

  /// Everything printed, joined by newlines
  pub fn output(&self) -> String {
    self.printed.join("\n")
  }

  pub fn remaining(&self) -> usize {
    self.answers.len()
  }

  fn next(&mut self, message: &str, kind: &str) -> RailResult<Answer> {
    self.asked.push(message.to_string());
    self
      .answers
      .pop_front()
      .ok_or_else(|| RailError::message(format!("no scripted answer for {} prompt: {}", kind, message)))
  }
}

fn check_index(index: usize, options: &[String], message: &str) -> RailResult<usize> {
  if index < options.len() {
    Ok(index)
  } else {
    Err(RailError::message(format!(
      "scripted answer {} out of range for prompt {:?} with {} options",
      index,
      message,
      options.len()
    )))
  }
}

fn mismatch(kind: &str, answer: &Answer, message: &str) -> RailError {
  RailError::message(format!("scripted answer {:?} does not fit {} prompt: {}", answer, kind, message))
}

impl Prompt for ScriptedPrompt {
  fn select_one(&mut self, message: &str, options: &[String]) -> RailResult<Selection<usize>> {
    match self.next(message, "select")? {
      Answer::One(index) => Ok(Selection::Selected(check_index(index, options, message)?)),
      Answer::Cancel => Ok(Selection::Canceled),
      other => Err(mismatch("select", &other, message)),
    }
  }

  fn select_many(&mut self, message: &str, options: &[String]) -> RailResult<Selection<Vec<usize>>> {
    match self.next(message, "multi-select")? {
      Answer::Many(indices) => {
        let mut checked = indices
          .into_iter()
          .map(|i| check_index(i, options, message))
          .collect::<RailResult<Vec<_>>>()?;
        checked.sort_unstable();
        Ok(Selection::Selected(checked))
      }
      Answer::Cancel => Ok(Selection::Canceled),
      other => Err(mismatch("multi-select", &other, message)),
    }
  }

  fn confirm(&mut self, message: &str, _default: bool) -> RailResult<Selection<bool>> {
    match self.next(message, "confirm")? {
      Answer::Confirm(yes) => Ok(Selection::Selected(yes)),
      Answer::Cancel => Ok(Selection::Canceled),
      other => Err(mismatch("confirm", &other, message)),
    }
  }

  fn print(&mut self, text: &str) {
    self.printed.push(text.to_string());
  }
}
