//! Unified diffs for promotion previews

use super::style::{ADDED, HEADER, HUNK, REMOVED, paint};
use similar::{ChangeTag, TextDiff};

const CONTEXT_LINES: usize = 3;

/// Unified diff of `old` → `new`, empty when the texts are equal
pub fn unified_diff(old: &str, new: &str, old_label: &str, new_label: &str, color: bool) -> String {
  if old == new {
    return String::new();
  }

  let diff = TextDiff::from_lines(old, new);
  let mut out = String::new();
  out.push_str(&paint(HEADER, &format!("--- {}", old_label), color));
  out.push('\n');
  out.push_str(&paint(HEADER, &format!("+++ {}", new_label), color));
  out.push('\n');

  for hunk in diff.unified_diff().context_radius(CONTEXT_LINES).iter_hunks() {
    out.push_str(&paint(HUNK, &hunk.header().to_string(), color));
    out.push('\n');
    for change in hunk.iter_changes() {
      let (sign, style) = match change.tag() {
        ChangeTag::Delete => ("-", Some(REMOVED)),
        ChangeTag::Insert => ("+", Some(ADDED)),
        ChangeTag::Equal => (" ", None),
      };
      let line = format!("{}{}", sign, change.value().trim_end_matches(['\n', '\r']));
      match style {
        Some(style) => out.push_str(&paint(style, &line, color)),
        None => out.push_str(&line),
      }
      out.push('\n');
      if change.missing_newline() {
        out.push_str("\\ No newline at end of file\n");
      }
    }
  }
  out
}
