//! Static value overrides applied to every release's values

use crate::catalog::value::{Mapping, Value};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Dotted paths to default values, e.g. `"image.pullPolicy" = "IfNotPresent"`.
///
/// A `.` inside a segment is written `\.` and a backslash `\\`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValueMapping {
  /// Releases that never receive the mappings
  #[serde(default)]
  pub release_ignore_list: Vec<String>,

  #[serde(default)]
  pub mappings: BTreeMap<String, Value>,
}

impl ValueMapping {
  pub fn applies_to(&self, release: &str) -> bool {
    !self.release_ignore_list.iter().any(|name| name == release)
  }

  /// Apply every mapping without overwriting existing keys
  pub fn apply(&self, values: &mut Mapping) {
    for (path, value) in &self.mappings {
      set_in_map(values, &split_into_path_segments(path), value.clone());
    }
  }
}

/// Set `value` at `segments` unless the key already exists, even with a falsy value.
///
/// Missing intermediate maps are created. An existing non-map intermediate
/// leaves the tree untouched.
pub fn set_in_map(mapping: &mut Mapping, segments: &[String], value: Value) {
  let Some((last, parents)) = segments.split_last() else {
    return;
  };

  let mut current = mapping;
  for key in parents {
    let entry = current.entry(key.clone()).or_insert_with(Value::mapping);
    match entry {
      Value::Mapping(next) => current = next,
      _ => return,
    }
  }
  current.entry(last.clone()).or_insert(value);
}

/// Split a dotted path, honouring `\.` and `\\` escapes
pub fn split_into_path_segments(input: &str) -> Vec<String> {
  let sanitize = |segment: &str| segment.replace(r"\.", ".").replace(r"\\", r"\");

  let mut result = Vec::new();
  let mut start = 0;
  let mut escaped = false;
  for (i, c) in input.char_indices() {
    match c {
      '\\' => escaped = !escaped,
      '.' if escaped => escaped = false,
      '.' => {
        result.push(sanitize(&input[start..i]));
        start = i + 1;
      }
      _ => escaped = false,
    }
  }
  result.push(sanitize(&input[start..]));
  result
}
