//! `$ref()` / `$spread()` interpolation of environment values
//!
//! Release values may point into their environment's values with a string
//! that is exactly one expression:
//!
//! ```yaml
//! values:
//!   resources: $ref(.Environment.Spec.Values.defaults.resources)
//!   hosts:
//!     - api.example.com
//!     - $spread(.Environment.Spec.Values.extraHosts)
//! ```
//!
//! `$ref` substitutes the referenced value (any shape). `$spread` is only legal
//! as a sequence item and inlines the referenced sequence's items.

use crate::catalog::value::{Mapping, Value};
use crate::core::error::{DslError, RailResult};
use regex::Regex;
use std::sync::LazyLock;

pub const VALUES_PREFIX: &str = ".Environment.Spec.Values.";

static EXPRESSION: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"^\s*\$((?-u:\w)+)\(\s*((\.(?-u:\w)+)+)\s*\)\s*$").expect("valid regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operator {
  Ref,
  Spread,
}

/// Resolve every expression in `values` against `env_values`, returning a new tree
pub fn resolve_values(values: &Value, env_values: &Value) -> RailResult<Value> {
  resolve_value(values, env_values)
}

fn resolve_value(value: &Value, env_values: &Value) -> RailResult<Value> {
  match value {
    Value::String(text) => match resolve_expression(text, env_values)? {
      None => Ok(value.clone()),
      Some((Operator::Ref, resolved)) => Ok(resolved),
      Some((Operator::Spread, _)) => Err(
        DslError::SpreadOutsideSequence {
          expression: text.clone(),
        }
        .into(),
      ),
    },
    Value::Mapping(map) => {
      let mut resolved = Mapping::new();
      for (key, item) in map {
        resolved.insert(key.clone(), resolve_value(item, env_values)?);
      }
      Ok(Value::Mapping(resolved))
    }
    Value::Sequence(items) => {
      let mut resolved = Vec::with_capacity(items.len());
      for item in items {
        let Value::String(text) = item else {
          resolved.push(resolve_value(item, env_values)?);
          continue;
        };
        match resolve_expression(text, env_values)? {
          None => resolved.push(item.clone()),
          Some((Operator::Ref, value)) => resolved.push(value),
          Some((Operator::Spread, Value::Sequence(spread))) => resolved.extend(spread),
          Some((Operator::Spread, _)) => {
            return Err(DslError::SpreadNotSequence { path: expression_path(text) }.into());
          }
        }
      }
      Ok(Value::Sequence(resolved))
    }
    scalar => Ok(scalar.clone()),
  }
}

fn expression_path(text: &str) -> String {
  EXPRESSION
    .captures(text)
    .and_then(|c| c.get(2))
    .map(|m| m.as_str().to_string())
    .unwrap_or_else(|| text.to_string())
}

/// `None` for plain strings; otherwise the operator and the referenced value
fn resolve_expression(text: &str, env_values: &Value) -> RailResult<Option<(Operator, Value)>> {
  let Some(captures) = EXPRESSION.captures(text) else {
    return Ok(None);
  };
  let name = &captures[1];
  let operator = match name {
    "ref" => Operator::Ref,
    "spread" => Operator::Spread,
    other => {
      return Err(
        DslError::UnsupportedOperator {
          operator: other.to_string(),
          expression: text.to_string(),
        }
        .into(),
      );
    }
  };

  let full_path = &captures[2];
  let Some(values_path) = full_path.strip_prefix(VALUES_PREFIX) else {
    return Err(
      DslError::UnsupportedPrefix {
        path: full_path.to_string(),
      }
      .into(),
    );
  };
  let segments: Vec<&str> = values_path.split('.').collect();
  let resolved = lookup(env_values, &segments, full_path)?;
  Ok(Some((operator, resolved)))
}

fn lookup(values: &Value, segments: &[&str], full_path: &str) -> Result<Value, DslError> {
  let mut current = values;
  for (i, key) in segments.iter().enumerate() {
    if i > 0 && current.as_mapping().is_none() {
      return Err(DslError::NotAMapping {
        path: full_path.to_string(),
        key: segments[i - 1].to_string(),
      });
    }
    current = current.get(key).ok_or_else(|| DslError::MissingKey {
      path: full_path.to_string(),
      key: key.to_string(),
    })?;
  }
  Ok(current.clone())
}
