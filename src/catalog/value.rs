//! Typed view of YAML data
//!
//! `Value` is the closed set of shapes a catalog document can take. The hydration
//! walker, the template engine and the matcher all pattern-match on it instead of
//! probing dynamic types at runtime.

use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::ser::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use yaml_rust2::{Yaml, YamlLoader};

/// Mapping with string keys in deterministic order
pub type Mapping = BTreeMap<String, Value>;

/// A YAML number; reals keep their literal text so `1.0` stays `1.0`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Number {
  Integer(i64),
  Real(String),
}

impl Number {
  pub fn as_f64(&self) -> Option<f64> {
    match self {
      Number::Integer(i) => Some(*i as f64),
      Number::Real(text) => text.parse().ok(),
    }
  }
}

impl fmt::Display for Number {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Number::Integer(i) => write!(f, "{}", i),
      Number::Real(text) => f.write_str(text),
    }
  }
}

/// Decoded YAML value
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Value {
  #[default]
  Null,
  Bool(bool),
  Number(Number),
  String(String),
  Sequence(Vec<Value>),
  Mapping(Mapping),
}

impl Value {
  /// Parse the first document of a YAML string. Empty input is `Null`.
  pub fn parse_yaml(text: &str) -> Result<Value, String> {
    let docs = YamlLoader::load_from_str(text).map_err(|e| e.to_string())?;
    Ok(docs.first().map(Value::from_yaml).unwrap_or_default())
  }

  /// Convert a `yaml-rust2` node. Aliases and bad values decode as `Null`.
  pub fn from_yaml(yaml: &Yaml) -> Value {
    match yaml {
      Yaml::Null | Yaml::BadValue | Yaml::Alias(_) => Value::Null,
      Yaml::Boolean(b) => Value::Bool(*b),
      Yaml::Integer(i) => Value::Number(Number::Integer(*i)),
      Yaml::Real(text) => Value::Number(Number::Real(text.clone())),
      Yaml::String(s) => Value::String(s.clone()),
      Yaml::Array(items) => Value::Sequence(items.iter().map(Value::from_yaml).collect()),
      Yaml::Hash(hash) => Value::Mapping(
        hash
          .iter()
          .map(|(k, v)| (yaml_key_string(k), Value::from_yaml(v)))
          .collect(),
      ),
    }
  }

  pub fn mapping() -> Value {
    Value::Mapping(Mapping::new())
  }

  pub fn type_name(&self) -> &'static str {
    match self {
      Value::Null => "null",
      Value::Bool(_) => "bool",
      Value::Number(_) => "number",
      Value::String(_) => "string",
      Value::Sequence(_) => "sequence",
      Value::Mapping(_) => "mapping",
    }
  }

  pub fn is_null(&self) -> bool {
    matches!(self, Value::Null)
  }

  pub fn as_str(&self) -> Option<&str> {
    match self {
      Value::String(s) => Some(s),
      _ => None,
    }
  }

  pub fn as_bool(&self) -> Option<bool> {
    match self {
      Value::Bool(b) => Some(*b),
      _ => None,
    }
  }

  pub fn as_i64(&self) -> Option<i64> {
    match self {
      Value::Number(Number::Integer(i)) => Some(*i),
      _ => None,
    }
  }

  pub fn as_mapping(&self) -> Option<&Mapping> {
    match self {
      Value::Mapping(m) => Some(m),
      _ => None,
    }
  }

  pub fn as_sequence(&self) -> Option<&[Value]> {
    match self {
      Value::Sequence(s) => Some(s),
      _ => None,
    }
  }

  /// Text of a scalar (string, number or bool); `None` for null and collections
  pub fn scalar_text(&self) -> Option<String> {
    match self {
      Value::String(s) => Some(s.clone()),
      Value::Number(n) => Some(n.to_string()),
      Value::Bool(b) => Some(b.to_string()),
      _ => None,
    }
  }

  pub fn get(&self, key: &str) -> Option<&Value> {
    self.as_mapping().and_then(|m| m.get(key))
  }

  /// Walk nested mappings
  pub fn get_path(&self, path: &[&str]) -> Option<&Value> {
    path.iter().try_fold(self, |current, key| current.get(key))
  }

  /// Strings of a sequence value, skipping non-scalars
  pub fn string_list(&self) -> Vec<String> {
    self
      .as_sequence()
      .map(|items| items.iter().filter_map(Value::scalar_text).collect())
      .unwrap_or_default()
  }

  /// Go-template truthiness: false, zero, null and empty values are false
  pub fn is_truthy(&self) -> bool {
    match self {
      Value::Null => false,
      Value::Bool(b) => *b,
      Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
      Value::String(s) => !s.is_empty(),
      Value::Sequence(s) => !s.is_empty(),
      Value::Mapping(m) => !m.is_empty(),
    }
  }

  /// Serialize as block-style YAML. Strings that would read back as another
  /// type (`'1.0'`, `'true'`, `'.inf'`) come out quoted.
  pub fn to_yaml_string(&self) -> Result<String, serde_yaml::Error> {
    serde_yaml::to_string(self)
  }
}

fn yaml_key_string(key: &Yaml) -> String {
  match key {
    Yaml::String(s) => s.clone(),
    Yaml::Integer(i) => i.to_string(),
    Yaml::Real(text) => text.clone(),
    Yaml::Boolean(b) => b.to_string(),
    Yaml::Null => "null".to_string(),
    other => format!("{:?}", other),
  }
}

impl From<&str> for Value {
  fn from(s: &str) -> Self {
    Value::String(s.to_string())
  }
}

impl From<String> for Value {
  fn from(s: String) -> Self {
    Value::String(s)
  }
}

impl From<bool> for Value {
  fn from(b: bool) -> Self {
    Value::Bool(b)
  }
}

impl From<i64> for Value {
  fn from(i: i64) -> Self {
    Value::Number(Number::Integer(i))
  }
}

impl From<Vec<Value>> for Value {
  fn from(items: Vec<Value>) -> Self {
    Value::Sequence(items)
  }
}

impl From<Mapping> for Value {
  fn from(map: Mapping) -> Self {
    Value::Mapping(map)
  }
}

// ---------------------------------------------------------------------------
// Scalar quoting for in-place edits
// ---------------------------------------------------------------------------

/// Quote a string only when plain style would change its meaning.
/// Single quotes are preferred; double quotes only for control characters.
pub fn quote_scalar(s: &str) -> String {
  if !needs_quotes(s) {
    return s.to_string();
  }
  if s.chars().any(|c| c.is_control() && c != '\t') {
    return double_quote(s);
  }
  format!("'{}'", s.replace('\'', "''"))
}

pub fn double_quote(s: &str) -> String {
  let mut out = String::with_capacity(s.len() + 2);
  out.push('"');
  for c in s.chars() {
    match c {
      '\\' => out.push_str("\\\\"),
      '"' => out.push_str("\\\""),
      '\n' => out.push_str("\\n"),
      '\t' => out.push_str("\\t"),
      '\r' => out.push_str("\\r"),
      c if c.is_control() => out.push_str(&format!("\\u{:04X}", c as u32)),
      c => out.push(c),
    }
  }
  out.push('"');
  out
}

/// Whether a plain scalar would be misread (indicators, comments, other types)
pub fn needs_quotes(s: &str) -> bool {
  !is_plain_safe(s) || resolves_as_non_string(s)
}

/// Whether `s` can be written as a plain scalar without breaking the document
/// structure. Type resolution is not considered.
pub fn is_plain_safe(s: &str) -> bool {
  let Some(first) = s.chars().next() else {
    return false;
  };
  !("-?:,[]{}#&*!|>'\"%@`".contains(first)
    || s.starts_with(char::is_whitespace)
    || s.ends_with(char::is_whitespace)
    || s.ends_with(':')
    || s.contains(": ")
    || s.contains(" #")
    || s.chars().any(char::is_control))
}

fn resolves_as_non_string(s: &str) -> bool {
  matches!(
    s,
    "~" | "null" | "Null" | "NULL" | "true" | "True" | "TRUE" | "false" | "False" | "FALSE"
      | "yes" | "Yes" | "YES" | "no" | "No" | "NO" | "on" | "On" | "ON" | "off" | "Off" | "OFF"
      | "y" | "Y" | "n" | "N"
  ) || parse_real(s).is_some()
    || s.starts_with("0x")
    || s.starts_with("0o")
}

// ---------------------------------------------------------------------------
// serde
// ---------------------------------------------------------------------------

/// Float value of a YAML real, including `.inf`, `-.inf` and `.nan` spellings
fn parse_real(text: &str) -> Option<f64> {
  let (sign, body) = match text.strip_prefix('-') {
    Some(rest) => (-1.0, rest),
    None => (1.0, text.strip_prefix('+').unwrap_or(text)),
  };
  match body {
    ".inf" | ".Inf" | ".INF" => Some(sign * f64::INFINITY),
    ".nan" | ".NaN" | ".NAN" if body.len() == text.len() => Some(f64::NAN),
    _ => text.parse().ok(),
  }
}

impl Serialize for Value {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    match self {
      Value::Null => serializer.serialize_unit(),
      Value::Bool(b) => serializer.serialize_bool(*b),
      Value::Number(Number::Integer(i)) => serializer.serialize_i64(*i),
      Value::Number(Number::Real(text)) => match parse_real(text) {
        Some(f) => serializer.serialize_f64(f),
        None => serializer.serialize_str(text),
      },
      Value::String(s) => serializer.serialize_str(s),
      Value::Sequence(items) => serializer.collect_seq(items),
      Value::Mapping(map) => serializer.collect_map(map),
    }
  }
}

impl<'de> Deserialize<'de> for Value {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    deserializer.deserialize_any(ValueVisitor)
  }
}

struct ValueVisitor;

impl<'de> Visitor<'de> for ValueVisitor {
  type Value = Value;

  fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str("any YAML-compatible value")
  }

  fn visit_bool<E: de::Error>(self, v: bool) -> Result<Value, E> {
    Ok(Value::Bool(v))
  }

  fn visit_i64<E: de::Error>(self, v: i64) -> Result<Value, E> {
    Ok(Value::from(v))
  }

  fn visit_u64<E: de::Error>(self, v: u64) -> Result<Value, E> {
    Ok(match i64::try_from(v) {
      Ok(i) => Value::from(i),
      Err(_) => Value::Number(Number::Real(v.to_string())),
    })
  }

  fn visit_f64<E: de::Error>(self, v: f64) -> Result<Value, E> {
    Ok(Value::Number(Number::Real(format!("{:?}", v))))
  }

  fn visit_str<E: de::Error>(self, v: &str) -> Result<Value, E> {
    Ok(Value::String(v.to_string()))
  }

  fn visit_string<E: de::Error>(self, v: String) -> Result<Value, E> {
    Ok(Value::String(v))
  }

  fn visit_unit<E: de::Error>(self) -> Result<Value, E> {
    Ok(Value::Null)
  }

  fn visit_none<E: de::Error>(self) -> Result<Value, E> {
    Ok(Value::Null)
  }

  fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Value, D::Error> {
    Value::deserialize(deserializer)
  }

  fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Value, A::Error> {
    let mut items = Vec::new();
    while let Some(item) = seq.next_element()? {
      items.push(item);
    }
    Ok(Value::Sequence(items))
  }

  fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Value, A::Error> {
    let mut map = Mapping::new();
    while let Some((key, value)) = access.next_entry::<String, Value>()? {
      map.insert(key, value);
    }
    Ok(Value::Mapping(map))
  }
}
