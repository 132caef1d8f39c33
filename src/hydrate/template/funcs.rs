//! Template function library
//!
//! Functions take already-evaluated arguments; a piped value arrives as the
//! last argument, so `.x | default "a"` calls `default "a" .x`.

use crate::catalog::value::{Mapping, Number, Value};
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::cmp::Ordering;

pub type FuncResult = Result<Value, String>;

const FUNCTIONS: &[&str] = &[
  // comparison and logic
  "eq", "ne", "lt", "le", "gt", "ge", "and", "or", "not",
  // strings
  "upper", "lower", "title", "trim", "trimPrefix", "trimSuffix", "trimAll", "replace", "repeat", "contains",
  "hasPrefix", "hasSuffix", "quote", "squote", "cat", "indent", "nindent", "substr", "trunc", "printf", "print",
  "splitList", "join",
  // defaults
  "default", "empty", "coalesce", "ternary", "required", "fail",
  // collections
  "list", "dict", "get", "hasKey", "keys", "first", "last", "has", "len",
  // conversion
  "toString", "int", "float", "toYaml", "toJson",
  // hashing and time
  "sha256sum", "now", "date",
];

pub fn is_defined(name: &str) -> bool {
  FUNCTIONS.contains(&name)
}

/// Call a library function
pub fn call(name: &str, args: Vec<Value>) -> FuncResult {
  match name {
    "eq" => {
      let (first, rest) = split_first(name, &args)?;
      if rest.is_empty() {
        return Err("missing argument for comparison".to_string());
      }
      Ok(Value::Bool(rest.iter().any(|other| values_equal(first, other))))
    }
    "ne" => {
      let [a, b] = exact::<2>(name, &args)?;
      Ok(Value::Bool(!values_equal(a, b)))
    }
    "lt" | "le" | "gt" | "ge" => {
      let [a, b] = exact::<2>(name, &args)?;
      let ord = compare(a, b)?;
      Ok(Value::Bool(match name {
        "lt" => ord == Ordering::Less,
        "le" => ord != Ordering::Greater,
        "gt" => ord == Ordering::Greater,
        _ => ord != Ordering::Less,
      }))
    }
    "and" => {
      split_first(name, &args)?;
      Ok(args.iter().find(|v| !v.is_truthy()).or(args.last()).cloned().unwrap_or_default())
    }
    "or" => {
      split_first(name, &args)?;
      Ok(args.iter().find(|v| v.is_truthy()).or(args.last()).cloned().unwrap_or_default())
    }
    "not" => {
      let [a] = exact::<1>(name, &args)?;
      Ok(Value::Bool(!a.is_truthy()))
    }

    "upper" => map_str(name, &args, |s| s.to_uppercase()),
    "lower" => map_str(name, &args, |s| s.to_lowercase()),
    "title" => map_str(name, &args, title_case),
    "trim" => map_str(name, &args, |s| s.trim().to_string()),
    "trimPrefix" => {
      let [prefix, s] = exact::<2>(name, &args)?;
      let (prefix, s) = (to_text(prefix), to_text(s));
      Ok(Value::String(s.strip_prefix(prefix.as_str()).unwrap_or(&s).to_string()))
    }
    "trimSuffix" => {
      let [suffix, s] = exact::<2>(name, &args)?;
      let (suffix, s) = (to_text(suffix), to_text(s));
      Ok(Value::String(s.strip_suffix(suffix.as_str()).unwrap_or(&s).to_string()))
    }
    "trimAll" => {
      let [cutset, s] = exact::<2>(name, &args)?;
      let cutset = to_text(cutset);
      Ok(Value::String(to_text(s).trim_matches(|c: char| cutset.contains(c)).to_string()))
    }
    "replace" => {
      let [old, new, s] = exact::<3>(name, &args)?;
      Ok(Value::String(to_text(s).replace(&to_text(old), &to_text(new))))
    }
    "repeat" => {
      let [count, s] = exact::<2>(name, &args)?;
      let count = to_int(count)?.max(0) as usize;
      Ok(Value::String(to_text(s).repeat(count)))
    }
    "contains" => {
      let [needle, s] = exact::<2>(name, &args)?;
      Ok(Value::Bool(to_text(s).contains(&to_text(needle))))
    }
    "hasPrefix" => {
      let [prefix, s] = exact::<2>(name, &args)?;
      Ok(Value::Bool(to_text(s).starts_with(&to_text(prefix))))
    }
    "hasSuffix" => {
      let [suffix, s] = exact::<2>(name, &args)?;
      Ok(Value::Bool(to_text(s).ends_with(&to_text(suffix))))
    }
    "quote" => Ok(Value::String(
      args
        .iter()
        .filter(|v| !v.is_null())
        .map(|v| go_quote(&to_text(v)))
        .collect::<Vec<_>>()
        .join(" "),
    )),
    "squote" => Ok(Value::String(
      args
        .iter()
        .filter(|v| !v.is_null())
        .map(|v| format!("'{}'", to_text(v)))
        .collect::<Vec<_>>()
        .join(" "),
    )),
    "cat" => Ok(Value::String(
      args
        .iter()
        .filter(|v| !v.is_null())
        .map(to_text)
        .collect::<Vec<_>>()
        .join(" "),
    )),
    "indent" => {
      let [width, s] = exact::<2>(name, &args)?;
      Ok(Value::String(indent(to_int(width)?, &to_text(s))))
    }
    "nindent" => {
      let [width, s] = exact::<2>(name, &args)?;
      Ok(Value::String(format!("\n{}", indent(to_int(width)?, &to_text(s)))))
    }
    "substr" => {
      let [start, end, s] = exact::<3>(name, &args)?;
      let chars: Vec<char> = to_text(s).chars().collect();
      let (start, end) = (to_int(start)?, to_int(end)?);
      let len = chars.len() as i64;
      let (from, to) = if start < 0 {
        (0, end.clamp(0, len))
      } else if end < 0 || end > len {
        (start.min(len), len)
      } else {
        (start.min(end), end)
      };
      Ok(Value::String(chars[from as usize..to as usize].iter().collect()))
    }
    "trunc" => {
      let [count, s] = exact::<2>(name, &args)?;
      let chars: Vec<char> = to_text(s).chars().collect();
      let count = to_int(count)?;
      let len = chars.len() as i64;
      let text: String = if count >= 0 {
        chars[..count.min(len) as usize].iter().collect()
      } else {
        chars[(len + count).max(0) as usize..].iter().collect()
      };
      Ok(Value::String(text))
    }
    "printf" => {
      let (format, rest) = split_first(name, &args)?;
      Ok(Value::String(sprintf(&to_text(format), rest)))
    }
    "print" => Ok(Value::String(sprint(&args))),
    "splitList" => {
      let [sep, s] = exact::<2>(name, &args)?;
      let sep = to_text(sep);
      Ok(Value::Sequence(
        to_text(s).split(sep.as_str()).map(|part| Value::String(part.to_string())).collect(),
      ))
    }
    "join" => {
      let [sep, list] = exact::<2>(name, &args)?;
      let items = match list {
        Value::Sequence(items) => items.iter().map(to_text).collect::<Vec<_>>(),
        Value::Null => Vec::new(),
        other => vec![to_text(other)],
      };
      Ok(Value::String(items.join(&to_text(sep))))
    }

    "default" => match args.as_slice() {
      [fallback] => Ok(fallback.clone()),
      [fallback, given] => Ok(if given.is_truthy() { given.clone() } else { fallback.clone() }),
      _ => Err(arity(name, 2, args.len())),
    },
    "empty" => {
      let [v] = exact::<1>(name, &args)?;
      Ok(Value::Bool(!v.is_truthy()))
    }
    "coalesce" => Ok(args.iter().find(|v| v.is_truthy()).cloned().unwrap_or_default()),
    "ternary" => {
      let [if_true, if_false, cond] = exact::<3>(name, &args)?;
      Ok(if cond.is_truthy() { if_true.clone() } else { if_false.clone() })
    }
    "required" => {
      let [message, v] = exact::<2>(name, &args)?;
      match v {
        Value::Null => Err(to_text(message)),
        Value::String(s) if s.is_empty() => Err(to_text(message)),
        other => Ok(other.clone()),
      }
    }
    "fail" => {
      let [message] = exact::<1>(name, &args)?;
      Err(to_text(message))
    }

    "list" => Ok(Value::Sequence(args)),
    "dict" => {
      let mut map = Mapping::new();
      for pair in args.chunks(2) {
        let value = pair.get(1).cloned().unwrap_or_else(|| Value::String(String::new()));
        map.insert(to_text(&pair[0]), value);
      }
      Ok(Value::Mapping(map))
    }
    "get" => {
      let [map, key] = exact::<2>(name, &args)?;
      let map = expect_mapping(name, map)?;
      Ok(map.get(&to_text(key)).cloned().unwrap_or_else(|| Value::String(String::new())))
    }
    "hasKey" => {
      let [map, key] = exact::<2>(name, &args)?;
      Ok(Value::Bool(expect_mapping(name, map)?.contains_key(&to_text(key))))
    }
    "keys" => {
      let mut keys = Vec::new();
      for map in &args {
        keys.extend(expect_mapping(name, map)?.keys().cloned());
      }
      keys.sort();
      keys.dedup();
      Ok(Value::Sequence(keys.into_iter().map(Value::String).collect()))
    }
    "first" | "last" => {
      let [list] = exact::<1>(name, &args)?;
      let item = match list {
        Value::Sequence(items) if name == "first" => items.first(),
        Value::Sequence(items) => items.last(),
        Value::Null => None,
        other => return Err(format!("{} of {} is not supported", name, other.type_name())),
      };
      Ok(item.cloned().unwrap_or_default())
    }
    "has" => {
      let [needle, list] = exact::<2>(name, &args)?;
      Ok(Value::Bool(match list {
        Value::Sequence(items) => items.iter().any(|item| values_equal(item, needle)),
        _ => false,
      }))
    }
    "len" => {
      let [v] = exact::<1>(name, &args)?;
      let len = match v {
        Value::String(s) => s.chars().count(),
        Value::Sequence(items) => items.len(),
        Value::Mapping(map) => map.len(),
        Value::Null => 0,
        other => return Err(format!("len of {} is not supported", other.type_name())),
      };
      Ok(Value::Number(Number::Integer(len as i64)))
    }

    "toString" => {
      let [v] = exact::<1>(name, &args)?;
      Ok(Value::String(to_text(v)))
    }
    "int" => {
      let [v] = exact::<1>(name, &args)?;
      Ok(Value::Number(Number::Integer(to_int(v).unwrap_or(0))))
    }
    "float" => {
      let [v] = exact::<1>(name, &args)?;
      Ok(Value::Number(Number::Real(format_float(to_float(v).unwrap_or(0.0)))))
    }
    "toYaml" => {
      let [v] = exact::<1>(name, &args)?;
      v.to_yaml_string()
        .map(|text| Value::String(text.trim_end().to_string()))
        .map_err(|e| e.to_string())
    }
    "toJson" => {
      let [v] = exact::<1>(name, &args)?;
      serde_json::to_string(v).map(Value::String).map_err(|e| e.to_string())
    }

    "sha256sum" => {
      let [v] = exact::<1>(name, &args)?;
      Ok(Value::String(format!("{:x}", Sha256::digest(to_text(v).as_bytes()))))
    }
    "now" => {
      exact::<0>(name, &args)?;
      Ok(Value::String(Utc::now().to_rfc3339()))
    }
    "date" => {
      let [layout, time] = exact::<2>(name, &args)?;
      let time = parse_time(time)?;
      Ok(Value::String(time.format(&go_layout_to_strftime(&to_text(layout))).to_string()))
    }

    other => Err(format!("function {:?} not defined", other)),
  }
}

fn arity(name: &str, want: usize, got: usize) -> String {
  format!("wrong number of args for {}: want {} got {}", name, want, got)
}

fn exact<'a, const N: usize>(name: &str, args: &'a [Value]) -> Result<&'a [Value; N], String> {
  args.try_into().map_err(|_| arity(name, N, args.len()))
}

fn split_first<'a>(name: &str, args: &'a [Value]) -> Result<(&'a Value, &'a [Value]), String> {
  args
    .split_first()
    .ok_or_else(|| format!("wrong number of args for {}: want at least 1 got 0", name))
}

fn map_str(name: &str, args: &[Value], f: impl Fn(&str) -> String) -> FuncResult {
  let [v] = exact::<1>(name, args)?;
  Ok(Value::String(f(&to_text(v))))
}

fn expect_mapping<'a>(name: &str, v: &'a Value) -> Result<&'a Mapping, String> {
  v.as_mapping()
    .ok_or_else(|| format!("{} expects a map, got {}", name, v.type_name()))
}

/// Text as printed by an action: null prints empty, collections Go-style
pub fn to_text(v: &Value) -> String {
  match v {
    Value::Null => String::new(),
    Value::Bool(b) => b.to_string(),
    Value::Number(n) => n.to_string(),
    Value::String(s) => s.clone(),
    Value::Sequence(items) => format!("[{}]", items.iter().map(to_text).collect::<Vec<_>>().join(" ")),
    Value::Mapping(map) => format!(
      "map[{}]",
      map
        .iter()
        .map(|(k, v)| format!("{}:{}", k, to_text(v)))
        .collect::<Vec<_>>()
        .join(" ")
    ),
  }
}

fn to_float(v: &Value) -> Option<f64> {
  match v {
    Value::Number(n) => n.as_f64(),
    Value::String(s) => s.trim().parse().ok(),
    Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
    _ => None,
  }
}

fn to_int(v: &Value) -> Result<i64, String> {
  if let Value::Number(Number::Integer(i)) = v {
    return Ok(*i);
  }
  if let Some(Ok(i)) = v.as_str().map(|s| s.trim().parse::<i64>()) {
    return Ok(i);
  }
  to_float(v)
    .map(|f| f.trunc() as i64)
    .ok_or_else(|| format!("cannot convert {} to int", v.type_name()))
}

fn format_float(f: f64) -> String {
  if f.fract() == 0.0 && f.is_finite() {
    format!("{:.1}", f)
  } else {
    f.to_string()
  }
}

/// Equality with integers and reals compared numerically
pub fn values_equal(a: &Value, b: &Value) -> bool {
  match (a, b) {
    (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
    _ => a == b,
  }
}

fn compare(a: &Value, b: &Value) -> Result<Ordering, String> {
  match (a, b) {
    (Value::Number(Number::Integer(x)), Value::Number(Number::Integer(y))) => Ok(x.cmp(y)),
    (Value::Number(x), Value::Number(y)) => x
      .as_f64()
      .zip(y.as_f64())
      .and_then(|(x, y)| x.partial_cmp(&y))
      .ok_or_else(|| "invalid number for comparison".to_string()),
    (Value::String(x), Value::String(y)) => Ok(x.cmp(y)),
    _ => Err(format!(
      "incompatible types for comparison: {} and {}",
      a.type_name(),
      b.type_name()
    )),
  }
}

fn title_case(s: &str) -> String {
  let mut out = String::with_capacity(s.len());
  let mut at_word_start = true;
  for c in s.chars() {
    if at_word_start && c.is_alphabetic() {
      out.extend(c.to_uppercase());
    } else {
      out.push(c);
    }
    at_word_start = c.is_whitespace() || c == '-' || c == '_';
  }
  out
}

fn indent(width: i64, s: &str) -> String {
  let pad = " ".repeat(width.max(0) as usize);
  s.split('\n').map(|line| format!("{}{}", pad, line)).collect::<Vec<_>>().join("\n")
}

fn go_quote(s: &str) -> String {
  let mut out = String::from("\"");
  for c in s.chars() {
    match c {
      '"' => out.push_str("\\\""),
      '\\' => out.push_str("\\\\"),
      '\n' => out.push_str("\\n"),
      '\t' => out.push_str("\\t"),
      '\r' => out.push_str("\\r"),
      c if c.is_control() => out.push_str(&format!("\\u{:04x}", c as u32)),
      c => out.push(c),
    }
  }
  out.push('"');
  out
}

/// Go's `fmt.Sprint`: spaces only between operands that are not both strings
fn sprint(args: &[Value]) -> String {
  let mut out = String::new();
  for (i, arg) in args.iter().enumerate() {
    if i > 0 && !matches!(arg, Value::String(_)) && !matches!(args[i - 1], Value::String(_)) {
      out.push(' ');
    }
    out.push_str(&to_text(arg));
  }
  out
}

/// Subset of Go's `fmt.Sprintf`: flags `-0+`, width, precision and verbs `v s d f q t x %`
fn sprintf(format: &str, args: &[Value]) -> String {
  let mut out = String::new();
  let mut args = args.iter();
  let mut chars = format.chars().peekable();

  while let Some(c) = chars.next() {
    if c != '%' {
      out.push(c);
      continue;
    }

    let mut left = false;
    let mut zero = false;
    let mut plus = false;
    while let Some(&flag) = chars.peek() {
      match flag {
        '-' => left = true,
        '0' => zero = true,
        '+' => plus = true,
        _ => break,
      }
      chars.next();
    }
    let mut width = String::new();
    while let Some(&d) = chars.peek().filter(|d| d.is_ascii_digit()) {
      width.push(d);
      chars.next();
    }
    let mut precision = None;
    if chars.peek() == Some(&'.') {
      chars.next();
      let mut p = String::new();
      while let Some(&d) = chars.peek().filter(|d| d.is_ascii_digit()) {
        p.push(d);
        chars.next();
      }
      precision = Some(p.parse::<usize>().unwrap_or(0));
    }

    let Some(verb) = chars.next() else {
      out.push_str("%!(NOVERB)");
      break;
    };
    if verb == '%' {
      out.push('%');
      continue;
    }
    let Some(arg) = args.next() else {
      out.push_str(&format!("%!{}(MISSING)", verb));
      continue;
    };

    let text = match verb {
      'd' => match to_int(arg) {
        Ok(n) if plus && n >= 0 => format!("+{}", n),
        Ok(n) => n.to_string(),
        Err(_) => format!("%!d({})", to_text(arg)),
      },
      'f' => match to_float(arg) {
        Some(f) => format!("{:.*}", precision.unwrap_or(6), f),
        None => format!("%!f({})", to_text(arg)),
      },
      'q' => go_quote(&to_text(arg)),
      'x' => match arg {
        Value::Number(Number::Integer(n)) => format!("{:x}", n),
        other => to_text(other).bytes().map(|b| format!("{:02x}", b)).collect(),
      },
      's' | 'v' | 't' => {
        let text = to_text(arg);
        match precision {
          Some(p) if verb == 's' => text.chars().take(p).collect(),
          _ => text,
        }
      }
      other => format!("%!{}({})", other, to_text(arg)),
    };

    let width: usize = width.parse().unwrap_or(0);
    let len = text.chars().count();
    if len >= width {
      out.push_str(&text);
    } else if left {
      out.push_str(&text);
      out.push_str(&" ".repeat(width - len));
    } else if zero && matches!(verb, 'd' | 'f') {
      let (sign, digits) = match text.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", text.as_str()),
      };
      out.push_str(sign);
      out.push_str(&"0".repeat(width - len));
      out.push_str(digits);
    } else {
      out.push_str(&" ".repeat(width - len));
      out.push_str(&text);
    }
  }

  let extra: Vec<String> = args.map(to_text).collect();
  if !extra.is_empty() {
    out.push_str(&format!("%!(EXTRA {})", extra.join(", ")));
  }
  out
}

fn parse_time(v: &Value) -> Result<DateTime<Utc>, String> {
  match v {
    Value::Number(Number::Integer(secs)) => {
      DateTime::from_timestamp(*secs, 0).ok_or_else(|| format!("invalid unix time {}", secs))
    }
    Value::String(s) => DateTime::parse_from_rfc3339(s)
      .map(|t| t.with_timezone(&Utc))
      .map_err(|e| format!("invalid time {:?}: {}", s, e)),
    other => Err(format!("date expects a time, got {}", other.type_name())),
  }
}

/// Translate a Go reference-time layout (`2006-01-02 15:04:05`) to strftime
fn go_layout_to_strftime(layout: &str) -> String {
  const TOKENS: &[(&str, &str)] = &[
    ("2006", "%Y"),
    ("January", "%B"),
    ("Monday", "%A"),
    ("-07:00", "%:z"),
    ("-0700", "%z"),
    ("Jan", "%b"),
    ("Mon", "%a"),
    ("MST", "%Z"),
    ("01", "%m"),
    ("02", "%d"),
    ("15", "%H"),
    ("03", "%I"),
    ("04", "%M"),
    ("05", "%S"),
    ("06", "%y"),
    ("PM", "%p"),
  ];

  let mut out = String::new();
  let mut rest = layout;
  'outer: while !rest.is_empty() {
    for (go, strf) in TOKENS {
      if let Some(tail) = rest.strip_prefix(go) {
        out.push_str(strf);
        rest = tail;
        continue 'outer;
      }
    }
    let mut chars = rest.chars();
    if let Some(c) = chars.next() {
      if c == '%' {
        out.push_str("%%");
      } else {
        out.push(c);
      }
    }
    rest = chars.as_str();
  }
  out
}

#[cfg(test)]
mod tests {
  use super::*;

  fn s(text: &str) -> Value {
    Value::from(text)
  }

  fn int(n: i64) -> Value {
    Value::from(n)
  }

  #[test]
  fn test_comparisons() {
    assert_eq!(call("eq", vec![int(1), int(2), int(1)]).unwrap(), Value::Bool(true));
    assert_eq!(
      call("eq", vec![int(1), Value::Number(Number::Real("1.0".into()))]).unwrap(),
      Value::Bool(true)
    );
    assert_eq!(call("lt", vec![s("a"), s("b")]).unwrap(), Value::Bool(true));
    assert!(call("lt", vec![s("a"), int(1)]).is_err());
    assert_eq!(call("and", vec![int(1), s(""), int(2)]).unwrap(), s(""));
    assert_eq!(call("or", vec![Value::Null, s("x")]).unwrap(), s("x"));
  }

  #[test]
  fn test_strings() {
    assert_eq!(call("title", vec![s("hello big-world")]).unwrap(), s("Hello Big-World"));
    assert_eq!(call("trimPrefix", vec![s("v"), s("v1.2")]).unwrap(), s("1.2"));
    assert_eq!(call("trimAll", vec![s("$"), s("$5.00$")]).unwrap(), s("5.00"));
    assert_eq!(call("replace", vec![s("-"), s("_"), s("a-b-c")]).unwrap(), s("a_b_c"));
    assert_eq!(call("quote", vec![s("a\"b"), int(2)]).unwrap(), s("\"a\\\"b\" \"2\""));
    assert_eq!(call("squote", vec![s("x")]).unwrap(), s("'x'"));
    assert_eq!(call("nindent", vec![int(2), s("a\nb")]).unwrap(), s("\n  a\n  b"));
    assert_eq!(call("substr", vec![int(1), int(3), s("hello")]).unwrap(), s("el"));
    assert_eq!(call("trunc", vec![int(-3), s("hello")]).unwrap(), s("llo"));
    assert_eq!(
      call("splitList", vec![s(","), s("a,b")]).unwrap(),
      Value::Sequence(vec![s("a"), s("b")])
    );
    assert_eq!(
      call("join", vec![s("-"), Value::Sequence(vec![s("a"), int(1)])]).unwrap(),
      s("a-1")
    );
  }

  #[test]
  fn test_printf_and_print() {
    assert_eq!(
      call("printf", vec![s("%s=%05d|%-4s|%.2f%%"), s("n"), int(42), s("x"), s("3.14159")]).unwrap(),
      s("n=00042|x   |3.14%")
    );
    assert_eq!(call("printf", vec![s("%q"), s("a")]).unwrap(), s("\"a\""));
    assert_eq!(call("print", vec![int(1), int(2), s("a"), s("b")]).unwrap(), s("1 2ab"));
  }

  #[test]
  fn test_defaults() {
    assert_eq!(call("default", vec![s("x"), Value::Null]).unwrap(), s("x"));
    assert_eq!(call("default", vec![s("x"), s("y")]).unwrap(), s("y"));
    assert_eq!(call("default", vec![s("x")]).unwrap(), s("x"));
    assert_eq!(call("coalesce", vec![Value::Null, s(""), int(3)]).unwrap(), int(3));
    assert_eq!(call("ternary", vec![s("a"), s("b"), Value::Bool(false)]).unwrap(), s("b"));
    assert_eq!(call("required", vec![s("need x"), Value::Null]).unwrap_err(), "need x");
    assert_eq!(call("fail", vec![s("boom")]).unwrap_err(), "boom");
  }

  #[test]
  fn test_collections() {
    let dict = call("dict", vec![s("b"), int(2), s("a"), int(1)]).unwrap();
    assert_eq!(call("keys", vec![dict.clone()]).unwrap(), Value::Sequence(vec![s("a"), s("b")]));
    assert_eq!(call("get", vec![dict.clone(), s("a")]).unwrap(), int(1));
    assert_eq!(call("get", vec![dict.clone(), s("z")]).unwrap(), s(""));
    assert_eq!(call("hasKey", vec![dict.clone(), s("b")]).unwrap(), Value::Bool(true));
    assert_eq!(call("len", vec![dict]).unwrap(), int(2));
    let list = call("list", vec![int(1), int(2)]).unwrap();
    assert_eq!(call("first", vec![list.clone()]).unwrap(), int(1));
    assert_eq!(call("last", vec![list.clone()]).unwrap(), int(2));
    assert_eq!(call("has", vec![int(2), list]).unwrap(), Value::Bool(true));
  }

  #[test]
  fn test_conversion_and_hashing() {
    assert_eq!(call("int", vec![s("12")]).unwrap(), int(12));
    assert_eq!(call("float", vec![int(2)]).unwrap(), Value::Number(Number::Real("2.0".into())));
    assert_eq!(call("toString", vec![Value::Bool(true)]).unwrap(), s("true"));
    let map = call("dict", vec![s("a"), int(1)]).unwrap();
    assert_eq!(call("toYaml", vec![map.clone()]).unwrap(), s("a: 1"));
    assert_eq!(call("toJson", vec![map]).unwrap(), s("{\"a\":1}"));
    assert_eq!(
      call("sha256sum", vec![s("abc")]).unwrap(),
      s("ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad")
    );
  }

  #[test]
  fn test_date() {
    assert_eq!(
      call("date", vec![s("2006-01-02 15:04"), s("2024-03-05T07:08:09Z")]).unwrap(),
      s("2024-03-05 07:08")
    );
    assert!(call("now", vec![]).unwrap().as_str().is_some());
  }
}
