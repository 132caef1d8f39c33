//! Template parser
//!
//! Two passes: the source is split into literal text and `{{ }}` actions
//! (each lexed into tokens, with trim markers applied to neighbouring text),
//! then the flat item list is folded into a tree at `if`/`with`/`range`/`else`/`end`.

use super::ast::{Assignment, Command, Conditional, Operand, Pipeline, RangeLoop, TemplateNode};
use super::funcs;
use crate::core::error::TemplateError;

type ParseResult<T> = Result<T, TemplateError>;

#[derive(Debug, Clone, PartialEq)]
enum Token {
  Field(Vec<String>),
  /// Field chain directly after `)`
  Chain(Vec<String>),
  Variable { name: String, fields: Vec<String> },
  Ident(String),
  Str(String),
  Number(String),
  Pipe,
  LParen,
  RParen,
  Comma,
  Declare,
  Assign,
}

#[derive(Debug)]
enum Item {
  Text(String),
  Action { tokens: Vec<Token>, line: usize, source: String },
}

/// Parse template source into nodes
pub fn parse(source: &str) -> ParseResult<Vec<TemplateNode>> {
  let items = split_items(source)?;
  let mut pos = 0;
  let (nodes, stop) = parse_list(&items, &mut pos)?;
  match stop {
    Stop::Eof => Ok(nodes),
    Stop::End { line } => Err(parse_error(line, "unexpected {{end}}")),
    Stop::Else { line, .. } => Err(parse_error(line, "unexpected {{else}}")),
  }
}

fn parse_error(line: usize, message: impl Into<String>) -> TemplateError {
  TemplateError::Parse {
    line,
    message: message.into(),
  }
}

// ----------------------------------------------------------------------------
// Pass 1: text / action split and lexing
// ----------------------------------------------------------------------------

fn split_items(source: &str) -> ParseResult<Vec<Item>> {
  let mut items = Vec::new();
  let mut rest = source;
  let mut line = 1;
  let mut trim_next_text = false;

  while !rest.is_empty() {
    let Some(open) = rest.find("{{") else {
      push_text(&mut items, rest, trim_next_text, false);
      break;
    };

    let after_open = &rest[open + 2..];
    let trim_left = after_open.starts_with('-') && after_open[1..].starts_with(|c: char| c.is_ascii_whitespace());
    push_text(&mut items, &rest[..open], trim_next_text, trim_left);
    line += rest[..open].matches('\n').count();

    let body = if trim_left { &after_open[1..] } else { after_open };
    let action_line = line;
    let (tokens, consumed, trim_right, is_comment) = lex_action(body, action_line)?;
    let action_text = &body[..consumed];
    line += action_text.matches('\n').count();

    if !is_comment {
      items.push(Item::Action {
        tokens,
        line: action_line,
        source: action_source(action_text),
      });
    }
    trim_next_text = trim_right;
    rest = &body[consumed..];
  }

  Ok(items)
}

fn push_text(items: &mut Vec<Item>, text: &str, trim_start: bool, trim_end: bool) {
  let mut text = text;
  if trim_start {
    text = text.trim_start();
  }
  if trim_end {
    text = text.trim_end();
  }
  if !text.is_empty() {
    items.push(Item::Text(text.to_string()));
  }
}

fn action_source(text: &str) -> String {
  let text = text.strip_suffix("}}").unwrap_or(text);
  let text = text.trim_end();
  let text = text.strip_suffix('-').unwrap_or(text);
  text.trim().to_string()
}

fn is_ident_char(c: char) -> bool {
  c.is_alphanumeric() || c == '_'
}

/// Lex one action body up to and including `}}`.
/// Returns tokens, bytes consumed, whether `-}}` trims the following text, and whether it was a comment.
fn lex_action(body: &str, line: usize) -> ParseResult<(Vec<Token>, usize, bool, bool)> {
  let chars: Vec<(usize, char)> = body.char_indices().collect();
  let byte_at = |i: usize| chars.get(i).map(|(b, _)| *b).unwrap_or(body.len());
  let mut tokens = Vec::new();
  let mut i = 0;

  let skip_ws = |mut i: usize| {
    while i < chars.len() && chars[i].1.is_whitespace() {
      i += 1;
    }
    i
  };

  // Comment: {{/* ... */}}
  let start = skip_ws(0);
  if body[byte_at(start)..].starts_with("/*") {
    let from = byte_at(start) + 2;
    let close = body[from..]
      .find("*/")
      .ok_or_else(|| parse_error(line, "unclosed comment"))?;
    let after = from + close + 2;
    let tail = &body[after..];
    let trimmed = tail.trim_start();
    let ws = tail.len() - trimmed.len();
    if trimmed.starts_with("-}}") {
      return Ok((Vec::new(), after + ws + 3, true, true));
    }
    if trimmed.starts_with("}}") {
      return Ok((Vec::new(), after + ws + 2, false, true));
    }
    return Err(parse_error(line, "comment ends before closing delimiter"));
  }

  loop {
    let Some(&(b, c)) = chars.get(i) else {
      return Err(parse_error(line, "unclosed action"));
    };

    if c.is_whitespace() {
      let j = skip_ws(i);
      if body[byte_at(j)..].starts_with("-}}") {
        return Ok((tokens, byte_at(j) + 3, true, false));
      }
      i = j;
      continue;
    }

    if body[b..].starts_with("}}") {
      return Ok((tokens, b + 2, false, false));
    }

    match c {
      '|' => {
        tokens.push(Token::Pipe);
        i += 1;
      }
      '(' => {
        tokens.push(Token::LParen);
        i += 1;
      }
      ')' => {
        tokens.push(Token::RParen);
        i += 1;
        if matches!(chars.get(i), Some((_, '.'))) {
          let (fields, next) = lex_fields(&chars, i, line)?;
          tokens.push(Token::Chain(fields));
          i = next;
        }
      }
      ',' => {
        tokens.push(Token::Comma);
        i += 1;
      }
      ':' if matches!(chars.get(i + 1), Some((_, '='))) => {
        tokens.push(Token::Declare);
        i += 2;
      }
      '=' => {
        tokens.push(Token::Assign);
        i += 1;
      }
      '"' => {
        let (text, next) = lex_quoted(&chars, i + 1, line)?;
        tokens.push(Token::Str(text));
        i = next;
      }
      '`' => {
        let mut j = i + 1;
        let mut text = String::new();
        while j < chars.len() && chars[j].1 != '`' {
          text.push(chars[j].1);
          j += 1;
        }
        if j >= chars.len() {
          return Err(parse_error(line, "unterminated raw string"));
        }
        tokens.push(Token::Str(text));
        i = j + 1;
      }
      '.' => {
        if chars.get(i + 1).is_some_and(|(_, n)| n.is_alphabetic() || *n == '_') {
          let (fields, next) = lex_fields(&chars, i, line)?;
          tokens.push(Token::Field(fields));
          i = next;
        } else {
          tokens.push(Token::Field(Vec::new()));
          i += 1;
        }
      }
      '$' => {
        let mut j = i + 1;
        let mut name = String::from("$");
        while j < chars.len() && is_ident_char(chars[j].1) {
          name.push(chars[j].1);
          j += 1;
        }
        let mut fields = Vec::new();
        if matches!(chars.get(j), Some((_, '.'))) && chars.get(j + 1).is_some_and(|(_, n)| is_ident_char(*n)) {
          let (f, next) = lex_fields(&chars, j, line)?;
          fields = f;
          j = next;
        }
        tokens.push(Token::Variable { name, fields });
        i = j;
      }
      c if c.is_ascii_digit()
        || ((c == '-' || c == '+') && chars.get(i + 1).is_some_and(|(_, n)| n.is_ascii_digit())) =>
      {
        let mut j = i + 1;
        while j < chars.len() && (chars[j].1.is_ascii_alphanumeric() || matches!(chars[j].1, '.' | '_')) {
          j += 1;
        }
        tokens.push(Token::Number(body[b..byte_at(j)].to_string()));
        i = j;
      }
      c if c.is_alphabetic() || c == '_' => {
        let mut j = i;
        while j < chars.len() && is_ident_char(chars[j].1) {
          j += 1;
        }
        tokens.push(Token::Ident(body[b..byte_at(j)].to_string()));
        i = j;
      }
      other => return Err(parse_error(line, format!("unexpected {:?} in action", other))),
    }
  }
}

/// Lex `.A.B.C` starting at a `.`
fn lex_fields(chars: &[(usize, char)], mut i: usize, line: usize) -> ParseResult<(Vec<String>, usize)> {
  let mut fields = Vec::new();
  while matches!(chars.get(i), Some((_, '.'))) {
    let mut name = String::new();
    i += 1;
    while i < chars.len() && is_ident_char(chars[i].1) {
      name.push(chars[i].1);
      i += 1;
    }
    if name.is_empty() {
      return Err(parse_error(line, "empty field name"));
    }
    fields.push(name);
  }
  Ok((fields, i))
}

fn lex_quoted(chars: &[(usize, char)], mut i: usize, line: usize) -> ParseResult<(String, usize)> {
  let mut text = String::new();
  while let Some(&(_, c)) = chars.get(i) {
    match c {
      '"' => return Ok((text, i + 1)),
      '\\' => {
        let Some(&(_, escaped)) = chars.get(i + 1) else {
          break;
        };
        text.push(match escaped {
          'n' => '\n',
          't' => '\t',
          'r' => '\r',
          '0' => '\0',
          other => other,
        });
        i += 2;
      }
      '\n' => break,
      c => {
        text.push(c);
        i += 1;
      }
    }
  }
  Err(parse_error(line, "unterminated quoted string"))
}

// ----------------------------------------------------------------------------
// Pass 2: tree building
// ----------------------------------------------------------------------------

enum Stop {
  Eof,
  End { line: usize },
  Else { line: usize, tokens: Vec<Token> },
}

fn keyword(tokens: &[Token]) -> Option<&str> {
  match tokens.first() {
    Some(Token::Ident(word)) if matches!(word.as_str(), "if" | "else" | "end" | "range" | "with") => Some(word),
    _ => None,
  }
}

fn parse_list(items: &[Item], pos: &mut usize) -> ParseResult<(Vec<TemplateNode>, Stop)> {
  let mut nodes = Vec::new();

  while let Some(item) = items.get(*pos) {
    *pos += 1;
    let (tokens, line, source) = match item {
      Item::Text(text) => {
        nodes.push(TemplateNode::Text(text.clone()));
        continue;
      }
      Item::Action { tokens, line, source } => (tokens, *line, source),
    };

    match keyword(tokens) {
      Some("end") => {
        if tokens.len() > 1 {
          return Err(parse_error(line, "unexpected tokens after end"));
        }
        return Ok((nodes, Stop::End { line }));
      }
      Some("else") => {
        return Ok((
          nodes,
          Stop::Else {
            line,
            tokens: tokens[1..].to_vec(),
          },
        ));
      }
      Some("if") => {
        let cond = parse_conditional(items, pos, &tokens[1..], line, source, "if")?;
        nodes.push(TemplateNode::If(cond));
      }
      Some("with") => {
        let cond = parse_conditional(items, pos, &tokens[1..], line, source, "with")?;
        nodes.push(TemplateNode::With(cond));
      }
      Some("range") => nodes.push(TemplateNode::Range(parse_range(items, pos, &tokens[1..], line, source)?)),
      _ => {
        if tokens.is_empty() {
          return Err(parse_error(line, "missing value for command"));
        }
        nodes.push(TemplateNode::Action(parse_pipeline(tokens, line, source)?));
      }
    }
  }

  Ok((nodes, Stop::Eof))
}

fn expect_body_end(stop: Stop, open_line: usize, keyword: &str) -> ParseResult<()> {
  match stop {
    Stop::End { .. } => Ok(()),
    Stop::Else { line, .. } => Err(parse_error(line, format!("unexpected {{{{else}}}} in {}", keyword))),
    Stop::Eof => Err(parse_error(open_line, format!("unexpected EOF: {{{{{}}}}} has no {{{{end}}}}", keyword))),
  }
}

fn parse_conditional(
  items: &[Item],
  pos: &mut usize,
  tokens: &[Token],
  line: usize,
  source: &str,
  keyword: &str,
) -> ParseResult<Conditional> {
  let mut branches = Vec::new();
  let mut pipeline = parse_pipeline(tokens, line, source)?;

  loop {
    let (body, stop) = parse_list(items, pos)?;
    branches.push((pipeline, body));
    match stop {
      Stop::End { .. } => {
        return Ok(Conditional {
          branches,
          else_branch: None,
        });
      }
      Stop::Else { tokens, .. } if tokens.is_empty() => {
        let (else_body, stop) = parse_list(items, pos)?;
        expect_body_end(stop, line, keyword)?;
        return Ok(Conditional {
          branches,
          else_branch: Some(else_body),
        });
      }
      Stop::Else { line: else_line, tokens } => match tokens.first() {
        Some(Token::Ident(word)) if word == keyword => {
          pipeline = parse_pipeline(&tokens[1..], else_line, source)?;
        }
        _ => return Err(parse_error(else_line, format!("expected {{{{else {} ...}}}}", keyword))),
      },
      Stop::Eof => return Err(parse_error(line, format!("unexpected EOF: {{{{{}}}}} has no {{{{end}}}}", keyword))),
    }
  }
}

fn parse_range(items: &[Item], pos: &mut usize, tokens: &[Token], line: usize, source: &str) -> ParseResult<RangeLoop> {
  let var = |t: &Token| match t {
    Token::Variable { name, fields } if fields.is_empty() && name != "$" => Some(name.clone()),
    _ => None,
  };

  let (key_var, value_var, rest) = match tokens {
    [k, Token::Comma, v, Token::Declare, rest @ ..] => match (var(k), var(v)) {
      (Some(k), Some(v)) => (Some(k), Some(v), rest),
      _ => return Err(parse_error(line, "range can only initialize variables")),
    },
    [v, Token::Declare, rest @ ..] => match var(v) {
      Some(v) => (None, Some(v), rest),
      None => return Err(parse_error(line, "range can only initialize variables")),
    },
    rest => (None, None, rest),
  };

  let pipeline = parse_pipeline(rest, line, source)?;
  let (body, stop) = parse_list(items, pos)?;
  let else_branch = match stop {
    Stop::End { .. } => None,
    Stop::Else { tokens, line: else_line } => {
      if !tokens.is_empty() {
        return Err(parse_error(else_line, "range does not support chained else"));
      }
      let (else_body, stop) = parse_list(items, pos)?;
      expect_body_end(stop, line, "range")?;
      Some(else_body)
    }
    Stop::Eof => return Err(parse_error(line, "unexpected EOF: {{range}} has no {{end}}")),
  };

  Ok(RangeLoop {
    key_var,
    value_var,
    pipeline,
    body,
    else_branch,
  })
}

fn parse_pipeline(tokens: &[Token], line: usize, source: &str) -> ParseResult<Pipeline> {
  let (declare, tokens) = match tokens {
    [Token::Variable { name, fields }, Token::Declare, rest @ ..] if fields.is_empty() => (
      Some(Assignment {
        name: name.clone(),
        declare: true,
      }),
      rest,
    ),
    [Token::Variable { name, fields }, Token::Assign, rest @ ..] if fields.is_empty() => (
      Some(Assignment {
        name: name.clone(),
        declare: false,
      }),
      rest,
    ),
    _ => (None, tokens),
  };

  if tokens.is_empty() {
    return Err(parse_error(line, "missing value for command"));
  }

  let mut commands = Vec::new();
  let mut pos = 0;
  loop {
    let command = parse_command(tokens, &mut pos, line, source)?;
    commands.push(command);
    match tokens.get(pos) {
      None => break,
      Some(Token::Pipe) => pos += 1,
      Some(other) => return Err(parse_error(line, format!("unexpected {:?} in pipeline", other))),
    }
  }

  Ok(Pipeline {
    declare,
    commands,
    source: source.to_string(),
  })
}

fn parse_command(tokens: &[Token], pos: &mut usize, line: usize, source: &str) -> ParseResult<Command> {
  let mut args = Vec::new();
  while let Some(token) = tokens.get(*pos) {
    let operand = match token {
      Token::Pipe | Token::RParen => break,
      Token::Field(fields) => Operand::Field(fields.clone()),
      Token::Variable { name, fields } => Operand::Variable {
        name: name.clone(),
        fields: fields.clone(),
      },
      Token::Str(text) => Operand::Str(text.clone()),
      Token::Number(text) => parse_number(text, line)?,
      Token::Ident(word) => match word.as_str() {
        "true" => Operand::Bool(true),
        "false" => Operand::Bool(false),
        "nil" => Operand::Nil,
        name if funcs::is_defined(name) => Operand::Function(name.to_string()),
        name => return Err(parse_error(line, format!("function {:?} not defined", name))),
      },
      Token::LParen => {
        *pos += 1;
        let start = *pos;
        let mut depth = 0;
        while let Some(t) = tokens.get(*pos) {
          match t {
            Token::LParen => depth += 1,
            Token::RParen if depth == 0 => break,
            Token::RParen => depth -= 1,
            _ => {}
          }
          *pos += 1;
        }
        if *pos >= tokens.len() {
          return Err(parse_error(line, "unclosed left paren"));
        }
        let inner = parse_pipeline(&tokens[start..*pos], line, source)?;
        let fields = match tokens.get(*pos + 1) {
          Some(Token::Chain(fields)) => {
            *pos += 1;
            fields.clone()
          }
          _ => Vec::new(),
        };
        Operand::Sub {
          pipeline: Box::new(inner),
          fields,
        }
      }
      other => return Err(parse_error(line, format!("unexpected {:?} in operand", other))),
    };
    args.push(operand);
    *pos += 1;
  }

  if args.is_empty() {
    return Err(parse_error(line, "empty command"));
  }
  Ok(Command { args })
}

fn parse_number(text: &str, line: usize) -> ParseResult<Operand> {
  if let Ok(n) = text.parse::<i64>() {
    return Ok(Operand::Int(n));
  }
  if text.parse::<f64>().is_ok() {
    return Ok(Operand::Float(text.trim_start_matches('+').to_string()));
  }
  Err(parse_error(line, format!("bad number syntax: {:?}", text)))
}
