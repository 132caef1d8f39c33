//! Surgical YAML editing
//!
//! A `YamlFile` owns one document in two views over the same raw text:
//!
//! - a structural view (`Node` tree) built from `yaml-rust2` marked events, where
//!   every scalar remembers its byte span and quote style;
//! - a typed view (`Value`) decoded by `YamlLoader`.
//!
//! Edits go to the structural view first (`find_node_mut` + `Node::set_text`).
//! `update_yaml_from_tree` then splices only the modified scalars into the raw
//! text and re-decodes both views, so comments, key order, blank lines and
//! anchors elsewhere in the file stay byte-identical.
//!
//! ## Limitations
//!
//! Only the first document of a multi-document file is modelled. Block scalars
//! (`|`, `>`) and multi-line plain scalars cannot be edited in place. Flow
//! collections are replaced as a whole rather than edited.

use crate::catalog::value::{Value, double_quote, is_plain_safe, quote_scalar};
use crate::core::error::{RailError, RailResult, ResultExt, YamlError};
use std::fs;
use std::path::{Path, PathBuf};
use yaml_rust2::parser::{Event, MarkedEventReceiver, Parser};
use yaml_rust2::scanner::{Marker, TScalarStyle};

/// Quote style of a scalar in the source text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarStyle {
  Plain,
  SingleQuoted,
  DoubleQuoted,
  Block,
}

/// A scalar leaf with its location in the raw text
#[derive(Debug, Clone)]
pub struct ScalarNode {
  value: String,
  original: String,
  style: ScalarStyle,
  start: usize,
  end: Option<usize>,
  /// `key:` with nothing after it; `start` then points just past the colon
  implicit: bool,
}

impl ScalarNode {
  pub fn value(&self) -> &str {
    &self.value
  }

  pub fn style(&self) -> ScalarStyle {
    self.style
  }

  pub fn is_modified(&self) -> bool {
    self.value != self.original
  }

  /// Text that replaces the scalar's span, in its original style
  fn render(&self) -> String {
    let text = match self.style {
      ScalarStyle::Plain if is_plain_safe(&self.value) => self.value.clone(),
      ScalarStyle::SingleQuoted if !self.value.chars().any(char::is_control) => {
        format!("'{}'", self.value.replace('\'', "''"))
      }
      ScalarStyle::DoubleQuoted => double_quote(&self.value),
      _ => quote_scalar(&self.value),
    };
    if self.implicit { format!(" {}", text) } else { text }
  }
}

/// Structural view of a YAML document
#[derive(Debug, Clone)]
pub enum Node {
  Scalar(ScalarNode),
  Sequence { start: usize, items: Vec<Node> },
  Mapping { start: usize, entries: Vec<(Node, Node)> },
  Alias { start: usize },
}

impl Node {
  fn empty_mapping() -> Node {
    Node::Mapping {
      start: 0,
      entries: Vec::new(),
    }
  }

  pub fn start(&self) -> usize {
    match self {
      Node::Scalar(s) => s.start,
      Node::Sequence { start, .. } | Node::Mapping { start, .. } | Node::Alias { start } => *start,
    }
  }

  pub fn as_scalar(&self) -> Option<&ScalarNode> {
    match self {
      Node::Scalar(s) => Some(s),
      _ => None,
    }
  }

  /// Text of a scalar node
  pub fn text(&self) -> Option<&str> {
    self.as_scalar().map(ScalarNode::value)
  }

  /// Assign the textual value of a scalar leaf
  pub fn set_text(&mut self, text: impl Into<String>) -> RailResult<()> {
    match self {
      Node::Scalar(s) => {
        s.value = text.into();
        Ok(())
      }
      other => Err(RailError::Yaml(YamlError::NotEditable {
        path: format!("node at byte {}", other.start()),
        reason: "not a scalar".to_string(),
      })),
    }
  }

  fn entry(&self, key: &str) -> Option<&(Node, Node)> {
    match self {
      Node::Mapping { entries, .. } => entries.iter().find(|(k, _)| k.text() == Some(key)),
      _ => None,
    }
  }

  fn entry_mut(&mut self, key: &str) -> Option<&mut (Node, Node)> {
    match self {
      Node::Mapping { entries, .. } => entries.iter_mut().find(|(k, _)| k.text() == Some(key)),
      _ => None,
    }
  }
}

/// Locate the node at a dotted path by successive mapping-key lookups
pub fn find_node<'a>(tree: &'a Node, path: &str) -> RailResult<&'a Node> {
  let mut current = tree;
  for segment in path.split('.') {
    current = &current
      .entry(segment)
      .ok_or_else(|| property_not_found(path, segment))?
      .1;
  }
  Ok(current)
}

/// Mutable variant of [`find_node`]
pub fn find_node_mut<'a>(tree: &'a mut Node, path: &str) -> RailResult<&'a mut Node> {
  let mut current = tree;
  for segment in path.split('.') {
    current = &mut current
      .entry_mut(segment)
      .ok_or_else(|| property_not_found(path, segment))?
      .1;
  }
  Ok(current)
}

fn property_not_found(path: &str, segment: &str) -> RailError {
  RailError::Yaml(YamlError::PropertyNotFound {
    path: path.to_string(),
    segment: segment.to_string(),
  })
}

/// A value lifted out of one document for insertion into another
#[derive(Debug, Clone)]
pub struct Subtree {
  value: Value,
  /// Source lines of a block collection, dedented
  block: Option<String>,
}

impl Subtree {
  pub fn from_value(value: Value) -> Self {
    Self { value, block: None }
  }

  pub fn value(&self) -> &Value {
    &self.value
  }

  fn rendered(&self) -> RailResult<Rendered> {
    if let Some(block) = &self.block {
      return Ok(Rendered::Block(block.clone()));
    }
    Ok(match &self.value {
      Value::Mapping(m) if !m.is_empty() => Rendered::Block(self.value.to_yaml_string()?.trim_end().to_string()),
      Value::Sequence(s) if !s.is_empty() => Rendered::Block(self.value.to_yaml_string()?.trim_end().to_string()),
      Value::Mapping(_) => Rendered::Inline("{}".to_string()),
      Value::Sequence(_) => Rendered::Inline("[]".to_string()),
      Value::String(s) => Rendered::Inline(quote_scalar(s)),
      Value::Number(n) => Rendered::Inline(n.to_string()),
      Value::Bool(b) => Rendered::Inline(b.to_string()),
      Value::Null => Rendered::Inline("null".to_string()),
    })
  }
}

/// Text of a subtree: block lines go under the key, inline text follows the colon
enum Rendered {
  Block(String),
  Inline(String),
}

/// One YAML document on disk with structural and typed views
#[derive(Debug, Clone)]
pub struct YamlFile {
  path: PathBuf,
  raw: String,
  tree: Node,
  value: Value,
  permissions: Option<fs::Permissions>,
}

impl YamlFile {
  /// Read and parse a file, remembering its permission bits
  pub fn load(path: &Path) -> RailResult<Self> {
    let raw = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let permissions = fs::metadata(path).ok().map(|m| m.permissions());
    let mut file = Self::parse(path, raw)?;
    file.permissions = permissions;
    Ok(file)
  }

  pub fn parse(path: impl Into<PathBuf>, raw: impl Into<String>) -> RailResult<Self> {
    let path = path.into();
    let raw = raw.into();
    let parse_error = |message: String| {
      RailError::Yaml(YamlError::Parse {
        path: path.clone(),
        message,
      })
    };
    let tree = parse_tree(&raw).map_err(parse_error)?;
    let value = Value::parse_yaml(&raw).map_err(parse_error)?;
    Ok(Self {
      path,
      raw,
      tree,
      value,
      permissions: None,
    })
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  pub fn raw(&self) -> &str {
    &self.raw
  }

  pub fn tree(&self) -> &Node {
    &self.tree
  }

  pub fn tree_mut(&mut self) -> &mut Node {
    &mut self.tree
  }

  /// Typed view; only reflects structural edits after `update_yaml_from_tree`
  pub fn value(&self) -> &Value {
    &self.value
  }

  /// Same content destined for another path
  pub fn relocated(&self, path: impl Into<PathBuf>) -> Self {
    Self {
      path: path.into(),
      ..self.clone()
    }
  }

  /// Splice modified scalars into the raw text and resync both views
  pub fn update_yaml_from_tree(&mut self) -> RailResult<()> {
    let mut modified = Vec::new();
    collect_modified(&self.tree, "", &mut modified);
    if modified.is_empty() {
      return Ok(());
    }

    modified.sort_by_key(|(_, scalar)| std::cmp::Reverse(scalar.start));
    let mut raw = self.raw.clone();
    for (path, scalar) in modified {
      let end = match (scalar.implicit, scalar.end) {
        (true, _) => scalar.start,
        (false, Some(end)) => end,
        (false, None) => {
          return Err(RailError::Yaml(YamlError::NotEditable {
            path,
            reason: "block and multi-line scalars cannot be edited in place".to_string(),
          }));
        }
      };
      raw.replace_range(scalar.start..end, &scalar.render());
    }

    self.resync(raw)
  }

  /// Set one scalar leaf and commit the change
  pub fn set_scalar(&mut self, path: &str, text: &str) -> RailResult<()> {
    find_node_mut(&mut self.tree, path)?.set_text(text)?;
    self.update_yaml_from_tree()
  }

  /// Lift the value at `path` out of this document, keeping block formatting
  pub fn subtree(&self, path: &str) -> RailResult<Subtree> {
    let segments: Vec<&str> = path.split('.').collect();
    let (parent_path, key) = split_last(path);
    let parent = match parent_path {
      Some(p) => find_node(&self.tree, p)?,
      None => &self.tree,
    };
    let (key_node, value_node) = parent.entry(key).ok_or_else(|| property_not_found(path, key))?;
    let layout = EntryLayout::compute(&self.raw, key_node, value_node, path)?;

    let block = match (layout.block_start, layout.child_indent) {
      (Some(block_start), Some(indent)) if block_start < layout.value_end => {
        Some(dedent(&self.raw[block_start + 1..layout.value_end], indent))
      }
      _ => None,
    };

    Ok(Subtree {
      value: self.value.get_path(&segments).cloned().unwrap_or_default(),
      block,
    })
  }

  /// Replace (or insert) the value at `path` and commit the change.
  ///
  /// Everything outside the replaced value is kept byte-identical. Missing
  /// parents are created under the deepest existing mapping.
  pub fn set_subtree(&mut self, path: &str, subtree: &Subtree) -> RailResult<()> {
    let (parent_path, key) = split_last(path);
    if let Some(p) = parent_path
      && find_node(&self.tree, p).is_err()
    {
      let (grand_path, parent_key) = split_last(p);
      let mut nested = crate::catalog::value::Mapping::new();
      nested.insert(key.to_string(), subtree.value.clone());
      let target = match grand_path {
        Some(g) => format!("{}.{}", g, parent_key),
        None => parent_key.to_string(),
      };
      return self.set_subtree(&target, &Subtree::from_value(Value::Mapping(nested)));
    }

    let parent = match parent_path {
      Some(p) => find_node(&self.tree, p)?,
      None => &self.tree,
    };

    let raw = match parent.entry(key) {
      Some((key_node, value_node)) => {
        let layout = EntryLayout::compute(&self.raw, key_node, value_node, path)?;
        let (region, text) = layout.replacement(subtree)?;
        let mut raw = self.raw.clone();
        raw.replace_range(region, &text);
        raw
      }
      None => insert_entry(&self.raw, parent, key, subtree, path)?,
    };

    self.resync(raw)
  }

  /// Persist the raw text, restoring the original permission bits
  pub fn write_yaml(&self) -> RailResult<()> {
    if let Some(parent) = self.path.parent() {
      fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    }
    fs::write(&self.path, &self.raw).with_context(|| format!("writing {}", self.path.display()))?;
    if let Some(permissions) = &self.permissions {
      fs::set_permissions(&self.path, permissions.clone())
        .with_context(|| format!("setting permissions on {}", self.path.display()))?;
    }
    tracing::info!(path = %self.path.display(), "wrote release file");
    Ok(())
  }

  fn resync(&mut self, raw: String) -> RailResult<()> {
    let permissions = self.permissions.take();
    *self = Self::parse(self.path.clone(), raw)?;
    self.permissions = permissions;
    Ok(())
  }
}

fn split_last(path: &str) -> (Option<&str>, &str) {
  match path.rsplit_once('.') {
    Some((parent, key)) => (Some(parent), key),
    None => (None, path),
  }
}

fn collect_modified<'a>(node: &'a Node, prefix: &str, out: &mut Vec<(String, &'a ScalarNode)>) {
  match node {
    Node::Scalar(s) if s.is_modified() => out.push((prefix.to_string(), s)),
    Node::Scalar(_) | Node::Alias { .. } => {}
    Node::Sequence { items, .. } => {
      for (i, item) in items.iter().enumerate() {
        collect_modified(item, &join_path(prefix, &i.to_string()), out);
      }
    }
    Node::Mapping { entries, .. } => {
      for (key, value) in entries {
        let key_text = key.text().unwrap_or("?");
        let path = join_path(prefix, key_text);
        collect_modified(key, &path, out);
        collect_modified(value, &path, out);
      }
    }
  }
}

fn join_path(prefix: &str, segment: &str) -> String {
  if prefix.is_empty() {
    segment.to_string()
  } else {
    format!("{}.{}", prefix, segment)
  }
}

// ---------------------------------------------------------------------------
// Text layout of one `key: value` entry
// ---------------------------------------------------------------------------

struct EntryLayout {
  key_indent: usize,
  colon_end: usize,
  /// Newline ending the key line when the value is a block collection
  block_start: Option<usize>,
  value_end: usize,
  child_indent: Option<usize>,
}

impl EntryLayout {
  fn compute(raw: &str, key: &Node, value: &Node, path: &str) -> RailResult<Self> {
    let not_editable = |reason: &str| {
      RailError::Yaml(YamlError::NotEditable {
        path: path.to_string(),
        reason: reason.to_string(),
      })
    };
    let key_scalar = key.as_scalar().ok_or_else(|| not_editable("complex mapping key"))?;
    let key_end = key_scalar.end.unwrap_or(key_scalar.start);
    let colon_end = raw[key_end..]
      .find(':')
      .map(|i| key_end + i + 1)
      .ok_or_else(|| not_editable("mapping key without ':'"))?;
    let key_indent = key_scalar.start - line_start(raw, key_scalar.start);
    let key_line_end = line_end(raw, colon_end);

    let layout = match value {
      Node::Scalar(s) if s.implicit => Self::inline(key_indent, colon_end, colon_end),
      Node::Scalar(ScalarNode { end: Some(end), .. }) => Self::inline(key_indent, colon_end, *end),
      Node::Scalar(_) => {
        // block scalar: header on the key line, body below
        let end = block_end(raw, key_line_end, key_indent, false);
        Self::inline(key_indent, colon_end, end)
      }
      Node::Alias { start } => {
        let len = raw[*start..]
          .find(|c: char| c.is_whitespace() || c == ',')
          .unwrap_or(raw.len() - start);
        Self::inline(key_indent, colon_end, start + len)
      }
      Node::Mapping { start, .. } | Node::Sequence { start, .. } if is_flow(raw, *start) => {
        let end = flow_end(raw, *start).ok_or_else(|| not_editable("unterminated flow collection"))?;
        Self::inline(key_indent, colon_end, end)
      }
      Node::Mapping { start, .. } | Node::Sequence { start, .. } => {
        let allow_dash = matches!(value, Node::Sequence { .. });
        let end = block_end(raw, key_line_end, key_indent, allow_dash);
        let first_child = match value {
          Node::Mapping { entries, .. } => entries.first().map(|(k, _)| k.start()),
          Node::Sequence { items, .. } => items.first().map(Node::start),
          _ => None,
        };
        Self {
          key_indent,
          colon_end,
          block_start: Some(key_line_end),
          value_end: end,
          child_indent: Some(line_indent(raw, first_child.unwrap_or(*start))),
        }
      }
    };
    Ok(layout)
  }

  fn inline(key_indent: usize, colon_end: usize, value_end: usize) -> Self {
    Self {
      key_indent,
      colon_end,
      block_start: None,
      value_end,
      child_indent: None,
    }
  }

  /// Byte range to replace and the text to put there
  fn replacement(&self, subtree: &Subtree) -> RailResult<(std::ops::Range<usize>, String)> {
    Ok(match subtree.rendered()? {
      Rendered::Block(block) => {
        let mut indent = self.child_indent.unwrap_or(self.key_indent + 2);
        if matches!(subtree.value, Value::Mapping(_)) && indent <= self.key_indent {
          indent = self.key_indent + 2;
        }
        let start = self.block_start.unwrap_or(self.colon_end);
        (start..self.value_end, format!("\n{}", indent_block(&block, indent)))
      }
      Rendered::Inline(text) => (self.colon_end..self.value_end, format!(" {}", text)),
    })
  }
}

fn insert_entry(raw: &str, parent: &Node, key: &str, subtree: &Subtree, path: &str) -> RailResult<String> {
  let not_editable = |reason: &str| {
    RailError::Yaml(YamlError::NotEditable {
      path: path.to_string(),
      reason: reason.to_string(),
    })
  };
  let entries = match parent {
    Node::Mapping { start, .. } if is_flow(raw, *start) => return Err(not_editable("parent is a flow mapping")),
    Node::Mapping { entries, .. } => entries,
    _ => return Err(not_editable("parent is not a mapping")),
  };

  let (insert_at, indent, prefix) = match (entries.first(), entries.last()) {
    (Some((first_key, _)), Some((last_key, last_value))) => {
      let indent = first_key.start() - line_start(raw, first_key.start());
      let layout = EntryLayout::compute(raw, last_key, last_value, path)?;
      (line_end(raw, layout.value_end), indent, "\n")
    }
    _ => {
      if !raw.trim().is_empty() && parent.start() != 0 {
        return Err(not_editable("parent mapping is empty"));
      }
      let prefix = if raw.is_empty() || raw.ends_with('\n') { "" } else { "\n" };
      (raw.len(), 0, prefix)
    }
  };

  let rendered = match subtree.rendered()? {
    Rendered::Block(block) => format!("\n{}", indent_block(&block, indent + 2)),
    Rendered::Inline(text) => format!(" {}", text),
  };
  let mut text = format!("{}{}{}:{}", prefix, " ".repeat(indent), quote_scalar(key), rendered);
  if insert_at == raw.len() && prefix.is_empty() {
    text.push('\n');
  }

  let mut out = raw.to_string();
  out.insert_str(insert_at, &text);
  Ok(out)
}

fn line_start(raw: &str, pos: usize) -> usize {
  raw[..pos].rfind('\n').map(|i| i + 1).unwrap_or(0)
}

/// Leading spaces of the line holding `pos`; for a sequence item that is the dash column
fn line_indent(raw: &str, pos: usize) -> usize {
  let start = line_start(raw, pos);
  raw[start..].bytes().take_while(|b| *b == b' ').count()
}

fn line_end(raw: &str, pos: usize) -> usize {
  raw[pos..].find('\n').map(|i| pos + i).unwrap_or(raw.len())
}

fn is_flow(raw: &str, start: usize) -> bool {
  matches!(raw.as_bytes().get(start), Some(b'{') | Some(b'['))
}

/// End of the last content line belonging to a block that starts after `from`
/// (a newline). Trailing blank and comment lines are left outside the block.
fn block_end(raw: &str, from: usize, key_indent: usize, allow_dash: bool) -> usize {
  let mut end = from;
  let mut pos = from;
  while pos < raw.len() {
    let start = pos + 1;
    let stop = line_end(raw, start);
    let line = &raw[start..stop];
    let trimmed = line.trim_start();
    if !(trimmed.is_empty() || trimmed.starts_with('#')) {
      let indent = line.len() - trimmed.len();
      let dash_item = allow_dash && indent == key_indent && (trimmed.starts_with("- ") || trimmed == "-");
      if indent <= key_indent && !dash_item {
        break;
      }
      end = stop;
    }
    pos = stop;
  }
  end
}

/// Byte just past the bracket closing the flow collection at `start`
fn flow_end(raw: &str, start: usize) -> Option<usize> {
  let bytes = raw.as_bytes();
  let mut depth = 0usize;
  let mut quote: Option<u8> = None;
  let mut i = start;
  while i < bytes.len() {
    let b = bytes[i];
    match quote {
      Some(b'"') if b == b'\\' => i += 1,
      Some(b'\'') if b == b'\'' && bytes.get(i + 1) == Some(&b'\'') => i += 1,
      Some(q) if b == q => quote = None,
      Some(_) => {}
      None => match b {
        b'"' | b'\'' => quote = Some(b),
        b'[' | b'{' => depth += 1,
        b']' | b'}' => {
          depth = depth.saturating_sub(1);
          if depth == 0 {
            return Some(i + 1);
          }
        }
        _ => {}
      },
    }
    i += 1;
  }
  None
}

fn dedent(block: &str, indent: usize) -> String {
  block
    .lines()
    .map(|line| {
      let spaces = line.len() - line.trim_start_matches(' ').len();
      &line[spaces.min(indent)..]
    })
    .collect::<Vec<_>>()
    .join("\n")
}

fn indent_block(block: &str, indent: usize) -> String {
  let pad = " ".repeat(indent);
  block
    .lines()
    .map(|line| if line.trim().is_empty() { String::new() } else { format!("{}{}", pad, line) })
    .collect::<Vec<_>>()
    .join("\n")
}

// ---------------------------------------------------------------------------
// Structural tree from marked parser events
// ---------------------------------------------------------------------------

fn parse_tree(source: &str) -> Result<Node, String> {
  let mut builder = TreeBuilder::new(source);
  let mut parser = Parser::new_from_str(source);
  parser.load(&mut builder, false).map_err(|e| e.to_string())?;
  Ok(builder.root.unwrap_or_else(Node::empty_mapping))
}

enum Frame {
  Sequence { start: usize, items: Vec<Node> },
  Mapping { start: usize, entries: Vec<(Node, Node)>, key: Option<Node> },
}

struct TreeBuilder<'a> {
  source: &'a str,
  /// Byte offset of each char index (markers count chars)
  offsets: Vec<usize>,
  stack: Vec<Frame>,
  root: Option<Node>,
}

impl<'a> TreeBuilder<'a> {
  fn new(source: &'a str) -> Self {
    let offsets = source
      .char_indices()
      .map(|(i, _)| i)
      .chain(std::iter::once(source.len()))
      .collect();
    Self {
      source,
      offsets,
      stack: Vec::new(),
      root: None,
    }
  }

  fn byte_offset(&self, marker: &Marker) -> usize {
    self
      .offsets
      .get(marker.index())
      .copied()
      .unwrap_or(self.source.len())
  }

  fn scalar(&self, value: String, style: TScalarStyle, start: usize) -> ScalarNode {
    let style = match style {
      TScalarStyle::SingleQuoted => ScalarStyle::SingleQuoted,
      TScalarStyle::DoubleQuoted => ScalarStyle::DoubleQuoted,
      TScalarStyle::Literal | TScalarStyle::Folded => ScalarStyle::Block,
      _ => ScalarStyle::Plain,
    };
    let end = scalar_end(self.source, start, &value, style);

    // an empty value is reported as an empty (or "~") plain scalar positioned at the next token
    let implicit = style == ScalarStyle::Plain && (value.is_empty() || (value == "~" && end.is_none()));
    if implicit && let Some(Frame::Mapping { key: Some(key), .. }) = self.stack.last() {
      let key_end = key.as_scalar().and_then(|k| k.end).unwrap_or(key.start());
      let colon_end = self.source[key_end..].find(':').map(|i| key_end + i + 1).unwrap_or(key_end);
      return ScalarNode {
        value: String::new(),
        original: String::new(),
        style,
        start: colon_end,
        end: Some(colon_end),
        implicit: true,
      };
    }

    ScalarNode {
      original: value.clone(),
      value,
      style,
      start,
      end,
      implicit: false,
    }
  }

  fn push(&mut self, node: Node) {
    match self.stack.last_mut() {
      Some(Frame::Sequence { items, .. }) => items.push(node),
      Some(Frame::Mapping { entries, key, .. }) => match key.take() {
        Some(k) => entries.push((k, node)),
        None => *key = Some(node),
      },
      None => {
        if self.root.is_none() {
          self.root = Some(node);
        }
      }
    }
  }
}

impl MarkedEventReceiver for TreeBuilder<'_> {
  fn on_event(&mut self, ev: Event, marker: Marker) {
    let at = self.byte_offset(&marker);
    match ev {
      Event::Scalar(value, style, _anchor_id, _tag) => {
        let node = Node::Scalar(self.scalar(value, style, at));
        self.push(node);
      }
      Event::SequenceStart(_anchor_id, _tag) => self.stack.push(Frame::Sequence {
        start: at,
        items: Vec::new(),
      }),
      Event::MappingStart(_anchor_id, _tag) => self.stack.push(Frame::Mapping {
        start: at,
        entries: Vec::new(),
        key: None,
      }),
      Event::SequenceEnd | Event::MappingEnd => {
        let node = match self.stack.pop() {
          Some(Frame::Sequence { start, items }) => Node::Sequence { start, items },
          Some(Frame::Mapping { start, entries, .. }) => Node::Mapping { start, entries },
          None => return,
        };
        self.push(node);
      }
      Event::Alias(_anchor_id) => self.push(Node::Alias { start: at }),
      _ => {}
    }
  }
}

/// Byte just past a scalar's source text, when it can be located exactly
fn scalar_end(source: &str, start: usize, value: &str, style: ScalarStyle) -> Option<usize> {
  let rest = source.get(start..)?;
  let bytes = rest.as_bytes();
  match style {
    ScalarStyle::Plain => rest.starts_with(value).then(|| start + value.len()),
    ScalarStyle::SingleQuoted => {
      if bytes.first() != Some(&b'\'') {
        return None;
      }
      let mut i = 1;
      while i < bytes.len() {
        if bytes[i] == b'\'' {
          if bytes.get(i + 1) == Some(&b'\'') {
            i += 2;
            continue;
          }
          return Some(start + i + 1);
        }
        i += 1;
      }
      None
    }
    ScalarStyle::DoubleQuoted => {
      if bytes.first() != Some(&b'"') {
        return None;
      }
      let mut i = 1;
      while i < bytes.len() {
        match bytes[i] {
          b'\\' => i += 2,
          b'"' => return Some(start + i + 1),
          _ => i += 1,
        }
      }
      None
    }
    ScalarStyle::Block => None,
  }
}
