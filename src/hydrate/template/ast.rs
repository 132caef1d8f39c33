//! Template AST types
//!
//! A template is a list of nodes: literal text and `{{ }}` actions. Control
//! actions (`if`, `with`, `range`) own their bodies.

/// A node in the template AST
#[derive(Debug, Clone, PartialEq)]
pub enum TemplateNode {
  /// Literal text, output as-is
  Text(String),

  /// `{{ pipeline }}`: printed unless it declares a variable
  Action(Pipeline),

  /// `{{ if p }}...{{ else if q }}...{{ else }}...{{ end }}`
  If(Conditional),

  /// `{{ with p }}...{{ else }}...{{ end }}`: rebinds `.` when truthy
  With(Conditional),

  /// `{{ range $k, $v := p }}...{{ else }}...{{ end }}`
  Range(RangeLoop),
}

/// Branches tried in order; the first truthy pipeline wins
#[derive(Debug, Clone, PartialEq)]
pub struct Conditional {
  pub branches: Vec<(Pipeline, Vec<TemplateNode>)>,
  pub else_branch: Option<Vec<TemplateNode>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RangeLoop {
  /// `$k` in `$k, $v := ...`, or `$v` alone in `$v := ...`
  pub key_var: Option<String>,
  pub value_var: Option<String>,
  pub pipeline: Pipeline,
  pub body: Vec<TemplateNode>,
  pub else_branch: Option<Vec<TemplateNode>>,
}

/// Commands joined by `|`, optionally assigned to a variable
#[derive(Debug, Clone, PartialEq)]
pub struct Pipeline {
  pub declare: Option<Assignment>,
  pub commands: Vec<Command>,
  /// Source text of the action, for error messages
  pub source: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
  pub name: String,
  /// `:=` declares in the current scope, `=` assigns an existing variable
  pub declare: bool,
}

/// A function call (`f a b`) or a single operand
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
  pub args: Vec<Operand>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
  /// `.` (empty path) or `.A.B`
  Field(Vec<String>),
  /// `$` or `$x`, with optional trailing fields `$x.A`
  Variable { name: String, fields: Vec<String> },
  /// Function identifier
  Function(String),
  /// Parenthesised pipeline with optional trailing fields `(p).A`
  Sub { pipeline: Box<Pipeline>, fields: Vec<String> },
  Str(String),
  Int(i64),
  Float(String),
  Bool(bool),
  Nil,
}
