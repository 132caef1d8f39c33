//! Text template engine with `{{ }}` actions
//!
//! Supports:
//!
//! - Fields and variables: `{{ .Release.Name }}`, `{{ $ }}`, `{{ $x := .a }}`
//! - Pipelines: `{{ .x | default "a" | quote }}`, parenthesised sub-pipelines
//! - Control: `if`/`else if`/`else`, `with`, `range $k, $v := ...`, all closed by `end`
//! - Comments `{{/* ... */}}` and trim markers `{{-` / `-}}`
//!
//! Output is plain text; nothing is HTML-escaped.

pub mod ast;
pub mod eval;
pub mod funcs;
pub mod parser;

use crate::catalog::value::Value;
use crate::core::error::TemplateError;
use ast::TemplateNode;

/// A parsed template ready for rendering
#[derive(Debug, Clone)]
pub struct Template {
  nodes: Vec<TemplateNode>,
}

impl Template {
  pub fn parse(source: &str) -> Result<Self, TemplateError> {
    Ok(Self {
      nodes: parser::parse(source)?,
    })
  }

  /// Render with `data` as both `.` and `$`
  pub fn render(&self, data: &Value) -> Result<String, TemplateError> {
    eval::Exec::new(data).run(&self.nodes, data)
  }
}
