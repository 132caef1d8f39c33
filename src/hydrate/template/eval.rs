//! Template evaluation
//!
//! Walks the AST against a data value. `.` is the current dot, `$` the root.
//! Variables declared inside a control body go out of scope at its `{{ end }}`.

use super::ast::{Command, Conditional, Operand, Pipeline, RangeLoop, TemplateNode};
use super::funcs::{self, to_text};
use crate::catalog::value::{Number, Value};
use crate::core::error::TemplateError;

type ExecResult<T> = Result<T, TemplateError>;

pub struct Exec {
  vars: Vec<(String, Value)>,
  out: String,
}

impl Exec {
  pub fn new(root: &Value) -> Self {
    Self {
      vars: vec![("$".to_string(), root.clone())],
      out: String::new(),
    }
  }

  pub fn run(mut self, nodes: &[TemplateNode], dot: &Value) -> ExecResult<String> {
    self.walk(nodes, dot)?;
    Ok(self.out)
  }

  fn walk(&mut self, nodes: &[TemplateNode], dot: &Value) -> ExecResult<()> {
    for node in nodes {
      match node {
        TemplateNode::Text(text) => self.out.push_str(text),
        TemplateNode::Action(pipeline) => {
          let value = self.pipeline(pipeline, dot)?;
          if pipeline.declare.is_none() {
            self.out.push_str(&to_text(&value));
          }
        }
        TemplateNode::If(cond) => self.conditional(cond, dot, false)?,
        TemplateNode::With(cond) => self.conditional(cond, dot, true)?,
        TemplateNode::Range(range) => self.range(range, dot)?,
      }
    }
    Ok(())
  }

  fn scoped(&mut self, nodes: &[TemplateNode], dot: &Value) -> ExecResult<()> {
    let mark = self.vars.len();
    let result = self.walk(nodes, dot);
    self.vars.truncate(mark);
    result
  }

  fn conditional(&mut self, cond: &Conditional, dot: &Value, rebind: bool) -> ExecResult<()> {
    let mark = self.vars.len();
    for (pipeline, body) in &cond.branches {
      let value = self.pipeline(pipeline, dot)?;
      if value.is_truthy() {
        let result = self.scoped(body, if rebind { &value } else { dot });
        self.vars.truncate(mark);
        return result;
      }
    }
    self.vars.truncate(mark);
    match &cond.else_branch {
      Some(body) => self.scoped(body, dot),
      None => Ok(()),
    }
  }

  fn range(&mut self, range: &RangeLoop, dot: &Value) -> ExecResult<()> {
    let mark = self.vars.len();
    let value = self.pipeline(&range.pipeline, dot)?;
    let items: Vec<(Value, Value)> = match &value {
      Value::Sequence(items) => items
        .iter()
        .enumerate()
        .map(|(i, v)| (Value::Number(Number::Integer(i as i64)), v.clone()))
        .collect(),
      Value::Mapping(map) => map.iter().map(|(k, v)| (Value::String(k.clone()), v.clone())).collect(),
      Value::Number(Number::Integer(n)) => (0..*n)
        .map(|i| (Value::Number(Number::Integer(i)), Value::Number(Number::Integer(i))))
        .collect(),
      Value::Null => Vec::new(),
      other => {
        return Err(exec_error(
          &range.pipeline,
          format!("range can't iterate over {}", other.type_name()),
        ));
      }
    };

    if items.is_empty() {
      self.vars.truncate(mark);
      return match &range.else_branch {
        Some(body) => self.scoped(body, dot),
        None => Ok(()),
      };
    }

    for (key, item) in items {
      let iteration = self.vars.len();
      match (&range.key_var, &range.value_var) {
        (Some(k), Some(v)) => {
          self.vars.push((k.clone(), key));
          self.vars.push((v.clone(), item.clone()));
        }
        (None, Some(v)) => self.vars.push((v.clone(), item.clone())),
        _ => {}
      }
      let result = self.walk(&range.body, &item);
      self.vars.truncate(iteration);
      result?;
    }
    self.vars.truncate(mark);
    Ok(())
  }

  fn pipeline(&mut self, pipeline: &Pipeline, dot: &Value) -> ExecResult<Value> {
    let mut piped: Option<Value> = None;
    for command in &pipeline.commands {
      piped = Some(self.command(command, dot, piped, pipeline)?);
    }
    let value = piped.unwrap_or_default();

    if let Some(assign) = &pipeline.declare {
      if assign.declare {
        self.vars.push((assign.name.clone(), value.clone()));
      } else {
        let slot = self
          .vars
          .iter_mut()
          .rev()
          .find(|(name, _)| name == &assign.name)
          .ok_or_else(|| exec_error(pipeline, format!("undefined variable: {}", assign.name)))?;
        slot.1 = value.clone();
      }
    }
    Ok(value)
  }

  fn command(&mut self, command: &Command, dot: &Value, piped: Option<Value>, ctx: &Pipeline) -> ExecResult<Value> {
    let (first, rest) = command
      .args
      .split_first()
      .ok_or_else(|| exec_error(ctx, "empty command"))?;

    if let Operand::Function(name) = first {
      let mut args = Vec::with_capacity(rest.len() + 1);
      for operand in rest {
        args.push(self.operand(operand, dot, ctx)?);
      }
      args.extend(piped);
      return funcs::call(name, args).map_err(|message| exec_error(ctx, format!("error calling {}: {}", name, message)));
    }

    if !rest.is_empty() || piped.is_some() {
      return Err(exec_error(ctx, "can't give argument to non-function"));
    }
    self.operand(first, dot, ctx)
  }

  fn operand(&mut self, operand: &Operand, dot: &Value, ctx: &Pipeline) -> ExecResult<Value> {
    match operand {
      Operand::Field(fields) => walk_fields(dot.clone(), fields, ".", ctx),
      Operand::Variable { name, fields } => {
        let value = self
          .vars
          .iter()
          .rev()
          .find(|(n, _)| n == name)
          .map(|(_, v)| v.clone())
          .ok_or_else(|| exec_error(ctx, format!("undefined variable: {}", name)))?;
        walk_fields(value, fields, name, ctx)
      }
      Operand::Function(name) => {
        funcs::call(name, Vec::new()).map_err(|message| exec_error(ctx, format!("error calling {}: {}", name, message)))
      }
      Operand::Sub { pipeline, fields } => {
        let value = self.pipeline(pipeline, dot)?;
        walk_fields(value, fields, "(...)", ctx)
      }
      Operand::Str(s) => Ok(Value::String(s.clone())),
      Operand::Int(n) => Ok(Value::Number(Number::Integer(*n))),
      Operand::Float(text) => Ok(Value::Number(Number::Real(text.clone()))),
      Operand::Bool(b) => Ok(Value::Bool(*b)),
      Operand::Nil => Ok(Value::Null),
    }
  }
}

/// Missing keys yield null; stepping into anything but a mapping is an error
fn walk_fields(mut value: Value, fields: &[String], base: &str, ctx: &Pipeline) -> ExecResult<Value> {
  let mut path = base.trim_end_matches('.').to_string();
  for field in fields {
    path = format!("{}.{}", path, field);
    value = match value {
      Value::Mapping(mut map) => map.remove(field).unwrap_or_default(),
      Value::Null => return Err(exec_error(ctx, format!("nil pointer evaluating {}", path))),
      other => {
        return Err(exec_error(
          ctx,
          format!("can't evaluate field {} in type {}", field, other.type_name()),
        ));
      }
    };
  }
  Ok(value)
}

fn exec_error(pipeline: &Pipeline, message: impl Into<String>) -> TemplateError {
  TemplateError::Execute {
    expression: pipeline.source.clone(),
    message: message.into(),
  }
}
