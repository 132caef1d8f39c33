//! Value hydration: release values → renderer-ready values
//!
//! Three stages, each on a fresh copy of the release's `spec.values`:
//!
//! 1. **dsl**: resolve `$ref()` / `$spread()` against the environment's values
//! 2. **mapping**: apply configured default values (never overwriting)
//! 3. **template**: render the tree as a template with `.Release` and `.Environment`

pub mod dsl;
pub mod mapping;
pub mod template;

pub use mapping::ValueMapping;
pub use template::Template;

use crate::catalog::value::{Mapping, Number, Value};
use crate::catalog::{Environment, Release};
use crate::core::error::{RailError, RailResult, ResultExt, YamlError};

/// Final values for one release
pub fn hydrate_values(release: &Release, mapping: Option<&ValueMapping>) -> RailResult<Value> {
  let env = &release.environment;
  tracing::debug!(release = %release.name, environment = %env.name, "hydrating values");

  let resolved = dsl::resolve_values(&release.values, &env.values).context("hydrating object values")?;
  let mut values = match resolved {
    Value::Mapping(map) => map,
    Value::Null => Mapping::new(),
    other => {
      return Err(RailError::message(format!(
        "release {} spec.values must be a mapping, got {}",
        release.name,
        other.type_name()
      )));
    }
  };

  if let Some(mapping) = mapping
    && mapping.applies_to(&release.name)
  {
    mapping.apply(&mut values);
  }

  let source = Value::Mapping(values).to_yaml_string()?;
  let rendered = Template::parse(&source)
    .and_then(|template| template.render(&template_context(release, env)))
    .context("rendering values template")?;

  match Value::parse_yaml(&rendered) {
    Ok(Value::Mapping(map)) => Ok(Value::Mapping(map)),
    Ok(Value::Null) => Ok(Value::mapping()),
    Ok(other) => Err(RailError::message(format!(
      "rendered values must be a mapping, got {}",
      other.type_name()
    ))),
    Err(message) => Err(RailError::Yaml(YamlError::Parse {
      path: release.file.path().to_path_buf(),
      message: format!("rendered values: {}", message),
    })),
  }
}

/// `{ Release: {...}, Environment: {...} }` as seen by value templates
pub fn template_context(release: &Release, env: &Environment) -> Value {
  let release_spec = object([
    ("Project", Value::from(release.project.clone())),
    ("Version", release.version.clone().map(Value::from).unwrap_or_default()),
    ("Values", release.values.clone()),
    ("Chart", release.chart.as_ref().map(|c| c.to_value()).unwrap_or_default()),
  ]);
  let promotion = object([
    (
      "FromEnvironments",
      Value::Sequence(env.promotion.from_environments.iter().cloned().map(Value::from).collect()),
    ),
    ("AllowAutoMerge", Value::Bool(env.promotion.allow_auto_merge)),
  ]);
  let env_spec = object([
    ("Order", Value::Number(Number::Integer(env.order))),
    ("Values", env.values.clone()),
    ("Promotion", promotion),
  ]);

  object([
    (
      "Release",
      object([("Name", Value::from(release.name.clone())), ("Spec", release_spec)]),
    ),
    (
      "Environment",
      object([("Name", Value::from(env.name.clone())), ("Spec", env_spec)]),
    ),
  ])
}

fn object<const N: usize>(entries: [(&str, Value); N]) -> Value {
  Value::Mapping(entries.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
}
