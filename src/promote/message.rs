//! Branch names, commit messages and pull-request text for a promotion

use crate::catalog::{Mapping, Value};
use crate::cross::CrossReleaseList;
use crate::core::error::{RailResult, ResultExt};
use crate::hydrate::Template;
use sha2::{Digest, Sha256};

const BRANCH_HASH_LEN: usize = 8;

/// One release as reported in commit and pull-request templates
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromotedRelease {
  pub name: String,
  pub project: String,
  pub source_version: Option<String>,
  pub target_version: Option<String>,
}

/// The promotable rows of a (source, target) list
pub fn promoted_releases(list: &CrossReleaseList) -> Vec<PromotedRelease> {
  list
    .promotable()
    .filter_map(|item| {
      let source = item.releases.first().and_then(Option::as_ref)?;
      let target = item.releases.get(1).and_then(Option::as_ref);
      Some(PromotedRelease {
        name: item.name.clone(),
        project: source.project.clone(),
        source_version: source.version.clone(),
        target_version: target.and_then(|t| t.version.clone()),
      })
    })
    .collect()
}

fn optional(text: &Option<String>) -> Value {
  text.clone().map(Value::from).unwrap_or_default()
}

/// `{Source, Target, Releases, ReleaseNames}` for commit and pull-request templates
pub fn template_data(source: &str, target: &str, releases: &[PromotedRelease]) -> Value {
  let items = releases
    .iter()
    .map(|release| {
      let mut map = Mapping::new();
      map.insert("Name".into(), Value::from(release.name.clone()));
      map.insert("Project".into(), Value::from(release.project.clone()));
      map.insert("SourceVersion".into(), optional(&release.source_version));
      map.insert("TargetVersion".into(), optional(&release.target_version));
      Value::Mapping(map)
    })
    .collect();

  let mut data = Mapping::new();
  data.insert("Source".into(), Value::from(source));
  data.insert("Target".into(), Value::from(target));
  data.insert("Releases".into(), Value::Sequence(items));
  data.insert(
    "ReleaseNames".into(),
    Value::Sequence(releases.iter().map(|r| Value::from(r.name.clone())).collect()),
  );
  Value::Mapping(data)
}

pub fn render(template: &str, data: &Value, what: &str) -> RailResult<String> {
  let text = Template::parse(template)
    .and_then(|t| t.render(data))
    .with_context(|| format!("rendering {} template", what))?;
  Ok(text.trim().to_string())
}

/// `<prefix>/<source>-to-<target>-<hash>` where the hash covers every promoted file
pub fn branch_name(prefix: &str, source: &str, target: &str, list: &CrossReleaseList) -> String {
  let mut hasher = Sha256::new();
  for item in list.promotable() {
    hasher.update(item.name.as_bytes());
    hasher.update([0]);
    if let Some(promoted) = &item.promoted {
      hasher.update(promoted.file.raw().as_bytes());
    }
    hasher.update([0]);
  }
  let digest = hasher.finalize();
  let hash: String = digest.iter().map(|b| format!("{:02x}", b)).collect();
  format!(
    "{}/{}-to-{}-{}",
    prefix.trim_end_matches('/'),
    source,
    target,
    &hash[..BRANCH_HASH_LEN]
  )
}
