//! The peribolos organization configuration document.
//!
//! Only the repository settings are modeled; every other key is kept as
//! raw YAML so untouched organizations survive a rewrite.

use crate::error::{Result, SyncError};
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::Path;

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct FullConfig {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub orgs: BTreeMap<String, OrgConfig>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrgConfig {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub repos: BTreeMap<String, RepoSettings>,
    /// Metadata, teams, members and admins.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepoSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_issues: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_projects: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_wiki: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_squash_merge: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_merge_commit: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_rebase_merge: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archived: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_branch: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub previously: Vec<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepoField {
    Description,
    HomePage,
    Private,
    HasIssues,
    HasProjects,
    HasWiki,
    AllowRebaseMerge,
    AllowSquashMerge,
    AllowMergeCommit,
    Archived,
    DefaultBranch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultValue {
    Str(&'static str),
    Bool(bool),
}

/// GitHub's defaults for a newly created repository.
pub const REPO_DEFAULTS: &[(RepoField, DefaultValue)] = &[
    (RepoField::Description, DefaultValue::Str("")),
    (RepoField::HomePage, DefaultValue::Str("")),
    (RepoField::Private, DefaultValue::Bool(false)),
    (RepoField::HasIssues, DefaultValue::Bool(true)),
    (RepoField::HasProjects, DefaultValue::Bool(true)),
    (RepoField::HasWiki, DefaultValue::Bool(true)),
    (RepoField::AllowRebaseMerge, DefaultValue::Bool(true)),
    (RepoField::AllowSquashMerge, DefaultValue::Bool(true)),
    (RepoField::AllowMergeCommit, DefaultValue::Bool(true)),
    (RepoField::Archived, DefaultValue::Bool(false)),
    (RepoField::DefaultBranch, DefaultValue::Str("master")),
];

enum Slot<'a> {
    Str(&'a mut Option<String>),
    Bool(&'a mut Option<bool>),
}

impl RepoSettings {
    fn slot_mut(&mut self, field: RepoField) -> Slot<'_> {
        match field {
            RepoField::Description => Slot::Str(&mut self.description),
            RepoField::HomePage => Slot::Str(&mut self.homepage),
            RepoField::Private => Slot::Bool(&mut self.private),
            RepoField::HasIssues => Slot::Bool(&mut self.has_issues),
            RepoField::HasProjects => Slot::Bool(&mut self.has_projects),
            RepoField::HasWiki => Slot::Bool(&mut self.has_wiki),
            RepoField::AllowRebaseMerge => Slot::Bool(&mut self.allow_rebase_merge),
            RepoField::AllowSquashMerge => Slot::Bool(&mut self.allow_squash_merge),
            RepoField::AllowMergeCommit => Slot::Bool(&mut self.allow_merge_commit),
            RepoField::Archived => Slot::Bool(&mut self.archived),
            RepoField::DefaultBranch => Slot::Str(&mut self.default_branch),
        }
    }
}

/// Clears every field whose value equals its entry in `defaults`.
pub fn prune_defaults(
    mut repo: RepoSettings,
    defaults: &[(RepoField, DefaultValue)],
) -> RepoSettings {
    for &(field, default) in defaults {
        match (repo.slot_mut(field), default) {
            (Slot::Str(value), DefaultValue::Str(d)) => {
                if value.as_deref() == Some(d) {
                    *value = None;
                }
            }
            (Slot::Bool(value), DefaultValue::Bool(d)) => {
                if *value == Some(d) {
                    *value = None;
                }
            }
            _ => tracing::warn!(?field, ?default, "default value type does not match field"),
        }
    }
    repo
}

impl FullConfig {
    pub fn from_yaml(path: &Path, contents: &str) -> Result<Self> {
        serde_yaml::from_str(contents).map_err(|e| SyncError::yaml(path, e))
    }

    /// Serializes with every mapping's keys in sorted order.
    pub fn to_yaml(&self) -> Result<String> {
        let value = sort_keys(serde_yaml::to_value(self)?);
        Ok(serde_yaml::to_string(&value)?)
    }

    /// Replaces the repositories of `org` wholesale, creating the entry if needed.
    pub fn replace_org_repos(&mut self, org: &str, repos: BTreeMap<String, RepoSettings>) {
        self.orgs.entry(org.to_string()).or_default().repos = repos;
    }
}

fn key_order(key: &Value) -> String {
    match key {
        Value::String(s) => s.clone(),
        other => serde_yaml::to_string(other).unwrap_or_default(),
    }
}

fn sort_keys(value: Value) -> Value {
    match value {
        Value::Mapping(map) => {
            let mut entries: Vec<(Value, Value)> =
                map.into_iter().map(|(k, v)| (k, sort_keys(v))).collect();
            entries.sort_by_cached_key(|(k, _)| key_order(k));
            Value::Mapping(entries.into_iter().collect())
        }
        Value::Sequence(seq) => Value::Sequence(seq.into_iter().map(sort_keys).collect()),
        Value::Tagged(mut tagged) => {
            tagged.value = sort_keys(std::mem::take(&mut tagged.value));
            Value::Tagged(tagged)
        }
        other => other,
    }
}

/// Writes `contents` next to `path` and renames it into place, keeping the
/// permissions of the file being replaced.
pub fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| SyncError::io(dir, e))?;
    tmp.write_all(contents.as_bytes())
        .and_then(|()| tmp.as_file().sync_all())
        .map_err(|e| SyncError::io(tmp.path(), e))?;

    if let Ok(meta) = fs::metadata(path) {
        fs::set_permissions(tmp.path(), meta.permissions())
            .map_err(|e| SyncError::io(tmp.path(), e))?;
    }

    tmp.persist(path).map_err(|e| SyncError::io(path, e.error))?;
    Ok(())
}
