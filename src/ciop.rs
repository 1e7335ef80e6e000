//! Just enough of the ci-operator configuration format to decide whether a
//! repository builds official images.

use crate::error::{Result, SyncError};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Location of ci-operator configuration inside a release repository.
pub const CONFIG_IN_REPO_PATH: &str = "ci-operator/config";

#[derive(Debug, Default, Deserialize)]
pub struct BuildConfiguration {
    #[serde(default)]
    pub promotion: Option<PromotionConfiguration>,
    #[serde(default)]
    pub tag_specification: Option<TagSpecification>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PromotionConfiguration {
    #[serde(default)]
    pub namespace: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct TagSpecification {
    #[serde(default)]
    pub namespace: String,
    #[serde(default)]
    pub name: String,
}

/// Where a configuration file sits: `<org>/<repo>/<org>-<repo>-<branch>[__<variant>].yaml`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigInfo {
    pub org: String,
    pub repo: String,
    pub branch: String,
    pub variant: Option<String>,
    pub filename: PathBuf,
}

impl ConfigInfo {
    pub fn from_path(path: &Path) -> Result<Self> {
        let dir_name = |p: Option<&Path>| {
            p.and_then(Path::file_name)
                .and_then(|n| n.to_str())
                .map(str::to_string)
        };

        let repo_dir = path.parent();
        let repo = dir_name(repo_dir).ok_or_else(|| {
            SyncError::Scan(format!("could not extract repo from '{}'", path.display()))
        })?;
        let org = dir_name(repo_dir.and_then(Path::parent)).ok_or_else(|| {
            SyncError::Scan(format!("could not extract org from '{}'", path.display()))
        })?;

        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default();
        let prefix = format!("{org}-{repo}-");
        let rest = stem.strip_prefix(&prefix).unwrap_or(stem);
        let (branch, variant) = match rest.rfind("__") {
            Some(i) => (&rest[..i], Some(rest[i + 2..].to_string())),
            None => (rest, None),
        };

        Ok(Self {
            org,
            repo,
            branch: branch.to_string(),
            variant,
            filename: path.to_path_buf(),
        })
    }
}

impl BuildConfiguration {
    fn promotion_target(&self) -> (&str, &str) {
        let promotion = self.promotion.as_ref();
        let tags = self.tag_specification.as_ref();

        let namespace = promotion
            .map(|p| p.namespace.as_str())
            .filter(|ns| !ns.is_empty())
            .or_else(|| tags.map(|t| t.namespace.as_str()))
            .unwrap_or_default();
        let name = promotion
            .map(|p| p.name.as_str())
            .filter(|n| !n.is_empty())
            .or_else(|| tags.map(|t| t.name.as_str()))
            .unwrap_or_default();
        (namespace, name)
    }

    /// Whether this configuration builds images for an official release stream.
    /// Promotion `disabled` is not consulted.
    pub fn builds_official_images(&self) -> bool {
        let (namespace, name) = self.promotion_target();
        refers_to_official_image(namespace, name)
    }
}

pub fn refers_to_official_image(namespace: &str, name: &str) -> bool {
    (namespace == "ocp" && name.starts_with("4."))
        || (namespace == "openshift" && name.starts_with("origin-v4."))
}

fn is_config_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    )
}

pub fn load_config(path: &Path) -> Result<BuildConfiguration> {
    let contents = fs::read_to_string(path)
        .map_err(|e| SyncError::Scan(format!("failed to read {}: {e}", path.display())))?;
    serde_yaml::from_str(&contents)
        .map_err(|e| SyncError::Scan(format!("failed to load {}: {e}", path.display())))
}

/// Calls `callback` for every configuration file beneath `root`, in file-name
/// order. Stops at the first error.
pub fn operate_on_config_dir<F>(root: &Path, mut callback: F) -> Result<()>
where
    F: FnMut(&BuildConfiguration, &ConfigInfo) -> Result<()>,
{
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|e| SyncError::Scan(e.to_string()))?;
        if !entry.file_type().is_file() || !is_config_file(entry.path()) {
            continue;
        }
        let info = ConfigInfo::from_path(entry.path())?;
        let config = load_config(entry.path())?;
        callback(&config, &info)?;
    }
    Ok(())
}
