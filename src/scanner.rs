use crate::ciop::{self, CONFIG_IN_REPO_PATH};
use crate::error::Result;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// Repositories to sync, grouped by organization.
pub type OrgRepoSet = BTreeMap<String, BTreeSet<String>>;

/// Collects the whitelisted repositories plus every repository under
/// `release_repo_path` whose ci-operator configuration builds official images.
pub fn repos_for_private_org(
    release_repo_path: &Path,
    whitelist: &BTreeMap<String, Vec<String>>,
) -> Result<OrgRepoSet> {
    let mut ret = OrgRepoSet::new();

    for (org, repos) in whitelist {
        ret.entry(org.clone())
            .or_default()
            .extend(repos.iter().cloned());
    }

    let config_dir = release_repo_path.join(CONFIG_IN_REPO_PATH);
    ciop::operate_on_config_dir(&config_dir, |config, info| {
        if config.builds_official_images() {
            tracing::debug!(
                org = %info.org,
                repo = %info.repo,
                branch = %info.branch,
                variant = ?info.variant,
                file = %info.filename.display(),
                "builds official images"
            );
            ret.entry(info.org.clone())
                .or_default()
                .insert(info.repo.clone());
        }
        Ok(())
    })?;

    Ok(ret)
}

pub fn repo_count(set: &OrgRepoSet) -> usize {
    set.values().map(BTreeSet::len).sum()
}
