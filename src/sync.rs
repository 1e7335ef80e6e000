use crate::error::Result;
use crate::github::{FullRepo, RepoLookup};
use crate::peribolos::{prune_defaults, RepoSettings, REPO_DEFAULTS};
use crate::scanner::OrgRepoSet;
use crate::shutdown::Shutdown;
use std::collections::BTreeMap;

impl From<FullRepo> for RepoSettings {
    fn from(repo: FullRepo) -> Self {
        RepoSettings {
            description: Some(repo.description.unwrap_or_default()),
            homepage: Some(repo.homepage.unwrap_or_default()),
            private: Some(repo.private),
            has_issues: Some(repo.has_issues),
            has_projects: Some(repo.has_projects),
            has_wiki: Some(repo.has_wiki),
            allow_merge_commit: Some(repo.allow_merge_commit),
            allow_squash_merge: Some(repo.allow_squash_merge),
            allow_rebase_merge: Some(repo.allow_rebase_merge),
            archived: Some(repo.archived),
            default_branch: Some(repo.default_branch),
            ..Default::default()
        }
    }
}

/// Fetches every repository in `org_repos` and returns its pruned settings,
/// keyed by the name GitHub reports. Stops at the first failed lookup.
pub async fn generate_repositories<L: RepoLookup>(
    client: &L,
    org_repos: &OrgRepoSet,
    shutdown: &Shutdown,
) -> Result<BTreeMap<String, RepoSettings>> {
    let mut repos = BTreeMap::new();

    for (org, names) in org_repos {
        for name in names {
            tracing::info!(org = %org, repo = %name, "Processing repository details...");

            let full_repo = shutdown
                .guard("fetching repository details", client.get_repo(org, name))
                .await?;
            if full_repo.name != *name {
                tracing::debug!(
                    org = %org,
                    requested = %name,
                    actual = %full_repo.name,
                    "repository was renamed"
                );
            }

            let key = full_repo.name.clone();
            repos.insert(key, prune_defaults(full_repo.into(), REPO_DEFAULTS));
        }
    }

    Ok(repos)
}
