use crate::error::{Result, SyncError};
use octocrab::Octocrab;
use serde::Deserialize;

/// Repository attributes as returned by `GET /repos/{owner}/{repo}`.
///
/// Fields missing from the payload take the platform default.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct FullRepo {
    pub name: String,
    pub description: Option<String>,
    pub homepage: Option<String>,
    pub private: bool,
    pub has_issues: bool,
    pub has_projects: bool,
    pub has_wiki: bool,
    pub allow_merge_commit: bool,
    pub allow_squash_merge: bool,
    pub allow_rebase_merge: bool,
    pub archived: bool,
    pub default_branch: String,
}

impl Default for FullRepo {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: None,
            homepage: None,
            private: false,
            has_issues: true,
            has_projects: true,
            has_wiki: true,
            allow_merge_commit: true,
            allow_squash_merge: true,
            allow_rebase_merge: true,
            archived: false,
            default_branch: "master".to_string(),
        }
    }
}

/// Read-only repository metadata lookup.
pub trait RepoLookup {
    async fn get_repo(&self, owner: &str, name: &str) -> Result<FullRepo>;
}

pub struct GithubClient {
    octocrab: Octocrab,
}

impl GithubClient {
    pub fn new(token: &str, endpoint: &str) -> Result<Self> {
        let octocrab = Octocrab::builder()
            .personal_token(token.to_string())
            .base_uri(endpoint)
            .map_err(|e| SyncError::GitHub(format!("invalid endpoint {endpoint}: {e}")))?
            .build()?;
        Ok(Self { octocrab })
    }
}

impl RepoLookup for GithubClient {
    async fn get_repo(&self, owner: &str, name: &str) -> Result<FullRepo> {
        self.octocrab
            .get(format!("/repos/{owner}/{name}"), None::<&()>)
            .await
            .map_err(|e| SyncError::RepoLookup {
                org: owner.to_string(),
                repo: name.to_string(),
                message: e.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn missing_fields_take_platform_defaults() {
        let repo: FullRepo = serde_json::from_value(json!({
            "name": "origin",
            "description": null,
            "private": true,
        }))
        .unwrap();
        assert_eq!(repo.name, "origin");
        assert_eq!(repo.description, None);
        assert!(repo.private);
        assert!(repo.has_issues);
        assert_eq!(repo.default_branch, "master");
    }

    #[tokio::test]
    async fn get_repo_reads_full_repository() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/openshift/origin"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 1,
                "name": "origin",
                "full_name": "openshift/origin",
                "description": "The self-managing, auto-upgrading Kubernetes distribution",
                "homepage": "https://okd.io",
                "private": false,
                "has_issues": false,
                "has_projects": true,
                "has_wiki": false,
                "allow_merge_commit": true,
                "allow_squash_merge": false,
                "allow_rebase_merge": false,
                "archived": false,
                "default_branch": "main"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = GithubClient::new("secret-token", &server.uri()).unwrap();
        let repo = client.get_repo("openshift", "origin").await.unwrap();

        assert_eq!(repo.name, "origin");
        assert_eq!(repo.homepage.as_deref(), Some("https://okd.io"));
        assert!(!repo.has_issues);
        assert!(!repo.allow_squash_merge);
        assert_eq!(repo.default_branch, "main");
    }

    #[tokio::test]
    async fn get_repo_failure_names_the_repository() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/openshift/missing"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "message": "Not Found",
                "documentation_url": "https://docs.github.com/rest"
            })))
            .mount(&server)
            .await;

        let client = GithubClient::new("secret-token", &server.uri()).unwrap();
        let err = client.get_repo("openshift", "missing").await.unwrap_err();

        match err {
            SyncError::RepoLookup { org, repo, .. } => {
                assert_eq!(org, "openshift");
                assert_eq!(repo, "missing");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn invalid_endpoint_is_rejected() {
        assert!(GithubClient::new("token", "not a uri").is_err());
    }
}
