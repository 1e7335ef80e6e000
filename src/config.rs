use crate::error::{Result, SyncError};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_TOKEN_PATH: &str = "/etc/github/oauth";
pub const DEFAULT_ENDPOINT: &str = "https://api.github.com";

/// Repositories to include whether or not they promote official images.
#[derive(Debug, Default, Deserialize)]
pub struct WhitelistConfig {
    #[serde(default)]
    pub whitelist: BTreeMap<String, Vec<String>>,
}

/// Options as given on the command line; any of them may be missing.
#[derive(Debug, Default, Clone)]
pub struct RawOptions {
    pub peribolos_config: Option<PathBuf>,
    pub release_repo_path: Option<PathBuf>,
    pub destination_org: Option<String>,
    pub whitelist_file: Option<PathBuf>,
    pub github_token_path: PathBuf,
    pub github_endpoint: String,
}

/// Options after validation.
#[derive(Debug)]
pub struct Options {
    pub peribolos_config: PathBuf,
    pub release_repo_path: PathBuf,
    pub destination_org: String,
    pub whitelist: WhitelistConfig,
    pub github_token_path: PathBuf,
    pub github_endpoint: String,
}

fn non_empty_path(path: Option<PathBuf>) -> Option<PathBuf> {
    path.filter(|p| !p.as_os_str().is_empty())
}

impl RawOptions {
    /// Checks every option and reports all problems at once.
    pub fn validate(self) -> Result<Options> {
        let mut errors = Vec::new();

        let release_repo_path = non_empty_path(self.release_repo_path);
        if release_repo_path.is_none() {
            errors.push("--release-repo-path is not specified".to_string());
        }
        let peribolos_config = non_empty_path(self.peribolos_config);
        if peribolos_config.is_none() {
            errors.push("--peribolos-config is not specified".to_string());
        }
        let destination_org = self.destination_org.filter(|o| !o.is_empty());
        if destination_org.is_none() {
            errors.push("--destination-org is not specified".to_string());
        }

        if self.github_token_path.as_os_str().is_empty() {
            errors.push("--github-token-path is not specified".to_string());
        }
        if let Err(e) = url::Url::parse(&self.github_endpoint) {
            errors.push(format!(
                "invalid --github-endpoint {:?}: {e}",
                self.github_endpoint
            ));
        }

        let whitelist = match non_empty_path(self.whitelist_file) {
            Some(path) => load_whitelist(&path).unwrap_or_else(|e| {
                errors.push(format!("failed to load whitelist: {e}"));
                WhitelistConfig::default()
            }),
            None => WhitelistConfig::default(),
        };

        match (peribolos_config, release_repo_path, destination_org) {
            (Some(peribolos_config), Some(release_repo_path), Some(destination_org))
                if errors.is_empty() =>
            {
                Ok(Options {
                    peribolos_config,
                    release_repo_path,
                    destination_org,
                    whitelist,
                    github_token_path: self.github_token_path,
                    github_endpoint: self.github_endpoint,
                })
            }
            _ => Err(SyncError::InvalidOptions(errors)),
        }
    }
}

pub fn load_whitelist(path: &Path) -> Result<WhitelistConfig> {
    let contents = fs::read_to_string(path).map_err(|e| SyncError::io(path, e))?;
    serde_yaml::from_str(&contents).map_err(|e| SyncError::yaml(path, e))
}

/// Reads the GitHub token, ignoring surrounding whitespace.
pub fn load_token(path: &Path) -> Result<String> {
    let contents = fs::read_to_string(path).map_err(|e| SyncError::io(path, e))?;
    let token = contents.trim();
    if token.is_empty() {
        return Err(SyncError::GitHub(format!(
            "token file {} is empty",
            path.display()
        )));
    }
    Ok(token.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw() -> RawOptions {
        RawOptions {
            peribolos_config: Some(PathBuf::from("org.yaml")),
            release_repo_path: Some(PathBuf::from("release")),
            destination_org: Some("openshift-priv".to_string()),
            whitelist_file: None,
            github_token_path: PathBuf::from(DEFAULT_TOKEN_PATH),
            github_endpoint: DEFAULT_ENDPOINT.to_string(),
        }
    }

    #[test]
    fn complete_options_validate() {
        let opts = raw().validate().unwrap();
        assert_eq!(opts.destination_org, "openshift-priv");
        assert!(opts.whitelist.whitelist.is_empty());
    }

    #[test]
    fn missing_options_are_aggregated() {
        let err = RawOptions {
            github_token_path: PathBuf::from(DEFAULT_TOKEN_PATH),
            github_endpoint: DEFAULT_ENDPOINT.to_string(),
            ..Default::default()
        }
        .validate()
        .unwrap_err();

        match err {
            SyncError::InvalidOptions(errors) => assert_eq!(
                errors,
                vec![
                    "--release-repo-path is not specified",
                    "--peribolos-config is not specified",
                    "--destination-org is not specified",
                ]
            ),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn empty_destination_org_is_missing() {
        let err = RawOptions {
            destination_org: Some(String::new()),
            ..raw()
        }
        .validate()
        .unwrap_err();
        assert!(err.to_string().contains("--destination-org"));
    }

    #[test]
    fn bad_endpoint_is_reported_with_missing_flags() {
        let err = RawOptions {
            peribolos_config: None,
            github_endpoint: "::nope".to_string(),
            ..raw()
        }
        .validate()
        .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("--peribolos-config is not specified"));
        assert!(msg.contains("--github-endpoint"));
    }

    #[test]
    fn whitelist_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("whitelist.yaml");
        fs::write(&path, "whitelist:\n  openshift:\n  - origin\n  - installer\n").unwrap();

        let opts = RawOptions {
            whitelist_file: Some(path),
            ..raw()
        }
        .validate()
        .unwrap();

        assert_eq!(
            opts.whitelist.whitelist["openshift"],
            vec!["origin".to_string(), "installer".to_string()]
        );
    }

    #[test]
    fn unreadable_whitelist_is_a_validation_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = RawOptions {
            whitelist_file: Some(dir.path().join("missing.yaml")),
            ..raw()
        }
        .validate()
        .unwrap_err();
        assert!(err.to_string().contains("failed to load whitelist"));
    }

    #[test]
    fn token_is_trimmed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("oauth");
        fs::write(&path, "  ghp_abc\n").unwrap();
        assert_eq!(load_token(&path).unwrap(), "ghp_abc");
    }

    #[test]
    fn empty_token_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("oauth");
        fs::write(&path, "\n").unwrap();
        assert!(load_token(&path).is_err());
    }
}
