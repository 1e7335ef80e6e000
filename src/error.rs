use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("invalid options: [{}]", .0.join(", "))]
    InvalidOptions(Vec<String>),

    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to unmarshal {}: {source}", .path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("failed to marshal output: {0}")]
    Serialize(#[from] serde_yaml::Error),

    #[error("error while operating in ci-operator configuration files: {0}")]
    Scan(String),

    #[error("GitHub API error: {0}")]
    GitHub(String),

    #[error("couldn't get repo details for {org}/{repo}: {message}")]
    RepoLookup {
        org: String,
        repo: String,
        message: String,
    },

    #[error("interrupted while {0}")]
    Interrupted(&'static str),
}

impl SyncError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SyncError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn yaml(path: impl Into<PathBuf>, source: serde_yaml::Error) -> Self {
        SyncError::Yaml {
            path: path.into(),
            source,
        }
    }
}

impl From<octocrab::Error> for SyncError {
    fn from(err: octocrab::Error) -> Self {
        SyncError::GitHub(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
