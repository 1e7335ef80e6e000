mod client;

pub use client::{FullRepo, GithubClient, RepoLookup};
