// src/github/mod.rs
// =============================================================================
// This module handles everything that talks to GitHub.
//
// - gateway: the RepositoryGateway trait and the types it returns
// - fetch:   GitHubClient, the reqwest-based implementation of that trait
// - repo_url: parsing repository URLs into (owner, repo)
// =============================================================================

mod fetch;
mod gateway;
mod repo_url;

pub use fetch::GitHubClient;
pub use gateway::{GatewayError, RateLimit, RepoMeta, RepositoryGateway, TreeEntry, TreeListing};
pub use repo_url::parse_repo_url;
