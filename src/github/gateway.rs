// src/github/gateway.rs
// =============================================================================
// The RepositoryGateway trait: everything the digest pipeline needs from
// GitHub, expressed as four read-only operations.
//
// - get_repository:   name, description, stars, default branch, ...
// - get_tree:         recursive listing of every entry on a branch
// - get_blob_content: the raw bytes of one file
// - get_rate_limit:   how many API calls we have left
//
// There is one HTTP implementation (fetch.rs) whose transport can be switched
// between "direct" and "backend" access. Tests use an in-memory fake.
//
// Rust concepts:
// - Traits: a shared interface with swappable implementations
// - async-trait: lets a trait have async methods and still be a trait object
// =============================================================================

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Repository metadata, already mapped from GitHub's field names
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoMeta {
    pub name: String,
    pub description: Option<String>,
    pub stars: u64,
    pub forks: u64,
    pub default_branch: String,
    pub html_url: String,
    pub language: Option<String>,
    pub owner_avatar_url: Option<String>,
}

/// One entry of a git tree listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    pub path: String,
    /// Trees and submodules carry no size
    pub size: Option<u64>,
    pub sha: String,
    /// "blob", "tree" or "commit"
    pub kind: String,
}

impl TreeEntry {
    pub fn is_blob(&self) -> bool {
        self.kind == "blob"
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TreeListing {
    /// GitHub stops listing very large trees and sets this flag
    pub truncated: bool,
    pub entries: Vec<TreeEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimit {
    pub limit: u64,
    pub remaining: u64,
    /// Epoch seconds at which the window resets
    pub reset: u64,
}

impl RateLimit {
    /// Reported when the rate limit endpoint itself can't be reached
    pub fn fallback() -> Self {
        RateLimit {
            limit: 60,
            remaining: 0,
            reset: 0,
        }
    }
}

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Not found")]
    NotFound,

    #[error("GitHub API rate limit exceeded")]
    RateLimited,

    #[error("HTTP {0}")]
    Status(u16),

    #[error("Request timed out")]
    Timeout,

    #[error("Request failed: {0}")]
    Http(reqwest::Error),

    #[error("Unexpected response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for GatewayError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            GatewayError::Timeout
        } else if error.is_decode() {
            GatewayError::Decode(error.to_string())
        } else {
            GatewayError::Http(error)
        }
    }
}

#[async_trait]
pub trait RepositoryGateway: Send + Sync {
    async fn get_repository(&self, owner: &str, repo: &str) -> Result<RepoMeta, GatewayError>;

    async fn get_tree(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
    ) -> Result<TreeListing, GatewayError>;

    /// Implementations look the file up either by `path` or by blob `sha`.
    /// The returned bytes are already decoded from GitHub's base64 payload.
    async fn get_blob_content(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        sha: &str,
    ) -> Result<Vec<u8>, GatewayError>;

    async fn get_rate_limit(&self) -> Result<RateLimit, GatewayError>;
}
