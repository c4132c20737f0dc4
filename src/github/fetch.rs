// src/github/fetch.rs
// =============================================================================
// The HTTP implementation of RepositoryGateway, backed by the GitHub REST API.
//
// Endpoints used (relative to the API base URL):
//   /repos/{owner}/{repo}                              repository metadata
//   /repos/{owner}/{repo}/git/trees/{branch}?recursive=1   full file tree
//   /repos/{owner}/{repo}/contents/{path}              file content by path
//   /repos/{owner}/{repo}/git/blobs/{sha}              file content by sha
//   /rate_limit                                        remaining quota
//
// The base URL is configurable so the same code can go through a proxy (or a
// GitHub Enterprise host) instead of api.github.com.
//
// Rust concepts:
// - Generic functions: get_json::<T>() works for any deserializable type
// - serde: wire structs mirror GitHub's JSON, then map to our own types
// =============================================================================

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use super::gateway::{GatewayError, RateLimit, RepoMeta, RepositoryGateway, TreeEntry, TreeListing};
use crate::config::{ContentLookup, GatewayConfig};

// GitHub rejects API requests without a User-Agent
const USER_AGENT: &str = concat!("repo-digest/", env!("CARGO_PKG_VERSION"));

// ---- Wire formats ---------------------------------------------------------

#[derive(Debug, Deserialize)]
struct RepoResponse {
    name: String,
    description: Option<String>,
    stargazers_count: u64,
    forks_count: u64,
    default_branch: String,
    html_url: String,
    language: Option<String>,
    owner: Option<OwnerResponse>,
}

#[derive(Debug, Deserialize)]
struct OwnerResponse {
    avatar_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TreeResponse {
    #[serde(default)]
    truncated: bool,
    tree: Vec<TreeItemResponse>,
}

#[derive(Debug, Deserialize)]
struct TreeItemResponse {
    path: String,
    #[serde(rename = "type")]
    kind: String,
    sha: String,
    size: Option<u64>,
}

// Both the contents and the blobs endpoint answer with this shape
#[derive(Debug, Deserialize)]
struct BlobResponse {
    content: String,
    encoding: String,
}

#[derive(Debug, Deserialize)]
struct RateLimitResponse {
    rate: RateLimit,
}

// ---- Client ---------------------------------------------------------------

pub struct GitHubClient {
    client: Client,
    api_url: Url,
    lookup: ContentLookup,
}

impl GitHubClient {
    pub fn new(config: &GatewayConfig) -> Result<Self, GatewayError> {
        let api_url = Url::parse(&config.api_url)
            .map_err(|e| GatewayError::Decode(format!("Invalid API URL '{}': {}", config.api_url, e)))?;

        if api_url.cannot_be_a_base() {
            return Err(GatewayError::Decode(format!(
                "Invalid API URL '{}': not a base URL",
                config.api_url
            )));
        }

        // One client for every request (connection pooling). The timeout
        // applies per request, not per analysis.
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(GitHubClient {
            client,
            api_url,
            lookup: config.lookup,
        })
    }

    // Appends path segments to the API base, escaping each one.
    // A segment containing '/' (a file path, a branch name) is split first
    // so the slashes stay literal.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.api_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty();
            for segment in segments {
                path.extend(segment.split('/').filter(|s| !s.is_empty()));
            }
        }
        url
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, GatewayError> {
        debug!(%url, "GET");

        let response = self
            .client
            .get(url)
            .header("Accept", "application/vnd.github+json")
            .send()
            .await?;

        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Err(GatewayError::NotFound);
        }

        // GitHub answers 403 (sometimes 429) once the hourly quota is gone
        let quota_exhausted = response
            .headers()
            .get("x-ratelimit-remaining")
            .and_then(|v| v.to_str().ok())
            == Some("0");
        if (status == StatusCode::FORBIDDEN || status == StatusCode::TOO_MANY_REQUESTS)
            && quota_exhausted
        {
            return Err(GatewayError::RateLimited);
        }

        if !status.is_success() {
            return Err(GatewayError::Status(status.as_u16()));
        }

        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl RepositoryGateway for GitHubClient {
    async fn get_repository(&self, owner: &str, repo: &str) -> Result<RepoMeta, GatewayError> {
        let url = self.endpoint(&["repos", owner, repo]);
        let data: RepoResponse = self.get_json(url).await?;

        Ok(RepoMeta {
            name: data.name,
            description: data.description,
            stars: data.stargazers_count,
            forks: data.forks_count,
            default_branch: data.default_branch,
            html_url: data.html_url,
            language: data.language,
            owner_avatar_url: data.owner.and_then(|o| o.avatar_url),
        })
    }

    async fn get_tree(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
    ) -> Result<TreeListing, GatewayError> {
        let mut url = self.endpoint(&["repos", owner, repo, "git", "trees", branch]);
        url.query_pairs_mut().append_pair("recursive", "1");

        let data: TreeResponse = self.get_json(url).await?;

        let entries = data
            .tree
            .into_iter()
            .map(|item| TreeEntry {
                path: item.path,
                size: item.size,
                sha: item.sha,
                kind: item.kind,
            })
            .collect();

        Ok(TreeListing {
            truncated: data.truncated,
            entries,
        })
    }

    async fn get_blob_content(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        sha: &str,
    ) -> Result<Vec<u8>, GatewayError> {
        let url = match self.lookup {
            ContentLookup::ByPath => self.endpoint(&["repos", owner, repo, "contents", path]),
            ContentLookup::BySha => self.endpoint(&["repos", owner, repo, "git", "blobs", sha]),
        };

        let data: BlobResponse = self.get_json(url).await?;
        decode_blob(&data.content, &data.encoding)
    }

    async fn get_rate_limit(&self) -> Result<RateLimit, GatewayError> {
        let url = self.endpoint(&["rate_limit"]);
        let data: RateLimitResponse = self.get_json(url).await?;
        Ok(data.rate)
    }
}

// Turns GitHub's content payload into raw bytes.
//
// Base64 content arrives wrapped at 60 columns, so whitespace is stripped
// before decoding. Files over 1 MB come back with encoding "none" and an
// empty body; that is reported as an error rather than an empty file.
fn decode_blob(content: &str, encoding: &str) -> Result<Vec<u8>, GatewayError> {
    match encoding {
        "base64" => {
            let compact: String = content.chars().filter(|c| !c.is_whitespace()).collect();
            STANDARD
                .decode(compact.as_bytes())
                .map_err(|e| GatewayError::Decode(format!("invalid base64 content: {}", e)))
        }
        "utf-8" | "utf8" => Ok(content.as_bytes().to_vec()),
        other => Err(GatewayError::Decode(format!(
            "content not available (encoding '{}')",
            other
        ))),
    }
}
