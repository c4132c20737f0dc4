// src/digest/assemble.rs
// =============================================================================
// The digest pipeline. Given a gateway and a request it:
//
// 1. Validates owner/repo
// 2. Fetches repository metadata   (404 -> NotFound, quota gone -> RateLimited)
// 3. Fetches the recursive tree, keeps blobs (quota gone -> RateLimited, else Upstream)
// 4. Filters by size and exclude patterns
// 5. Builds the directory tree from ALL filtered files
// 6. Prioritizes and keeps the first `max_files`
// 7. Fetches their content, a few at a time, keeping priority order.
//    A failing file is recorded as an error entry, the rest carry on.
// 8. Fetches the rate limit (failure -> {60, 0, 0})
// 9. Renders the text digest and the structured object
//
// Nothing is cached between calls; each analyze() is independent.
// =============================================================================

use futures::stream::{self, StreamExt};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::entry::FileEntry;
use super::language::{format_file_size, language_for_path};
use super::patterns::{filter_files, FilterConfig};
use super::priority::prioritize;
use super::tree::{build_tree, TreeNode};
use crate::error::{DigestError, Result};
use crate::github::{GatewayError, RateLimit, RepoMeta, RepositoryGateway, TreeListing};

#[derive(Debug, Clone)]
pub struct AnalyzeRequest {
    pub owner: String,
    pub repo: String,
    pub filter: FilterConfig,
    /// How many files get their content fetched
    pub max_files: usize,
}

/// Outcome of fetching one file's content
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ContentResult {
    Fetched {
        path: String,
        content: String,
        language: String,
        /// Human readable, e.g. "2.0 KB"
        size: String,
    },
    Failed {
        path: String,
        error: String,
        size: String,
    },
}

impl ContentResult {
    pub fn path(&self) -> &str {
        match self {
            ContentResult::Fetched { path, .. } | ContentResult::Failed { path, .. } => path,
        }
    }

    pub fn is_fetched(&self) -> bool {
        matches!(self, ContentResult::Fetched { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositorySummary {
    pub name: String,
    pub full_name: String,
    pub description: String,
    pub url: String,
    pub stars: u64,
    pub forks: u64,
    pub default_branch: String,
    pub language: Option<String>,
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileStats {
    pub total_count: usize,
    pub total_size: String,
    pub max_file_size: String,
    pub exclude_patterns: Vec<String>,
    /// GitHub cut the tree listing short; the counts above are partial
    pub truncated: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredDigest {
    pub repository: RepositorySummary,
    pub file_stats: FileStats,
    pub directory_structure: TreeNode,
    pub files: Vec<ContentResult>,
}

/// Serialized as {digest, structured, rateLimit}
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Digest {
    #[serde(rename = "digest")]
    pub text: String,
    pub structured: StructuredDigest,
    pub rate_limit: RateLimit,
}

pub async fn analyze(gateway: &dyn RepositoryGateway, request: &AnalyzeRequest) -> Result<Digest> {
    let owner = request.owner.trim();
    let repo = request.repo.trim();

    if owner.is_empty() || repo.is_empty() {
        return Err(DigestError::Validation("Owner and repo are required".to_string()));
    }

    info!(owner, repo, "analyzing repository");

    let meta = gateway
        .get_repository(owner, repo)
        .await
        .map_err(|e| match e {
            GatewayError::NotFound => DigestError::NotFound(format!("{}/{}", owner, repo)),
            GatewayError::RateLimited => DigestError::RateLimited,
            other => DigestError::upstream("Failed to fetch repository data", other),
        })?;

    let listing: TreeListing = gateway
        .get_tree(owner, repo, &meta.default_branch)
        .await
        .map_err(|e| match e {
            GatewayError::RateLimited => DigestError::RateLimited,
            other => DigestError::upstream("Failed to get repository files", other),
        })?;

    if listing.truncated {
        warn!(owner, repo, "repository tree is truncated due to size limits");
    }

    let blobs: Vec<FileEntry> = listing
        .entries
        .into_iter()
        .filter_map(FileEntry::from_tree_entry)
        .collect();
    let blob_count = blobs.len();

    let filtered = filter_files(blobs, &request.filter);
    debug!(total = blob_count, kept = filtered.len(), "filtered file list");

    let directory_structure = build_tree(&filtered);

    let selected: Vec<FileEntry> = prioritize(&filtered)
        .into_iter()
        .take(request.max_files)
        .collect();

    let files = fetch_contents(gateway, owner, repo, &selected).await;

    let rate_limit = match gateway.get_rate_limit().await {
        Ok(rate) => rate,
        Err(e) => {
            warn!(error = %e, "could not read rate limit, reporting defaults");
            RateLimit::fallback()
        }
    };

    // Counted from the tree, which holds every filtered file exactly once
    let leaves = directory_structure.files();
    let file_stats = FileStats {
        total_count: leaves.len(),
        total_size: format_file_size(leaves.iter().map(|f| f.size).sum()),
        max_file_size: format!("{}KB", request.filter.max_file_size_kb),
        exclude_patterns: if request.filter.exclude_patterns.is_empty() {
            vec!["none".to_string()]
        } else {
            request.filter.exclude_patterns.clone()
        },
        truncated: listing.truncated,
    };

    let text = render_text(owner, repo, &meta, &request.filter, &file_stats, &files);

    Ok(Digest {
        text,
        structured: StructuredDigest {
            repository: summarize(owner, repo, meta),
            file_stats,
            directory_structure,
            files,
        },
        rate_limit,
    })
}

// Runs up to `selected.len()` requests at once. `buffered` (unlike
// `buffer_unordered`) yields results in input order, so the output keeps
// the priority order no matter which request finishes first.
async fn fetch_contents(
    gateway: &dyn RepositoryGateway,
    owner: &str,
    repo: &str,
    selected: &[FileEntry],
) -> Vec<ContentResult> {
    let requests = selected
        .iter()
        .map(|file| fetch_content(gateway, owner, repo, file));

    stream::iter(requests)
        .buffered(selected.len().max(1))
        .collect()
        .await
}

async fn fetch_content(
    gateway: &dyn RepositoryGateway,
    owner: &str,
    repo: &str,
    file: &FileEntry,
) -> ContentResult {
    let size = format_file_size(file.size);

    match gateway.get_blob_content(owner, repo, &file.path, &file.sha).await {
        Ok(bytes) => ContentResult::Fetched {
            path: file.path.clone(),
            content: String::from_utf8_lossy(&bytes).into_owned(),
            language: language_for_path(&file.path).to_string(),
            size,
        },
        Err(e) => {
            warn!(path = %file.path, error = %e, "failed to fetch file content");
            ContentResult::Failed {
                path: file.path.clone(),
                error: format!("Failed to get file content: {}", e),
                size,
            }
        }
    }
}

fn summarize(owner: &str, repo: &str, meta: RepoMeta) -> RepositorySummary {
    RepositorySummary {
        full_name: format!("{}/{}", owner, repo),
        description: meta
            .description
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| "No description provided".to_string()),
        url: meta.html_url,
        stars: meta.stars,
        forks: meta.forks,
        default_branch: meta.default_branch,
        language: meta.language,
        avatar: meta.owner_avatar_url,
        name: meta.name,
    }
}

fn render_text(
    owner: &str,
    repo: &str,
    meta: &RepoMeta,
    filter: &FilterConfig,
    stats: &FileStats,
    files: &[ContentResult],
) -> String {
    let description = meta
        .description
        .as_deref()
        .filter(|d| !d.is_empty())
        .unwrap_or("No description");
    let excluding = if filter.exclude_patterns.is_empty() {
        "none".to_string()
    } else {
        filter.exclude_patterns.join(", ")
    };

    let mut digest = format!("# Repository Analysis for {}/{}\n\n", owner, repo);

    digest.push_str("## Repository Overview\n");
    digest.push_str(&format!("- Name: {}\n", meta.name));
    digest.push_str(&format!("- Description: {}\n", description));
    digest.push_str(&format!("- Stars: {}\n", meta.stars));
    digest.push_str(&format!("- Forks: {}\n", meta.forks));
    digest.push_str(&format!("- Default Branch: {}\n\n", meta.default_branch));

    digest.push_str("## File Structure\n");
    digest.push_str(&format!("Total files: {} (after filtering)\n", stats.total_count));
    if stats.truncated {
        digest.push_str("Note: the repository tree was truncated by GitHub; the file list is partial.\n");
    }
    digest.push('\n');

    digest.push_str(&format!(
        "## Files (Max {}KB, excluding: {})\n\n",
        filter.max_file_size_kb, excluding
    ));

    if stats.total_count == 0 {
        digest.push_str("No files match the current filters.\n\n");
        return digest;
    }

    digest.push_str(&format!("Showing content for first {} files:\n\n", files.len()));

    for file in files {
        digest.push_str(&format!("### {}\n", file.path()));
        match file {
            ContentResult::Fetched { content, .. } => {
                digest.push_str("```\n");
                digest.push_str(content);
                digest.push_str("\n```\n\n");
            }
            ContentResult::Failed { error, .. } => {
                digest.push_str(&format!("Error fetching content: {}\n\n", error));
            }
        }
    }

    digest
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::{TreeEntry, TreeListing};
    use async_trait::async_trait;
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;

    // In-memory stand-in for GitHub. Content is keyed by path.
    struct FakeGateway {
        meta: Option<RepoMeta>,
        tree_fails: bool,
        rate_limited: bool,
        truncated: bool,
        entries: Vec<TreeEntry>,
        contents: HashMap<String, String>,
        failing: HashSet<String>,
        rate_limit: Option<RateLimit>,
        requested: Mutex<Vec<String>>,
    }

    impl FakeGateway {
        fn new() -> Self {
            FakeGateway {
                meta: Some(RepoMeta {
                    name: "hello".to_string(),
                    description: Some("A test repository".to_string()),
                    stars: 42,
                    forks: 7,
                    default_branch: "main".to_string(),
                    html_url: "https://github.com/octo/hello".to_string(),
                    language: Some("JavaScript".to_string()),
                    owner_avatar_url: Some("https://avatars.example/octo".to_string()),
                }),
                tree_fails: false,
                rate_limited: false,
                truncated: false,
                entries: Vec::new(),
                contents: HashMap::new(),
                failing: HashSet::new(),
                rate_limit: Some(RateLimit {
                    limit: 60,
                    remaining: 55,
                    reset: 1_700_000_000,
                }),
                requested: Mutex::new(Vec::new()),
            }
        }

        fn with_file(mut self, path: &str, size: u64, content: &str) -> Self {
            self.entries.push(TreeEntry {
                path: path.to_string(),
                size: Some(size),
                sha: format!("sha-{}", path),
                kind: "blob".to_string(),
            });
            self.contents.insert(path.to_string(), content.to_string());
            self
        }

        fn with_dir(mut self, path: &str) -> Self {
            self.entries.push(TreeEntry {
                path: path.to_string(),
                size: None,
                sha: format!("tree-{}", path),
                kind: "tree".to_string(),
            });
            self
        }

        fn failing_on(mut self, path: &str) -> Self {
            self.failing.insert(path.to_string());
            self
        }

        fn requested(&self) -> Vec<String> {
            self.requested.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl RepositoryGateway for FakeGateway {
        async fn get_repository(&self, _owner: &str, _repo: &str) -> std::result::Result<RepoMeta, GatewayError> {
            self.meta.clone().ok_or(GatewayError::NotFound)
        }

        async fn get_tree(
            &self,
            _owner: &str,
            _repo: &str,
            branch: &str,
        ) -> std::result::Result<TreeListing, GatewayError> {
            assert_eq!(branch, "main");
            if self.rate_limited {
                return Err(GatewayError::RateLimited);
            }
            if self.tree_fails {
                return Err(GatewayError::Status(502));
            }
            Ok(TreeListing {
                truncated: self.truncated,
                entries: self.entries.clone(),
            })
        }

        async fn get_blob_content(
            &self,
            _owner: &str,
            _repo: &str,
            path: &str,
            _sha: &str,
        ) -> std::result::Result<Vec<u8>, GatewayError> {
            self.requested.lock().unwrap().push(path.to_string());
            if self.failing.contains(path) {
                return Err(GatewayError::Status(500));
            }
            self.contents
                .get(path)
                .map(|c| c.as_bytes().to_vec())
                .ok_or(GatewayError::NotFound)
        }

        async fn get_rate_limit(&self) -> std::result::Result<RateLimit, GatewayError> {
            self.rate_limit.ok_or(GatewayError::Timeout)
        }
    }

    fn request(patterns: &[&str], max_kb: u64, max_files: usize) -> AnalyzeRequest {
        AnalyzeRequest {
            owner: "octo".to_string(),
            repo: "hello".to_string(),
            filter: FilterConfig::new(patterns.iter().map(|p| p.to_string()).collect(), max_kb),
            max_files,
        }
    }

    fn sample_repo() -> FakeGateway {
        FakeGateway::new()
            .with_file("README.md", 1024, "# Hello")
            .with_file("big.bin", 200 * 1024, "binary")
            .with_dir("src")
            .with_file("src/index.js", 2048, "console.log('hi');")
    }

    #[tokio::test]
    async fn test_end_to_end_digest() {
        let gateway = sample_repo();
        let digest = analyze(&gateway, &request(&[], 50, 2)).await.unwrap();
        let structured = &digest.structured;

        // big.bin is over 50KB
        assert_eq!(structured.file_stats.total_count, 2);
        assert_eq!(structured.file_stats.total_size, "3.0 KB");
        assert_eq!(structured.file_stats.max_file_size, "50KB");
        assert_eq!(structured.file_stats.exclude_patterns, vec!["none"]);

        let paths: Vec<&str> = structured.files.iter().map(ContentResult::path).collect();
        assert_eq!(paths, vec!["README.md", "src/index.js"]);

        match &structured.files[0] {
            ContentResult::Fetched { content, language, size, .. } => {
                assert_eq!(content, "# Hello");
                assert_eq!(language, "markdown");
                assert_eq!(size, "1.0 KB");
            }
            other => panic!("README should be fetched: {:?}", other),
        }
        match &structured.files[1] {
            ContentResult::Fetched { content, language, .. } => {
                assert_eq!(content, "console.log('hi');");
                assert_eq!(language, "javascript");
            }
            other => panic!("index.js should be fetched: {:?}", other),
        }

        let tree = &structured.directory_structure;
        assert!(matches!(tree.get("README.md"), Some(TreeNode::File(_))));
        assert!(matches!(tree.get("src"), Some(TreeNode::Dir(_))));
        assert!(matches!(tree.get("src/index.js"), Some(TreeNode::File(_))));
        assert!(tree.get("big.bin").is_none());

        assert_eq!(digest.rate_limit.remaining, 55);
        assert_eq!(structured.repository.full_name, "octo/hello");
        assert_eq!(structured.repository.stars, 42);
    }

    #[tokio::test]
    async fn test_tree_holds_all_filtered_files_not_just_fetched() {
        let gateway = FakeGateway::new()
            .with_file("README.md", 10, "readme")
            .with_file("a.js", 10, "a")
            .with_file("lib/b.js", 10, "b")
            .with_file("lib/c/d.js", 10, "d");

        let digest = analyze(&gateway, &request(&[], 50, 1)).await.unwrap();

        assert_eq!(digest.structured.files.len(), 1);
        let leaves = digest.structured.directory_structure.files();
        assert_eq!(leaves.len(), 4);
        assert_eq!(gateway.requested(), vec!["README.md"]);
    }

    #[tokio::test]
    async fn test_per_file_failure_is_recorded_inline() {
        let gateway = sample_repo().failing_on("src/index.js");
        let digest = analyze(&gateway, &request(&[], 50, 2)).await.unwrap();
        let files = &digest.structured.files;

        assert!(files[0].is_fetched());
        match &files[1] {
            ContentResult::Failed { path, error, size } => {
                assert_eq!(path, "src/index.js");
                assert!(error.contains("HTTP 500"));
                assert_eq!(size, "2.0 KB");
            }
            other => panic!("expected a failure entry: {:?}", other),
        }

        assert!(digest.text.contains("### src/index.js\nError fetching content: "));
        assert!(digest.text.contains("### README.md\n```\n# Hello\n```\n"));
    }

    #[tokio::test]
    async fn test_not_found_returns_no_digest() {
        let mut gateway = sample_repo();
        gateway.meta = None;

        let err = analyze(&gateway, &request(&[], 50, 5)).await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err, DigestError::NotFound("octo/hello".to_string()));
        assert!(gateway.requested().is_empty());
    }

    #[tokio::test]
    async fn test_tree_failure_is_upstream_error() {
        let mut gateway = sample_repo();
        gateway.tree_fails = true;

        let err = analyze(&gateway, &request(&[], 50, 5)).await.unwrap_err();
        assert!(matches!(err, DigestError::Upstream { .. }));
        assert!(err.to_string().starts_with("Failed to get repository files"));
    }

    #[tokio::test]
    async fn test_exhausted_quota_is_reported_as_rate_limited() {
        let mut gateway = sample_repo();
        gateway.rate_limited = true;

        let err = analyze(&gateway, &request(&[], 50, 5)).await.unwrap_err();
        assert_eq!(err, DigestError::RateLimited);
        assert!(err.message().contains("rate limit exceeded"));
    }

    #[tokio::test]
    async fn test_zero_max_files_still_reports_filtered_files() {
        let gateway = FakeGateway::new().with_file("README.md", 10, "readme");
        let digest = analyze(&gateway, &request(&[], 50, 0)).await.unwrap();

        assert_eq!(digest.structured.file_stats.total_count, 1);
        assert!(digest.structured.files.is_empty());
        assert!(gateway.requested().is_empty());
        assert!(digest.text.contains("Total files: 1 (after filtering)"));
        assert!(digest.text.contains("Showing content for first 0 files:"));
        assert!(!digest.text.contains("No files match the current filters."));
    }

    #[tokio::test]
    async fn test_empty_owner_is_validation_error() {
        let gateway = sample_repo();
        let mut req = request(&[], 50, 5);
        req.owner = "  ".to_string();

        let err = analyze(&gateway, &req).await.unwrap_err();
        assert!(matches!(err, DigestError::Validation(_)));
    }

    #[tokio::test]
    async fn test_rate_limit_failure_falls_back() {
        let mut gateway = sample_repo();
        gateway.rate_limit = None;

        let digest = analyze(&gateway, &request(&[], 50, 5)).await.unwrap();
        assert_eq!(digest.rate_limit, RateLimit::fallback());
    }

    #[tokio::test]
    async fn test_truncated_tree_is_surfaced() {
        let mut gateway = sample_repo();
        gateway.truncated = true;

        let digest = analyze(&gateway, &request(&[], 50, 5)).await.unwrap();
        assert!(digest.structured.file_stats.truncated);
        assert!(digest.text.contains("truncated"));
    }

    #[tokio::test]
    async fn test_exclude_patterns_apply() {
        let gateway = sample_repo();
        let digest = analyze(&gateway, &request(&["*.md"], 50, 5)).await.unwrap();

        let paths: Vec<&str> = digest.structured.files.iter().map(ContentResult::path).collect();
        assert_eq!(paths, vec!["src/index.js"]);
        assert!(digest.text.contains("## Files (Max 50KB, excluding: *.md)"));
        assert_eq!(digest.structured.file_stats.exclude_patterns, vec!["*.md"]);
    }

    #[tokio::test]
    async fn test_no_files_left() {
        let gateway = sample_repo();
        let digest = analyze(&gateway, &request(&["*.md", "src/"], 50, 5)).await.unwrap();

        assert!(digest.structured.files.is_empty());
        assert!(digest.text.contains("No files match the current filters."));
    }

    #[tokio::test]
    async fn test_text_digest_header() {
        let gateway = sample_repo();
        let digest = analyze(&gateway, &request(&[], 50, 2)).await.unwrap();

        let expected_head = "\
# Repository Analysis for octo/hello

## Repository Overview
- Name: hello
- Description: A test repository
- Stars: 42
- Forks: 7
- Default Branch: main

## File Structure
Total files: 2 (after filtering)

## Files (Max 50KB, excluding: none)

Showing content for first 2 files:

";
        assert!(digest.text.starts_with(expected_head), "got:\n{}", digest.text);
    }

    #[tokio::test]
    async fn test_json_shape() {
        let gateway = sample_repo().failing_on("src/index.js");
        let digest = analyze(&gateway, &request(&[], 50, 2)).await.unwrap();
        let json = serde_json::to_value(&digest).unwrap();

        assert!(json["digest"].is_string());
        assert_eq!(json["rateLimit"]["limit"], 60);
        assert_eq!(json["structured"]["repository"]["fullName"], "octo/hello");
        assert_eq!(json["structured"]["fileStats"]["totalCount"], 2);
        assert_eq!(json["structured"]["directoryStructure"]["type"], "dir");

        let files = json["structured"]["files"].as_array().unwrap();
        assert_eq!(files[0]["language"], "markdown");
        assert!(files[0].get("error").is_none());
        assert!(files[1]["error"].is_string());
        assert!(files[1].get("content").is_none());
    }
}
