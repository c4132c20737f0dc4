// src/github/repo_url.rs
// =============================================================================
// Turns whatever the user pasted into an (owner, repo) pair.
//
// Supported formats:
//   - https://github.com/owner/repo
//   - https://github.com/owner/repo.git
//   - https://github.com/owner/repo/tree/main/src   (extra segments ignored)
//   - github.com/owner/repo
//   - https://gitingest.com/owner/repo               (rewritten to github.com)
// =============================================================================

use anyhow::{anyhow, Result};

// Example:
//   "https://github.com/rust-lang/rust" -> ("rust-lang", "rust")
pub fn parse_repo_url(url: &str) -> Result<(String, String)> {
    let url = url.trim().replacen("gitingest.com", "github.com", 1);

    // Remove common prefixes
    let url = url
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .trim_start_matches("www.");

    if !url.starts_with("github.com/") {
        return Err(anyhow!("Not a GitHub URL: {}", url));
    }

    // Drop any query string or fragment (?tab=readme-ov-file, #usage)
    let path = url.trim_start_matches("github.com/");
    let path = path.split(['?', '#']).next().unwrap_or_default();

    let parts: Vec<&str> = path.split('/').collect();

    if parts.len() < 2 || parts[0].is_empty() || parts[1].is_empty() {
        return Err(anyhow!(
            "Invalid GitHub repository URL. Format should be: https://github.com/username/repository"
        ));
    }

    let owner = parts[0].to_string();
    let repo = parts[1].strip_suffix(".git").unwrap_or(parts[1]).to_string();

    if repo.is_empty() {
        return Err(anyhow!("Invalid GitHub repository URL: {}", url));
    }

    Ok((owner, repo))
}
