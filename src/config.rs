// src/config.rs
// =============================================================================
// Runtime configuration: how we talk to GitHub and how much we fetch.
//
// Two access profiles exist:
// - direct:  looks files up by path through the contents endpoint and only
//            fetches 3 files, to stay inside the unauthenticated rate limit
// - backend: looks files up by blob sha and fetches 5 files
//
// Both profiles share the same gateway code; only these settings differ.
// =============================================================================

use clap::ValueEnum;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const DEFAULT_MAX_FILE_SIZE_KB: u64 = 50;
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AccessMode {
    /// Contents endpoint by path, 3 files
    Direct,
    /// Git blobs endpoint by sha, 5 files
    Backend,
}

impl AccessMode {
    pub fn content_lookup(self) -> ContentLookup {
        match self {
            AccessMode::Direct => ContentLookup::ByPath,
            AccessMode::Backend => ContentLookup::BySha,
        }
    }

    pub fn default_max_files(self) -> usize {
        match self {
            AccessMode::Direct => 3,
            AccessMode::Backend => 5,
        }
    }
}

/// Which GitHub endpoint serves file content
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentLookup {
    /// GET /repos/{owner}/{repo}/contents/{path}
    ByPath,
    /// GET /repos/{owner}/{repo}/git/blobs/{sha}
    BySha,
}

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub api_url: String,
    pub lookup: ContentLookup,
    /// Applied to every single upstream request
    pub timeout: Duration,
}

impl GatewayConfig {
    pub fn new(mode: AccessMode, api_url: &str, timeout_secs: u64) -> Self {
        GatewayConfig {
            api_url: api_url.to_string(),
            lookup: mode.content_lookup(),
            timeout: Duration::from_secs(timeout_secs),
        }
    }
}
