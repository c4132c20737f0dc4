// src/digest/patterns.rs
// =============================================================================
// Decides which files are dropped before the digest is built.
//
// Two independent checks, a file survives only if it passes both:
//
// 1. Size: excluded when size_in_bytes / 1024 > max_file_size_kb.
//    A file of exactly max_file_size_kb * 1024 bytes is still included.
//
// 2. Exclude patterns, first match wins:
//    - "*.ext"  extension glob:  path ends with ".ext"
//    - "dir/"   directory glob:  path starts with "dir/" or contains "/dir/"
//    - other    exact/substring: path == pattern or path contains "/pattern"
//
// The substring checks are anchored on a preceding '/', so "test" excludes
// "foo/test" and "foo/test/bar.js" but not "foo/mytest". There is no "**",
// no negation and no normalization of the pattern.
// =============================================================================

use super::entry::FileEntry;

/// Per-request filter settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterConfig {
    pub exclude_patterns: Vec<String>,
    pub max_file_size_kb: u64,
}

impl FilterConfig {
    pub fn new(exclude_patterns: Vec<String>, max_file_size_kb: u64) -> Self {
        FilterConfig {
            exclude_patterns,
            max_file_size_kb,
        }
    }
}

pub fn is_excluded<S: AsRef<str>>(path: &str, patterns: &[S]) -> bool {
    patterns.iter().any(|p| matches_pattern(path, p.as_ref()))
}

fn matches_pattern(path: &str, pattern: &str) -> bool {
    if let Some(extension) = pattern.strip_prefix("*.") {
        path.ends_with(&format!(".{}", extension))
    } else if pattern.ends_with('/') {
        path.starts_with(pattern) || path.contains(&format!("/{}", pattern))
    } else {
        path == pattern || path.contains(&format!("/{}", pattern))
    }
}

pub fn exceeds_size(size_bytes: u64, max_file_size_kb: u64) -> bool {
    // Real division: 51201 bytes is 50.0009 KB and must count as too big
    size_bytes as f64 / 1024.0 > max_file_size_kb as f64
}

/// Keeps the input order
pub fn filter_files(files: Vec<FileEntry>, config: &FilterConfig) -> Vec<FileEntry> {
    files
        .into_iter()
        .filter(|f| !exceeds_size(f.size, config.max_file_size_kb))
        .filter(|f| !is_excluded(&f.path, &config.exclude_patterns))
        .collect()
}

/// Splits the comma separated form used on the command line:
/// "node_modules/, *.lock ,, dist/" -> ["node_modules/", "*.lock", "dist/"]
pub fn parse_exclude_patterns(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(String::from)
        .collect()
}
