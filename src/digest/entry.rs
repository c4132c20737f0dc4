// src/digest/entry.rs
// A file the digest pipeline works with: one blob of the repository tree.

use serde::Serialize;

use crate::github::TreeEntry;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileEntry {
    /// Unique within one tree snapshot
    pub path: String,
    /// Bytes
    pub size: u64,
    pub sha: String,
}

impl FileEntry {
    pub fn new(path: impl Into<String>, size: u64, sha: impl Into<String>) -> Self {
        FileEntry {
            path: path.into(),
            size,
            sha: sha.into(),
        }
    }

    /// Keeps blobs only; trees and submodule commits yield None
    pub fn from_tree_entry(entry: TreeEntry) -> Option<Self> {
        if !entry.is_blob() {
            return None;
        }
        Some(FileEntry::new(entry.path, entry.size.unwrap_or(0), entry.sha))
    }
}
