// src/digest/mod.rs
// =============================================================================
// This module turns a repository into a digest.
//
// Submodules:
// - entry:    FileEntry, one blob of the repository tree
// - patterns: size filter and exclude patterns
// - priority: puts README/entry-point files first
// - tree:     builds the nested directory structure
// - language: syntax language and size labels for fetched files
// - assemble: the analyze() pipeline that ties it all together
// =============================================================================

mod assemble;
mod entry;
mod language;
mod patterns;
mod priority;
mod tree;

pub use assemble::{analyze, AnalyzeRequest, ContentResult};
pub use patterns::{parse_exclude_patterns, FilterConfig};
