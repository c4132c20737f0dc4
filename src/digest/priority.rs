// src/digest/priority.rs
// =============================================================================
// Orders files so the ones most likely to explain a repository come first.
//
// A file is "high priority" when its lower-cased path:
//   - contains "readme.md" anywhere
//   - ends with index.{html,js,ts,jsx,tsx}
//   - ends with package.json
//   - ends with main.{js,ts,py,go,java}
//   - ends with app.{js,ts,py,go,java,jsx,tsx}
//
// Sort key: high priority first, then shorter paths first. The sort is
// stable, so equal keys keep their original relative order.
// =============================================================================

use super::entry::FileEntry;

// (file stem, allowed extensions); each must sit at the very end of the path
const PRIORITY_SUFFIXES: &[(&str, &[&str])] = &[
    ("index", &["html", "js", "ts", "jsx", "tsx"]),
    ("package", &["json"]),
    ("main", &["js", "ts", "py", "go", "java"]),
    ("app", &["js", "ts", "py", "go", "java", "jsx", "tsx"]),
];

pub fn is_high_priority(path: &str) -> bool {
    let path = path.to_lowercase();

    if path.contains("readme.md") {
        return true;
    }

    PRIORITY_SUFFIXES.iter().any(|(stem, extensions)| {
        extensions
            .iter()
            .any(|ext| path.ends_with(&format!("{}.{}", stem, ext)))
    })
}

/// Returns a new, reordered list; the input is left untouched
pub fn prioritize(files: &[FileEntry]) -> Vec<FileEntry> {
    let mut sorted = files.to_vec();
    // sort_by_cached_key is stable and computes each key once.
    // Length is counted in UTF-16 units, the way browsers measure paths.
    sorted.sort_by_cached_key(|f| (!is_high_priority(&f.path), f.path.encode_utf16().count()));
    sorted
}
