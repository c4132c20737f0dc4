// src/digest/tree.rs
// =============================================================================
// Folds a flat list of file paths into a nested directory tree.
//
// "a/b/x.js", "a/b/y.js", "a/c.js" becomes:
//
//   (root)
//   └── a/
//       ├── b/
//       │   ├── x.js
//       │   └── y.js
//       └── c.js
//
// Directories are created the first time a path passes through them and
// are shared by every later path with the same prefix.
//
// Rust concepts:
// - Recursive enums: a directory owns its children, which are TreeNodes too
// - BTreeMap: keeps children sorted by name, so JSON output is deterministic
// =============================================================================

use serde::Serialize;
use std::collections::BTreeMap;

use super::entry::FileEntry;

// Serialized as {"type": "dir", "name", "children"} or
// {"type": "file", "name", "size", "path", "sha"}
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TreeNode {
    Dir(DirNode),
    File(FileNode),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirNode {
    pub name: String,
    pub children: BTreeMap<String, TreeNode>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileNode {
    pub name: String,
    pub size: u64,
    pub path: String,
    pub sha: String,
}

impl DirNode {
    fn new(name: &str) -> Self {
        DirNode {
            name: name.to_string(),
            children: BTreeMap::new(),
        }
    }

    fn insert(&mut self, segments: &[&str], file: &FileEntry) {
        match segments {
            [] => {}
            [leaf] => {
                self.children.insert(
                    leaf.to_string(),
                    TreeNode::File(FileNode {
                        name: leaf.to_string(),
                        size: file.size,
                        path: file.path.clone(),
                        sha: file.sha.clone(),
                    }),
                );
            }
            [dir, rest @ ..] => {
                let child = self
                    .children
                    .entry(dir.to_string())
                    .or_insert_with(|| TreeNode::Dir(DirNode::new(dir)));

                // Git never lists "a" as a file and "a/b" in the same tree;
                // if it happens the directory wins.
                if let TreeNode::File(_) = child {
                    *child = TreeNode::Dir(DirNode::new(dir));
                }

                if let TreeNode::Dir(sub) = child {
                    sub.insert(rest, file);
                }
            }
        }
    }
}

pub fn build_tree(files: &[FileEntry]) -> TreeNode {
    let mut root = DirNode::new("");
    for file in files {
        let segments: Vec<&str> = file.path.split('/').collect();
        root.insert(&segments, file);
    }
    TreeNode::Dir(root)
}

impl TreeNode {
    pub fn name(&self) -> &str {
        match self {
            TreeNode::Dir(d) => &d.name,
            TreeNode::File(f) => &f.name,
        }
    }

    pub fn is_dir(&self) -> bool {
        matches!(self, TreeNode::Dir(_))
    }

    /// Every file node below this one, depth first
    pub fn files(&self) -> Vec<&FileNode> {
        let mut out = Vec::new();
        self.collect_files(&mut out);
        out
    }

    fn collect_files<'a>(&'a self, out: &mut Vec<&'a FileNode>) {
        match self {
            TreeNode::File(f) => out.push(f),
            TreeNode::Dir(d) => {
                for child in d.children.values() {
                    child.collect_files(out);
                }
            }
        }
    }

    /// Looks a node up by its slash separated path ("a/b/x.js")
    #[cfg(test)]
    pub fn get(&self, path: &str) -> Option<&TreeNode> {
        let mut current = self;
        for segment in path.split('/') {
            match current {
                TreeNode::Dir(d) => current = d.children.get(segment)?,
                TreeNode::File(_) => return None,
            }
        }
        Some(current)
    }

    /// Text rendering for the terminal: directories first, then files,
    /// each group sorted by name.
    pub fn render(&self) -> String {
        let mut out = String::new();
        match self {
            TreeNode::Dir(d) => {
                let label = if d.name.is_empty() { "." } else { d.name.as_str() };
                out.push_str(label);
                out.push('\n');
                render_children(d, "", &mut out);
            }
            TreeNode::File(f) => {
                out.push_str(&f.name);
                out.push('\n');
            }
        }
        out
    }
}

fn sorted_children(dir: &DirNode) -> Vec<&TreeNode> {
    let mut children: Vec<&TreeNode> = dir.children.values().collect();
    children.sort_by(|a, b| b.is_dir().cmp(&a.is_dir()).then_with(|| a.name().cmp(b.name())));
    children
}

fn render_children(dir: &DirNode, prefix: &str, out: &mut String) {
    let children = sorted_children(dir);
    let count = children.len();

    for (i, child) in children.into_iter().enumerate() {
        let last = i + 1 == count;
        let branch = if last { "└── " } else { "├── " };

        out.push_str(prefix);
        out.push_str(branch);
        out.push_str(child.name());

        match child {
            TreeNode::Dir(sub) => {
                out.push_str("/\n");
                let next_prefix = format!("{}{}", prefix, if last { "    " } else { "│   " });
                render_children(sub, &next_prefix, out);
            }
            TreeNode::File(_) => out.push('\n'),
        }
    }
}

// -----------------------------------------------------------------------------
// NOTES:
//
// 1. Why is insert() recursive instead of a loop with a `current` pointer?
//    - A loop would need to hold `&mut` to a child while also looking it up
//      in its parent, which the borrow checker rejects
//    - Recursion hands each level its own `&mut DirNode`, one at a time
//
// 2. What is `[dir, rest @ ..]`?
//    - A slice pattern: `dir` is the first element, `rest` is everything else
// -----------------------------------------------------------------------------
