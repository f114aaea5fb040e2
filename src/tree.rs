//! Nested directory tree of a root
//!
//! The tree maps each directory name to its children; files map to
//! [`TreeNode::File`]. The single top-level key is the root's own name, so
//! level 0 of a [`TreeBranch`] list applies to the root itself.

use crate::error::{Result, WalkWarning, WalkerError};
use crate::filter::is_hidden;
use crate::walker::policy::EntryKind;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Folder names allowed or rejected at one level of the tree
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TreeBranch {
    /// Folder name must be one of these (when non-empty)
    pub include: Vec<String>,

    /// Folder name must not be one of these
    pub exclude: Vec<String>,
}

impl TreeBranch {
    /// Exact, case-sensitive name match
    pub fn accepts(&self, name: &str) -> bool {
        if self.exclude.iter().any(|ex| ex == name) {
            return false;
        }
        self.include.is_empty() || self.include.iter().any(|inc| inc == name)
    }
}

/// A node of the tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum TreeNode {
    /// Directory with its children by name
    Dir(BTreeMap<String, TreeNode>),
    /// Any non-directory entry; serialized as `null`
    File,
}

impl TreeNode {
    pub fn is_dir(&self) -> bool {
        matches!(self, TreeNode::Dir(_))
    }

    /// Children of a directory node
    pub fn children(&self) -> Option<&BTreeMap<String, TreeNode>> {
        match self {
            TreeNode::Dir(children) => Some(children),
            TreeNode::File => None,
        }
    }
}

/// Directory tree rooted at one directory
#[derive(Debug, Clone, Serialize)]
pub struct DirTree {
    #[serde(skip)]
    root: PathBuf,

    #[serde(flatten)]
    tree: BTreeMap<String, TreeNode>,

    #[serde(skip)]
    warnings: Vec<WalkWarning>,
}

impl DirTree {
    /// Build the tree of `root`.
    ///
    /// With `branches`, a directory whose name at level `i` is rejected by
    /// `branches[i]` is left out with everything below it. Levels past the
    /// end of the list are unconstrained.
    pub fn build(root: impl AsRef<Path>, branches: Option<&[TreeBranch]>) -> Result<Self> {
        let root = std::path::absolute(root.as_ref()).map_err(|_| WalkerError::RootNotFound {
            path: root.as_ref().to_path_buf(),
        })?;

        match fs::metadata(&root) {
            Ok(metadata) if metadata.is_dir() => {}
            Ok(_) => return Err(WalkerError::RootNotFound { path: root }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(WalkerError::RootNotFound { path: root })
            }
            Err(source) => return Err(WalkerError::RootNotReadable { path: root, source }),
        }

        let name = root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| root.display().to_string());

        let mut builder = TreeBuilder {
            branches: branches.unwrap_or(&[]),
            warnings: Vec::new(),
        };

        let mut tree = BTreeMap::new();
        let mut levels = vec![name.clone()];
        if builder.accepts(&levels) {
            let children = fs::read_dir(&root)
                .map_err(|source| WalkerError::RootNotReadable {
                    path: root.clone(),
                    source,
                })
                .map(|entries| builder.children(&root, entries, &mut levels))?;
            tree.insert(name, TreeNode::Dir(children));
        }

        debug!(root = %root.display(), warnings = builder.warnings.len(), "Tree built");

        Ok(Self {
            root,
            tree,
            warnings: builder.warnings,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Top-level map, keyed by the root's name
    pub fn as_map(&self) -> &BTreeMap<String, TreeNode> {
        &self.tree
    }

    /// Directories that could not be listed
    pub fn warnings(&self) -> &[WalkWarning] {
        &self.warnings
    }

    /// Look up a node by its names from the root name down
    pub fn get(&self, names: &[&str]) -> Option<&TreeNode> {
        let (first, rest) = names.split_first()?;
        rest.iter()
            .try_fold(self.tree.get(*first)?, |node, name| node.children()?.get(*name))
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Indented listing, directories suffixed with `/`
    pub fn render(&self) -> String {
        let mut out = String::new();
        render_level(&self.tree, 0, &mut out);
        out
    }
}

struct TreeBuilder<'a> {
    branches: &'a [TreeBranch],
    warnings: Vec<WalkWarning>,
}

impl TreeBuilder<'_> {
    fn accepts(&self, levels: &[String]) -> bool {
        levels
            .iter()
            .zip(self.branches)
            .all(|(name, branch)| branch.accepts(name))
    }

    fn children(
        &mut self,
        dir: &Path,
        entries: fs::ReadDir,
        levels: &mut Vec<String>,
    ) -> BTreeMap<String, TreeNode> {
        let mut children = BTreeMap::new();

        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    self.warn(dir, e);
                    continue;
                }
            };

            let name = entry.file_name().to_string_lossy().into_owned();
            if is_hidden(&name) {
                continue;
            }

            match EntryKind::of(&entry) {
                Ok(EntryKind::Dir) => {}
                Ok(EntryKind::LinkedDir) => continue,
                Ok(EntryKind::File) => {
                    children.insert(name, TreeNode::File);
                    continue;
                }
                Err(e) => {
                    self.warn(&entry.path(), e);
                    continue;
                }
            }

            levels.push(name);
            if self.accepts(levels) {
                let path = entry.path();
                match fs::read_dir(&path) {
                    Ok(entries) => {
                        let node = TreeNode::Dir(self.children(&path, entries, levels));
                        children.insert(levels[levels.len() - 1].clone(), node);
                    }
                    Err(e) => self.warn(&path, e),
                }
            }
            levels.pop();
        }

        children
    }

    fn warn(&mut self, path: &Path, error: io::Error) {
        warn!(path = %path.display(), error = %error, "Directory listing failed");
        self.warnings.push(WalkWarning::new(path, error));
    }
}

fn render_level(nodes: &BTreeMap<String, TreeNode>, depth: usize, out: &mut String) {
    for (name, node) in nodes {
        let indent = "  ".repeat(depth);
        match node {
            TreeNode::Dir(children) => {
                let _ = writeln!(out, "{indent}{name}/");
                render_level(children, depth + 1, out);
            }
            TreeNode::File => {
                let _ = writeln!(out, "{indent}{name}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn create_tree(root: &Path) {
        fs::write(root.join("a.txt"), b"a").unwrap();
        fs::create_dir_all(root.join("docs/2007")).unwrap();
        fs::write(root.join("docs/2007/plan.pdf"), b"p").unwrap();
        fs::create_dir_all(root.join("tmp")).unwrap();
        fs::write(root.join("tmp/scratch"), b"s").unwrap();
        fs::create_dir_all(root.join(".git")).unwrap();
    }

    fn root_name(root: &Path) -> String {
        root.file_name().unwrap().to_string_lossy().into_owned()
    }

    #[test]
    fn test_branch_accepts() {
        let branch = TreeBranch {
            include: vec!["docs".into()],
            exclude: vec![],
        };
        assert!(branch.accepts("docs"));
        assert!(!branch.accepts("documents"));
        assert!(TreeBranch::default().accepts("anything"));
    }

    #[test]
    fn test_build_unfiltered() {
        let dir = tempdir().unwrap();
        create_tree(dir.path());
        let name = root_name(dir.path());
        let name = name.as_str();

        let tree = DirTree::build(dir.path(), None).unwrap();
        assert_eq!(tree.as_map().len(), 1);
        assert_eq!(tree.get(&[name, "a.txt"]), Some(&TreeNode::File));
        assert_eq!(tree.get(&[name, "docs", "2007", "plan.pdf"]), Some(&TreeNode::File));
        assert!(tree.get(&[name, "tmp"]).unwrap().is_dir());
        assert!(tree.get(&[name, ".git"]).is_none());
        assert!(tree.warnings().is_empty());
    }

    #[test]
    fn test_build_with_branches() {
        let dir = tempdir().unwrap();
        create_tree(dir.path());
        let name = root_name(dir.path());
        let name = name.as_str();

        let branches = vec![
            TreeBranch::default(),
            TreeBranch {
                include: vec![],
                exclude: vec!["tmp".into()],
            },
        ];
        let tree = DirTree::build(dir.path(), Some(&branches)).unwrap();

        assert!(tree.get(&[name, "tmp"]).is_none());
        assert!(tree.get(&[name, "docs", "2007"]).is_some());
        // Files are not subject to folder filters
        assert!(tree.get(&[name, "a.txt"]).is_some());
    }

    #[test]
    fn test_render_and_json() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub/b.txt"), b"b").unwrap();
        let name = root_name(dir.path());
        let name = name.as_str();

        let tree = DirTree::build(dir.path(), None).unwrap();
        assert_eq!(tree.render(), format!("{name}/\n  sub/\n    b.txt\n"));

        let json: serde_json::Value = serde_json::from_str(&tree.to_json().unwrap()).unwrap();
        assert_eq!(json, serde_json::json!({ name: { "sub": { "b.txt": null } } }));
    }

    #[cfg(unix)]
    #[test]
    fn test_linked_directory_left_out() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub/b.txt"), b"b").unwrap();
        std::os::unix::fs::symlink(dir.path().join("sub"), dir.path().join("link")).unwrap();
        let name = root_name(dir.path());
        let name = name.as_str();

        let tree = DirTree::build(dir.path(), None).unwrap();
        assert!(tree.get(&[name, "sub", "b.txt"]).is_some());
        assert!(tree.get(&[name, "link"]).is_none());
    }

    #[test]
    fn test_missing_root() {
        let dir = tempdir().unwrap();
        let err = DirTree::build(dir.path().join("missing"), None).unwrap_err();
        assert!(matches!(err, WalkerError::RootNotFound { .. }));
    }
}
