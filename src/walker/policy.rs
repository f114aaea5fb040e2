//! Per-entry traversal decisions
//!
//! Both walkers classify directory children through the same
//! [`TraversalPolicy`], so for a static tree they accept the same set of
//! paths regardless of scheduling.
//!
//! Each child carries two forms of its location: the `/`-joined relative
//! string used for filtering and output, and the filesystem path used to
//! open it. Names that are not valid UTF-8 only survive in the latter.

use crate::error::WalkWarning;
use crate::filter::{is_hidden, is_os_metadata, PathFilter, SEPARATOR};
use std::fs::{self, DirEntry};
use std::io;
use std::path::{Path, PathBuf};

/// What to do with a directory found during traversal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Expand it later
    Descend,
    /// Emit the directory itself as a result, do not expand
    Emit,
    /// Neither emit nor expand
    Skip,
}

/// A traversed entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Root-relative path, lossily decoded
    pub rel: String,

    /// Location on disk
    pub path: PathBuf,
}

impl Entry {
    pub fn new(rel: String, path: PathBuf) -> Self {
        Self { rel, path }
    }

    /// The root itself, with an empty relative path
    pub fn root(root: &Path) -> Self {
        Self::new(String::new(), root.to_path_buf())
    }
}

/// Children of one listed directory, classified
#[derive(Debug, Default)]
pub struct Expansion {
    /// Directories to expand
    pub subdirs: Vec<Entry>,

    /// Entries accepted as results
    pub emitted: Vec<Entry>,

    /// Directories skipped or pruned, including links to directories
    pub skipped: u64,

    /// Entries that could not be read; their siblings are kept
    pub warnings: Vec<WalkWarning>,
}

/// Kind of a listed entry, with symlinks resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Dir,
    /// Symlink whose target is a directory. Never followed or emitted.
    LinkedDir,
    File,
}

impl EntryKind {
    /// A dangling link counts as a file
    pub fn of(entry: &DirEntry) -> io::Result<Self> {
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            return Ok(Self::Dir);
        }
        if file_type.is_symlink() && fs::metadata(entry.path()).is_ok_and(|m| m.is_dir()) {
            return Ok(Self::LinkedDir);
        }
        Ok(Self::File)
    }
}

/// Filter policy applied while traversing
#[derive(Debug, Clone)]
pub struct TraversalPolicy {
    filter: Option<PathFilter>,
    skip_os_metadata: bool,
}

impl TraversalPolicy {
    pub fn new(filter: Option<PathFilter>, skip_os_metadata: bool) -> Self {
        Self {
            filter,
            skip_os_metadata,
        }
    }

    /// Policy that only drops hidden entries and OS metadata
    pub fn unfiltered() -> Self {
        Self::new(None, true)
    }

    pub fn filter(&self) -> Option<&PathFilter> {
        self.filter.as_ref()
    }

    pub fn is_filtered(&self) -> bool {
        self.filter.is_some()
    }

    /// Decide whether a non-directory entry is a result
    pub fn accepts_file(&self, rel: &str) -> bool {
        if self.is_ignored(rel) {
            return false;
        }

        match &self.filter {
            Some(filter) => filter.validate(rel),
            None => true,
        }
    }

    /// Decide what to do with the directory `rel`, found on disk at `path`
    pub fn directory(&self, path: &Path, rel: &str) -> Disposition {
        if self.is_ignored(rel) {
            return Disposition::Skip;
        }

        let Some(filter) = &self.filter else {
            return Disposition::Descend;
        };

        if filter.prunes(rel) {
            return Disposition::Skip;
        }

        // Children of a directory at the max level are all too deep
        if let Some(max) = filter.max_level() {
            if PathFilter::get_level(rel) >= max {
                if filter.non_empty_folders()
                    && filter.validate(rel)
                    && filter.validate_non_empty_folder(path, rel)
                {
                    return Disposition::Emit;
                }
                return Disposition::Skip;
            }
        }

        Disposition::Descend
    }

    /// List `dir` and classify its direct children
    pub fn expand(&self, dir: &Entry) -> io::Result<Expansion> {
        let mut expansion = Expansion::default();

        for entry in fs::read_dir(&dir.path)? {
            let entry = match entry {
                Ok(entry) => entry,
                Err(error) => {
                    expansion.warnings.push(WalkWarning::new(&dir.path, error));
                    continue;
                }
            };
            let kind = match EntryKind::of(&entry) {
                Ok(kind) => kind,
                Err(error) => {
                    expansion.warnings.push(WalkWarning::new(entry.path(), error));
                    continue;
                }
            };

            let child = Entry::new(
                join_relative(&dir.rel, &entry.file_name().to_string_lossy()),
                entry.path(),
            );

            match kind {
                EntryKind::Dir => match self.directory(&child.path, &child.rel) {
                    Disposition::Descend => expansion.subdirs.push(child),
                    Disposition::Emit => expansion.emitted.push(child),
                    Disposition::Skip => expansion.skipped += 1,
                },
                EntryKind::LinkedDir => expansion.skipped += 1,
                EntryKind::File if self.accepts_file(&child.rel) => expansion.emitted.push(child),
                EntryKind::File => {}
            }
        }

        Ok(expansion)
    }

    /// Hidden entries and, unless kept, OS metadata
    pub fn is_ignored(&self, rel: &str) -> bool {
        if is_hidden(rel) {
            return true;
        }
        self.skip_os_metadata && rel.rsplit(SEPARATOR).next().is_some_and(is_os_metadata)
    }
}

/// Append a child name to a root-relative path
pub fn join_relative(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        let mut path = String::with_capacity(parent.len() + 1 + name.len());
        path.push_str(parent);
        path.push(SEPARATOR);
        path.push_str(name);
        path
    }
}

/// Render an entry in its final form
pub fn materialize(entry: Entry, full_paths: bool) -> String {
    if full_paths {
        entry.path.to_string_lossy().into_owned()
    } else {
        entry.rel
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WalkConfig;
    use tempfile::tempdir;

    fn policy(config: WalkConfig) -> TraversalPolicy {
        TraversalPolicy::new(PathFilter::from_config(&config), config.skip_os_metadata)
    }

    #[test]
    fn test_join_relative() {
        assert_eq!(join_relative("", "a.txt"), "a.txt");
        assert_eq!(join_relative("sub", "b.txt"), "sub/b.txt");
    }

    #[test]
    fn test_materialize() {
        let entry = Entry::new("sub/b.txt".into(), PathBuf::from("/r/sub/b.txt"));
        assert_eq!(materialize(entry.clone(), false), "sub/b.txt");
        assert_eq!(materialize(entry, true), "/r/sub/b.txt");
    }

    #[test]
    fn test_unfiltered_drops_hidden_and_metadata() {
        let p = TraversalPolicy::unfiltered();
        assert!(p.accepts_file("a.txt"));
        assert!(!p.accepts_file("sub/.hidden"));
        assert!(!p.accepts_file("sub/Thumbs.db"));
        assert_eq!(p.directory(Path::new("/r"), ".cache"), Disposition::Skip);
        assert_eq!(p.directory(Path::new("/r"), "sub"), Disposition::Descend);
    }

    #[test]
    fn test_keep_os_metadata() {
        let p = TraversalPolicy::new(None, false);
        assert!(p.accepts_file("Thumbs.db"));
        // Hidden entries stay excluded regardless
        assert!(!p.accepts_file(".DS_Store"));
    }

    #[test]
    fn test_directory_at_max_level_is_not_descended() {
        let p = policy(WalkConfig {
            max_level: Some(2),
            ..WalkConfig::default()
        });
        let root = Path::new("/r");
        assert_eq!(p.directory(root, "a"), Disposition::Descend);
        assert_eq!(p.directory(root, "a/b"), Disposition::Skip);
    }

    #[test]
    fn test_expand_classifies_children() {
        let root = tempdir().unwrap();
        fs::create_dir_all(root.path().join("top/full")).unwrap();
        fs::write(root.path().join("top/full/x.txt"), b"x").unwrap();
        fs::create_dir_all(root.path().join("top/dirs_only/inner")).unwrap();
        fs::create_dir_all(root.path().join("top/.git")).unwrap();
        fs::write(root.path().join("top/readme.md"), b"r").unwrap();

        let p = policy(WalkConfig {
            max_level: Some(2),
            non_empty_folders: true,
            ..WalkConfig::default()
        });

        let top = Entry::new("top".into(), root.path().join("top"));
        let expansion = p.expand(&top).unwrap();
        let mut emitted: Vec<_> = expansion.emitted.into_iter().map(|e| e.rel).collect();
        emitted.sort();

        assert!(expansion.subdirs.is_empty());
        assert_eq!(emitted, vec!["top/full".to_string(), "top/readme.md".to_string()]);
        assert_eq!(expansion.skipped, 2);
        assert!(expansion.warnings.is_empty());
    }

    #[test]
    fn test_expand_missing_directory_fails() {
        let root = tempdir().unwrap();
        let p = TraversalPolicy::unfiltered();
        let missing = Entry::new("missing".into(), root.path().join("missing"));
        assert!(p.expand(&missing).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_expand_keeps_disk_path_of_non_utf8_name() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let root = tempdir().unwrap();
        let bad = root.path().join(OsStr::from_bytes(b"bad\xff"));
        fs::create_dir(&bad).unwrap();
        fs::write(bad.join("x.txt"), b"x").unwrap();

        let p = TraversalPolicy::unfiltered();
        let expansion = p.expand(&Entry::root(root.path())).unwrap();
        assert_eq!(expansion.subdirs.len(), 1);
        assert_eq!(expansion.subdirs[0].path, bad);
        assert_eq!(expansion.subdirs[0].rel, "bad\u{fffd}");

        let inner = p.expand(&expansion.subdirs[0]).unwrap();
        assert_eq!(inner.emitted.len(), 1);
        assert_eq!(inner.emitted[0].rel, "bad\u{fffd}/x.txt");
        assert_eq!(inner.emitted[0].path, bad.join("x.txt"));
    }

    #[cfg(unix)]
    #[test]
    fn test_expand_skips_links_to_directories() {
        let root = tempdir().unwrap();
        fs::create_dir(root.path().join("real")).unwrap();
        fs::write(root.path().join("real/f.txt"), b"f").unwrap();
        fs::write(root.path().join("plain.txt"), b"p").unwrap();
        std::os::unix::fs::symlink(root.path().join("real"), root.path().join("link")).unwrap();
        std::os::unix::fs::symlink(root.path().join("plain.txt"), root.path().join("alias.txt"))
            .unwrap();
        std::os::unix::fs::symlink(root.path().join("gone"), root.path().join("dangling")).unwrap();

        let p = TraversalPolicy::unfiltered();
        let expansion = p.expand(&Entry::root(root.path())).unwrap();

        let subdirs: Vec<_> = expansion.subdirs.iter().map(|e| e.rel.as_str()).collect();
        let mut emitted: Vec<_> = expansion.emitted.iter().map(|e| e.rel.as_str()).collect();
        emitted.sort();

        assert_eq!(subdirs, vec!["real"]);
        assert_eq!(emitted, vec!["alias.txt", "dangling", "plain.txt"]);
        assert_eq!(expansion.skipped, 1);
    }
}
