//! Path filtering
//!
//! A [`PathFilter`] decides whether a root-relative path is accepted. Paths
//! are `/`-separated and relative to the root they were found under; the
//! level of a path is its segment count, so a file directly inside a root is
//! at level 1.
//!
//! Checks, all conjunctive:
//! - hidden basename (starts with `.`)
//! - level bounds (`min_level..=max_level`)
//! - per-level include/exclude substrings, tested against one segment
//! - global exclude / include substrings, tested against the whole path
//!
//! Substring comparisons are case-insensitive.

use crate::config::WalkConfig;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Separator used in root-relative paths
pub const SEPARATOR: char = '/';

/// Names of OS metadata artifacts skipped by default
const OS_METADATA_NAMES: &[&str] = &[
    ".ds_store",
    "thumbs.db",
    "desktop.ini",
    "__macosx",
    "$recycle.bin",
    "system volume information",
];

/// Include/exclude substrings applied to a single path segment
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LevelFilter {
    /// Segment must contain at least one of these (when non-empty)
    pub include: Vec<String>,

    /// Segment must contain none of these
    pub exclude: Vec<String>,
}

impl LevelFilter {
    pub fn new<I, E, S, T>(include: I, exclude: E) -> Self
    where
        I: IntoIterator<Item = S>,
        E: IntoIterator<Item = T>,
        S: Into<String>,
        T: Into<String>,
    {
        Self {
            include: include.into_iter().map(Into::into).collect(),
            exclude: exclude.into_iter().map(Into::into).collect(),
        }
    }

    /// Level filter with only include substrings
    pub fn including<I, S>(include: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(include, std::iter::empty::<String>())
    }

    /// Level filter with only exclude substrings
    pub fn excluding<E, T>(exclude: E) -> Self
    where
        E: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self::new(std::iter::empty::<String>(), exclude)
    }

    fn lowercased(&self) -> Self {
        Self {
            include: lowercase_all(&self.include),
            exclude: lowercase_all(&self.exclude),
        }
    }

    /// `segment` must already be lowercase
    fn accepts(&self, segment: &str) -> bool {
        if self.exclude.iter().any(|ex| segment.contains(ex.as_str())) {
            return false;
        }
        self.include.is_empty() || self.include.iter().any(|inc| segment.contains(inc.as_str()))
    }
}

/// Stateless predicate over root-relative paths
#[derive(Debug, Clone)]
pub struct PathFilter {
    include: Vec<String>,
    exclude: Vec<String>,
    min_level: usize,
    max_level: Option<usize>,
    level_filters: BTreeMap<usize, LevelFilter>,
    non_empty_folders: bool,
}

impl PathFilter {
    /// Build a filter from the configuration.
    ///
    /// Returns `None` when every filter option is at its default, in which
    /// case walkers run unfiltered.
    pub fn from_config(config: &WalkConfig) -> Option<Self> {
        if !config.has_filters() {
            return None;
        }

        Some(Self {
            include: lowercase_all(&config.include),
            exclude: lowercase_all(&config.exclude),
            min_level: config.min_level,
            max_level: config.max_level,
            level_filters: config
                .level_filters
                .iter()
                .map(|(level, filter)| (*level, filter.lowercased()))
                .collect(),
            non_empty_folders: config.non_empty_folders,
        })
    }

    /// Number of segments in a root-relative path
    pub fn get_level(path: &str) -> usize {
        path.split(SEPARATOR).count()
    }

    pub fn min_level(&self) -> usize {
        self.min_level
    }

    pub fn max_level(&self) -> Option<usize> {
        self.max_level
    }

    pub fn non_empty_folders(&self) -> bool {
        self.non_empty_folders
    }

    /// Check that the path level lies within the configured bounds
    pub fn check_level(&self, path: &str) -> bool {
        let level = Self::get_level(path);
        self.min_level <= level && self.max_level.map_or(true, |max| level <= max)
    }

    /// True when the path sits exactly at the max level
    pub fn is_max_level(&self, path: &str) -> bool {
        self.max_level == Some(Self::get_level(path))
    }

    /// Run the path against every check; true if all pass
    pub fn validate(&self, path: &str) -> bool {
        if is_hidden(path) {
            return false;
        }

        if !self.check_level(path) {
            return false;
        }

        let lower = path.to_lowercase();

        if !self.check_level_filters(&lower) {
            return false;
        }

        if self.is_excluded(&lower) {
            return false;
        }

        if !self.include.is_empty() && !self.include.iter().any(|inc| lower.contains(inc.as_str())) {
            return false;
        }

        true
    }

    /// True when nothing below this directory can ever be accepted.
    ///
    /// Only checks that carry over to descendants are used: a descendant has
    /// the same leading segments and contains the directory path as a
    /// substring. Min level and global includes never prune.
    pub fn prunes(&self, dir: &str) -> bool {
        if is_hidden(dir) {
            return true;
        }

        if self.max_level.is_some_and(|max| Self::get_level(dir) > max) {
            return true;
        }

        let lower = dir.to_lowercase();
        !self.check_level_filters(&lower) || self.is_excluded(&lower)
    }

    /// True iff `rel` is at the max level and the directory at `dir` is
    /// readable and has at least one direct regular file.
    pub fn validate_non_empty_folder(&self, dir: &Path, rel: &str) -> bool {
        if !self.is_max_level(rel) {
            return false;
        }

        match fs::read_dir(dir) {
            Ok(entries) => entries
                .filter_map(|entry| entry.ok())
                .any(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false)),
            Err(_) => false,
        }
    }

    /// `lower` must already be lowercase
    fn check_level_filters(&self, lower: &str) -> bool {
        if self.level_filters.is_empty() {
            return true;
        }

        lower
            .split(SEPARATOR)
            .enumerate()
            .all(|(index, segment)| {
                self.level_filters
                    .get(&index)
                    .map_or(true, |filter| filter.accepts(segment))
            })
    }

    fn is_excluded(&self, lower: &str) -> bool {
        self.exclude.iter().any(|ex| lower.contains(ex.as_str()))
    }
}

/// Basename of a root-relative path starts with `.`
pub fn is_hidden(path: &str) -> bool {
    path.rsplit(SEPARATOR)
        .next()
        .is_some_and(|name| name.starts_with('.'))
}

/// Entry name is an OS metadata artifact (`.DS_Store`, `Thumbs.db`, ...)
pub fn is_os_metadata(name: &str) -> bool {
    let lower = name.to_lowercase();
    OS_METADATA_NAMES.contains(&lower.as_str())
}

fn lowercase_all(values: &[String]) -> Vec<String> {
    values.iter().map(|v| v.to_lowercase()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn filter(config: WalkConfig) -> PathFilter {
        PathFilter::from_config(&config).expect("filter should be built")
    }

    #[test]
    fn test_get_level() {
        assert_eq!(PathFilter::get_level(""), 1);
        assert_eq!(PathFilter::get_level("a.txt"), 1);
        assert_eq!(PathFilter::get_level("sub/b.txt"), 2);
        assert_eq!(PathFilter::get_level("a/b/c/d"), 4);
    }

    #[test]
    fn test_default_config_builds_no_filter() {
        assert!(PathFilter::from_config(&WalkConfig::default()).is_none());
    }

    #[test]
    fn test_hidden_rejected() {
        let f = filter(WalkConfig {
            min_level: 1,
            ..WalkConfig::default()
        });
        assert!(!f.validate(".cache"));
        assert!(!f.validate("sub/.hidden"));
        assert!(f.validate("sub/visible"));
    }

    #[test]
    fn test_level_bounds() {
        let f = filter(WalkConfig {
            min_level: 2,
            max_level: Some(3),
            ..WalkConfig::default()
        });
        assert!(!f.validate("a.txt"));
        assert!(f.validate("sub/b.txt"));
        assert!(f.validate("a/b/c.txt"));
        assert!(!f.validate("a/b/c/d.txt"));
        assert!(f.is_max_level("a/b/c"));
        assert!(!f.is_max_level("a/b"));
    }

    #[test]
    fn test_exclude_is_case_insensitive() {
        let f = filter(WalkConfig {
            exclude: vec!["B.TXT".into()],
            ..WalkConfig::default()
        });
        assert!(!f.validate("sub/b.txt"));
        assert!(f.validate("a.txt"));
    }

    #[test]
    fn test_include_requires_a_match() {
        let f = filter(WalkConfig {
            include: vec![".pdf".into(), "Report".into()],
            ..WalkConfig::default()
        });
        assert!(f.validate("docs/q1.PDF"));
        assert!(f.validate("annual_report.txt"));
        assert!(!f.validate("notes.txt"));
    }

    #[test]
    fn test_exclude_wins_over_include() {
        let f = filter(WalkConfig {
            include: vec!["report".into()],
            exclude: vec!["draft".into()],
            ..WalkConfig::default()
        });
        assert!(!f.validate("draft/report.txt"));
    }

    #[test]
    fn test_level_filters() {
        let mut level_filters = BTreeMap::new();
        level_filters.insert(0, LevelFilter::new(["2007"], ["prism"]));
        level_filters.insert(1, LevelFilter::excluding(["temp"]));

        let f = filter(WalkConfig {
            level_filters,
            ..WalkConfig::default()
        });

        assert!(f.validate("2007/project/plan.dwg"));
        assert!(!f.validate("2008/project/plan.dwg"));
        assert!(!f.validate("2007_prism/project/plan.dwg"));
        assert!(!f.validate("2007/TEMP files/plan.dwg"));
        // Segments beyond the configured levels are unconstrained
        assert!(f.validate("2007/project/temp.dwg"));
    }

    #[test]
    fn test_prunes() {
        let mut level_filters = BTreeMap::new();
        level_filters.insert(0, LevelFilter::including(["keep"]));

        let f = filter(WalkConfig {
            include: vec!["needle".into()],
            exclude: vec!["skip".into()],
            min_level: 3,
            max_level: Some(4),
            level_filters,
            ..WalkConfig::default()
        });

        // Failing includes or min level must not prune: descendants may match
        assert!(!f.prunes("keep"));
        assert!(!f.prunes("keep/a"));
        assert!(f.prunes("other"));
        assert!(f.prunes("keep/skip_me"));
        assert!(f.prunes("keep/.git"));
        assert!(f.prunes("keep/a/b/c/d"));
    }

    #[test]
    fn test_validate_non_empty_folder() {
        let root = tempdir().unwrap();
        fs::create_dir_all(root.path().join("a/with_file")).unwrap();
        fs::write(root.path().join("a/with_file/x.txt"), b"x").unwrap();
        fs::create_dir_all(root.path().join("a/only_dirs/inner")).unwrap();
        fs::create_dir_all(root.path().join("a/empty")).unwrap();

        let f = filter(WalkConfig {
            max_level: Some(2),
            non_empty_folders: true,
            ..WalkConfig::default()
        });

        let check = |rel: &str| f.validate_non_empty_folder(&root.path().join(rel), rel);
        assert!(check("a/with_file"));
        assert!(!check("a/only_dirs"));
        assert!(!check("a/empty"));
        assert!(!check("a/missing"));
        // Not at max level
        assert!(!check("a"));
    }

    #[test]
    fn test_os_metadata_names() {
        assert!(is_os_metadata(".DS_Store"));
        assert!(is_os_metadata("thumbs.db"));
        assert!(is_os_metadata("__MACOSX"));
        assert!(!is_os_metadata("notes.db"));
    }
}
