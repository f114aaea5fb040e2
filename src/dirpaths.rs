//! Walk facade
//!
//! [`DirPaths`] owns the roots and the validated configuration, builds the
//! traversal policy once, and dispatches each run to the walker selected by
//! the configuration.

use crate::config::{Selection, WalkConfig};
use crate::error::{ConfigError, Result, WalkWarning, WalkerError};
use crate::filter::PathFilter;
use crate::walker::policy::{materialize, Entry, EntryKind, Expansion};
use crate::walker::{ParallelWalker, SequentialWalker, TraversalPolicy, WalkCounters, WalkProgress, WalkReport};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Interval between progress callbacks
const PROGRESS_INTERVAL: Duration = Duration::from_millis(100);

/// One or more root directories
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RootSet(Vec<PathBuf>);

impl RootSet {
    pub fn paths(&self) -> &[PathBuf] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<PathBuf> for RootSet {
    fn from(path: PathBuf) -> Self {
        Self(vec![path])
    }
}

impl From<&Path> for RootSet {
    fn from(path: &Path) -> Self {
        Self(vec![path.to_path_buf()])
    }
}

impl From<&PathBuf> for RootSet {
    fn from(path: &PathBuf) -> Self {
        Self(vec![path.clone()])
    }
}

impl From<&str> for RootSet {
    fn from(path: &str) -> Self {
        Self(vec![PathBuf::from(path)])
    }
}

impl From<String> for RootSet {
    fn from(path: String) -> Self {
        Self(vec![PathBuf::from(path)])
    }
}

impl<P: AsRef<Path>> From<Vec<P>> for RootSet {
    fn from(paths: Vec<P>) -> Self {
        Self(paths.iter().map(|p| p.as_ref().to_path_buf()).collect())
    }
}

impl<P: AsRef<Path>> From<&[P]> for RootSet {
    fn from(paths: &[P]) -> Self {
        Self(paths.iter().map(|p| p.as_ref().to_path_buf()).collect())
    }
}

impl<P: AsRef<Path>, const N: usize> From<[P; N]> for RootSet {
    fn from(paths: [P; N]) -> Self {
        Self(paths.iter().map(|p| p.as_ref().to_path_buf()).collect())
    }
}

/// Path enumeration over a fixed set of roots
///
/// # Example
///
/// ```no_run
/// use dirpaths::{DirPaths, WalkConfig};
///
/// let config = WalkConfig {
///     exclude: vec![".tmp".into()],
///     max_level: Some(3),
///     ..WalkConfig::default()
/// };
/// let report = DirPaths::new("/data", config)?.walk()?;
/// for path in &report {
///     println!("{}", path);
/// }
/// # Ok::<(), dirpaths::WalkerError>(())
/// ```
pub struct DirPaths {
    roots: Vec<PathBuf>,
    config: WalkConfig,
    policy: Arc<TraversalPolicy>,
    counters: Arc<WalkCounters>,
    shutdown: Arc<AtomicBool>,
}

impl DirPaths {
    /// Validate the configuration and normalize the roots.
    ///
    /// Fails before touching the filesystem if the configuration is
    /// inconsistent. Roots are made absolute but not checked until a run.
    pub fn new(roots: impl Into<RootSet>, config: WalkConfig) -> Result<Self> {
        let roots = roots.into();
        if roots.is_empty() {
            return Err(ConfigError::NoRoots.into());
        }
        config.validate()?;

        let roots = roots
            .0
            .into_iter()
            .map(|root| {
                std::path::absolute(&root).map_err(|_| WalkerError::RootNotFound { path: root })
            })
            .collect::<Result<Vec<_>>>()?;

        let policy = TraversalPolicy::new(PathFilter::from_config(&config), config.skip_os_metadata);

        Ok(Self {
            roots,
            config,
            policy: Arc::new(policy),
            counters: Arc::new(WalkCounters::default()),
            shutdown: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Absolute roots, in the order given
    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    pub fn config(&self) -> &WalkConfig {
        &self.config
    }

    /// True when a filter option is set
    pub fn is_filtered(&self) -> bool {
        self.policy.is_filtered()
    }

    /// Flag that cancels a running walk when set
    pub fn shutdown_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    /// Live counters of the current or last run
    pub fn counters(&self) -> Arc<WalkCounters> {
        Arc::clone(&self.counters)
    }

    /// Run the configured selection
    pub fn run(&self) -> Result<WalkReport> {
        match self.config.selection {
            Selection::Walk => self.walk(),
            Selection::Files => self.list_direct(false),
            Selection::Folders => self.list_direct(true),
        }
    }

    /// Every accepted path below the roots
    pub fn walk(&self) -> Result<WalkReport> {
        self.check_roots()?;
        self.counters.reset();

        info!(
            roots = self.roots.len(),
            parallel = self.config.parallelize,
            filtered = self.is_filtered(),
            "Walking"
        );

        let report = if self.config.parallelize {
            ParallelWalker::new(
                Arc::clone(&self.policy),
                self.config.full_paths,
                self.config.worker_count,
            )
            .with_counters(Arc::clone(&self.counters))
            .with_shutdown(Arc::clone(&self.shutdown))
            .crawl(&self.roots)?
        } else {
            SequentialWalker::new(
                Arc::clone(&self.policy),
                self.config.full_paths,
                self.config.top_down,
            )
            .with_counters(Arc::clone(&self.counters))
            .with_shutdown(Arc::clone(&self.shutdown))
            .crawl(&self.roots)?
        };

        Ok(self.finish(report))
    }

    /// Files directly inside the roots
    pub fn files(&self) -> Result<Vec<String>> {
        self.list_direct(false).map(|report| report.paths)
    }

    /// Folders directly inside the roots
    pub fn folders(&self) -> Result<Vec<String>> {
        self.list_direct(true).map(|report| report.paths)
    }

    /// Run the configured selection while a monitor thread reports progress
    pub fn run_with_progress<F>(&self, progress_callback: F) -> Result<WalkReport>
    where
        F: Fn(WalkProgress) + Send + 'static,
    {
        let start = Instant::now();
        let done = Arc::new(AtomicBool::new(false));
        let counters = Arc::clone(&self.counters);
        let total_workers = if self.config.parallelize {
            self.config.worker_count
        } else {
            1
        };

        let monitor = {
            let done = Arc::clone(&done);
            thread::Builder::new()
                .name("progress".to_string())
                .spawn(move || {
                    while !done.load(Ordering::Relaxed) {
                        progress_callback(counters.progress(total_workers, start.elapsed()));
                        thread::sleep(PROGRESS_INTERVAL);
                    }
                })?
        };

        let result = self.run();

        done.store(true, Ordering::SeqCst);
        let _ = monitor.join();

        result
    }

    fn list_direct(&self, folders: bool) -> Result<WalkReport> {
        self.check_roots()?;
        self.counters.reset();

        let start = Instant::now();
        let mut paths = Vec::new();
        let mut warnings = Vec::new();

        for root in &self.roots {
            let mut expansion = Expansion::default();

            for entry in fs::read_dir(root).map_err(|e| not_readable(root, e))? {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(e) => {
                        expansion.warnings.push(WalkWarning::new(root, e));
                        continue;
                    }
                };
                let kind = match EntryKind::of(&entry) {
                    Ok(kind) => kind,
                    Err(e) => {
                        expansion.warnings.push(WalkWarning::new(entry.path(), e));
                        continue;
                    }
                };
                let name = entry.file_name().to_string_lossy().into_owned();

                match kind {
                    EntryKind::LinkedDir => expansion.skipped += 1,
                    EntryKind::Dir if self.policy.is_ignored(&name) => expansion.skipped += 1,
                    _ if self.policy.is_ignored(&name) => {}
                    EntryKind::Dir if folders => {
                        expansion.emitted.push(Entry::new(name, entry.path()))
                    }
                    EntryKind::File if !folders => {
                        expansion.emitted.push(Entry::new(name, entry.path()))
                    }
                    _ => {}
                }
            }

            self.counters.record_expansion(&expansion);
            warnings.append(&mut expansion.warnings);
            paths.extend(
                expansion
                    .emitted
                    .into_iter()
                    .map(|child| materialize(child, self.config.full_paths)),
            );
        }

        debug!(folders, count = paths.len(), "Listed root children");

        Ok(self.finish(WalkReport {
            paths,
            warnings,
            stats: self.counters.stats(start.elapsed()),
            completed: true,
        }))
    }

    fn finish(&self, mut report: WalkReport) -> WalkReport {
        if self.config.sort {
            report.paths.sort_unstable();
        }
        report
    }

    /// Every root must be an existing, listable directory
    fn check_roots(&self) -> Result<()> {
        for root in &self.roots {
            match fs::metadata(root) {
                Ok(metadata) if metadata.is_dir() => {}
                Ok(_) => return Err(WalkerError::RootNotFound { path: root.clone() }),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    return Err(WalkerError::RootNotFound { path: root.clone() })
                }
                Err(e) => return Err(not_readable(root, e)),
            }

            fs::read_dir(root).map_err(|e| not_readable(root, e))?;
        }
        Ok(())
    }
}

fn not_readable(root: &Path, source: io::Error) -> WalkerError {
    WalkerError::RootNotReadable {
        path: root.to_path_buf(),
        source,
    }
}
