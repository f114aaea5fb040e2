//! Single-threaded depth-first walker
//!
//! Directories are visited from an explicit stack so a pruned directory is
//! never opened, in either order. Top-down emits a directory's files before
//! its subdirectories are visited; bottom-up emits them after the whole
//! subtree.

use crate::error::{Result, WalkWarning, WalkerError};
use crate::walker::policy::{materialize, Entry, TraversalPolicy};
use crate::walker::report::{WalkCounters, WalkReport};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, trace, warn};

enum Frame {
    /// Directory to list
    Enter(Entry),
    /// Paths held back until the subtree below them is done
    Exit(Vec<String>),
}

/// Sequential walker
pub struct SequentialWalker {
    policy: Arc<TraversalPolicy>,
    full_paths: bool,
    top_down: bool,
    counters: Arc<WalkCounters>,
    shutdown: Arc<AtomicBool>,
}

impl SequentialWalker {
    pub fn new(policy: Arc<TraversalPolicy>, full_paths: bool, top_down: bool) -> Self {
        Self {
            policy,
            full_paths,
            top_down,
            counters: Arc::new(WalkCounters::default()),
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Share live counters with an observer
    pub fn with_counters(mut self, counters: Arc<WalkCounters>) -> Self {
        self.counters = counters;
        self
    }

    /// Share a cancellation flag with the caller
    pub fn with_shutdown(mut self, shutdown: Arc<AtomicBool>) -> Self {
        self.shutdown = shutdown;
        self
    }

    /// Walk every root in order and collect the accepted paths
    pub fn crawl(&self, roots: &[PathBuf]) -> Result<WalkReport> {
        let start = Instant::now();
        let mut paths = Vec::new();
        let mut warnings = Vec::new();
        let mut completed = true;

        info!(
            roots = roots.len(),
            top_down = self.top_down,
            filtered = self.policy.is_filtered(),
            "Starting sequential walk"
        );

        for root in roots {
            if !self.walk_root(root, &mut paths, &mut warnings)? {
                completed = false;
                break;
            }
        }

        info!(
            paths = paths.len(),
            warnings = warnings.len(),
            completed,
            "Sequential walk finished"
        );

        Ok(WalkReport {
            paths,
            warnings,
            stats: self.counters.stats(start.elapsed()),
            completed,
        })
    }

    /// Returns false if the walk was cancelled
    fn walk_root(
        &self,
        root: &Path,
        paths: &mut Vec<String>,
        warnings: &mut Vec<WalkWarning>,
    ) -> Result<bool> {
        debug!(root = %root.display(), "Walking root");

        let mut stack = vec![Frame::Enter(Entry::root(root))];

        while let Some(frame) = stack.pop() {
            if self.shutdown.load(Ordering::Relaxed) {
                debug!(root = %root.display(), remaining = stack.len() + 1, "Walk cancelled");
                return Ok(false);
            }

            let dir = match frame {
                Frame::Exit(emitted) => {
                    paths.extend(emitted);
                    continue;
                }
                Frame::Enter(dir) => dir,
            };

            let mut expansion = match self.policy.expand(&dir) {
                Ok(expansion) => expansion,
                Err(source) if dir.rel.is_empty() => {
                    return Err(WalkerError::RootNotReadable {
                        path: root.to_path_buf(),
                        source,
                    });
                }
                Err(error) => {
                    self.counters.record_error();
                    warn!(path = %dir.path.display(), error = %error, "Directory listing failed");
                    warnings.push(WalkWarning::new(dir.path, error));
                    continue;
                }
            };

            self.counters.record_expansion(&expansion);
            for warning in expansion.warnings.drain(..) {
                warn!(path = %warning.path.display(), reason = %warning.reason, "Entry skipped");
                warnings.push(warning);
            }
            trace!(
                path = %dir.rel,
                emitted = expansion.emitted.len(),
                subdirs = expansion.subdirs.len(),
                "Directory expanded"
            );

            let emitted = expansion
                .emitted
                .into_iter()
                .map(|child| materialize(child, self.full_paths));

            if self.top_down {
                paths.extend(emitted);
            } else {
                stack.push(Frame::Exit(emitted.collect()));
            }

            // Reversed so the first listed subdirectory is visited first
            stack.extend(expansion.subdirs.into_iter().rev().map(Frame::Enter));
        }

        Ok(true)
    }
}
