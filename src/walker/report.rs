//! Walk results, live counters and progress snapshots

use crate::error::WalkWarning;
use crate::walker::policy::Expansion;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

/// Result of a completed walk
#[derive(Debug, Clone, Default, Serialize)]
pub struct WalkReport {
    /// Accepted paths, relative to their root or absolute
    pub paths: Vec<String>,

    /// Directories below a root that could not be listed
    pub warnings: Vec<WalkWarning>,

    /// Counters at the end of the walk
    pub stats: WalkStats,

    /// False when the walk was cancelled before the frontier drained
    pub completed: bool,
}

impl WalkReport {
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.paths.iter()
    }
}

impl IntoIterator for WalkReport {
    type Item = String;
    type IntoIter = std::vec::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.paths.into_iter()
    }
}

impl<'a> IntoIterator for &'a WalkReport {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.paths.iter()
    }
}

/// Final walk statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WalkStats {
    /// Directories listed
    pub dirs: u64,

    /// Paths emitted
    pub files: u64,

    /// Directories that failed to list
    pub errors: u64,

    /// Entries rejected without descending (hidden, pruned, metadata)
    pub skipped: u64,

    /// Time taken for the walk
    pub duration: Duration,
}

/// Live counters shared between a walk and its observers
#[derive(Debug, Default)]
pub struct WalkCounters {
    /// Directories listed
    pub dirs: AtomicU64,

    /// Paths emitted
    pub files: AtomicU64,

    /// Directories that failed to list, and unreadable entries
    pub errors: AtomicU64,

    /// Directories pruned or skipped
    pub skipped: AtomicU64,

    /// Frontier tasks queued or in flight (parallel walk only)
    pub queued: AtomicUsize,

    /// Workers currently expanding a directory (parallel walk only)
    pub active_workers: AtomicUsize,
}

impl WalkCounters {
    pub(crate) fn record_expansion(&self, expansion: &Expansion) {
        self.dirs.fetch_add(1, Ordering::Relaxed);
        self.files
            .fetch_add(expansion.emitted.len() as u64, Ordering::Relaxed);
        self.skipped.fetch_add(expansion.skipped, Ordering::Relaxed);
        self.errors
            .fetch_add(expansion.warnings.len() as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn set_frontier(&self, queued: usize, active: usize) {
        self.queued.store(queued, Ordering::Relaxed);
        self.active_workers.store(active, Ordering::Relaxed);
    }

    /// Zero every counter before a new walk
    pub fn reset(&self) {
        self.dirs.store(0, Ordering::Relaxed);
        self.files.store(0, Ordering::Relaxed);
        self.errors.store(0, Ordering::Relaxed);
        self.skipped.store(0, Ordering::Relaxed);
        self.queued.store(0, Ordering::Relaxed);
        self.active_workers.store(0, Ordering::Relaxed);
    }

    /// Snapshot as final statistics
    pub fn stats(&self, duration: Duration) -> WalkStats {
        WalkStats {
            dirs: self.dirs.load(Ordering::Relaxed),
            files: self.files.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            duration,
        }
    }

    /// Snapshot for progress display
    pub fn progress(&self, total_workers: usize, elapsed: Duration) -> WalkProgress {
        WalkProgress {
            dirs: self.dirs.load(Ordering::Relaxed),
            files: self.files.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            queue_size: self.queued.load(Ordering::Relaxed),
            active_workers: self.active_workers.load(Ordering::Relaxed),
            total_workers,
            elapsed,
        }
    }
}

/// Progress information for display
#[derive(Debug, Clone, Default)]
pub struct WalkProgress {
    /// Directories listed
    pub dirs: u64,

    /// Paths emitted
    pub files: u64,

    /// Errors encountered
    pub errors: u64,

    /// Current frontier size
    pub queue_size: usize,

    /// Active workers
    pub active_workers: usize,

    /// Total workers (1 for a sequential walk)
    pub total_workers: usize,

    /// Elapsed time
    pub elapsed: Duration,
}

impl WalkProgress {
    /// Calculate emitted paths per second
    pub fn files_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.files as f64 / secs
        } else {
            0.0
        }
    }

    /// Calculate directories per second
    pub fn dirs_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.dirs as f64 / secs
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::walker::policy::Entry;
    use std::path::Path;

    #[test]
    fn test_walk_progress_rates() {
        let progress = WalkProgress {
            dirs: 1000,
            files: 10000,
            errors: 5,
            queue_size: 500,
            active_workers: 4,
            total_workers: 8,
            elapsed: Duration::from_secs(10),
        };

        assert!((progress.files_per_second() - 1000.0).abs() < 0.1);
        assert!((progress.dirs_per_second() - 100.0).abs() < 0.1);
    }

    #[test]
    fn test_counters_reset() {
        let counters = WalkCounters::default();
        let entry = |rel: &str| Entry::new(rel.to_string(), Path::new("/r").join(rel));
        counters.record_expansion(&Expansion {
            subdirs: vec![entry("a")],
            emitted: vec![entry("x"), entry("y")],
            skipped: 3,
            warnings: vec![WalkWarning::new("/r/z", "unreadable")],
        });
        counters.record_error();
        counters.set_frontier(7, 2);

        let stats = counters.stats(Duration::from_secs(1));
        assert_eq!(stats.dirs, 1);
        assert_eq!(stats.files, 2);
        assert_eq!(stats.skipped, 3);
        assert_eq!(stats.errors, 2);
        assert_eq!(counters.progress(4, Duration::ZERO).queue_size, 7);

        counters.reset();
        assert_eq!(counters.stats(Duration::ZERO), WalkStats::default());
    }

    #[test]
    fn test_report_iteration() {
        let report = WalkReport {
            paths: vec!["a.txt".into(), "sub/b.txt".into()],
            completed: true,
            ..WalkReport::default()
        };
        assert_eq!(report.len(), 2);
        let collected: Vec<String> = report.into_iter().collect();
        assert_eq!(collected, vec!["a.txt".to_string(), "sub/b.txt".to_string()]);
    }
}
