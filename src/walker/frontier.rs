//! Work-stealing frontier of directories awaiting expansion
//!
//! Tasks live in a global injector (seeded from the roots) and in one FIFO
//! deque per worker. A worker pops its own deque first, then takes a batch
//! from the injector, then steals from its siblings.
//!
//! Termination uses an outstanding-task counter instead of queue emptiness:
//! every push increments it before the task becomes visible, and the
//! [`TaskGuard`] returned with a claimed task decrements it on drop, after
//! the task's children were pushed. The counter can therefore only reach
//! zero once no task is queued or in flight, and zero is final.

use crate::walker::policy::Entry;
use crossbeam_deque::{Injector, Steal, Stealer, Worker as DequeWorker};
use std::iter;
use std::path::Path;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

/// A directory to expand
#[derive(Debug, Clone)]
pub struct DirTask {
    /// The directory, as found by its parent's listing
    pub dir: Entry,
}

impl DirTask {
    pub fn new(dir: Entry) -> Self {
        Self { dir }
    }

    /// Path relative to the root
    pub fn rel(&self) -> &str {
        &self.dir.rel
    }

    /// Location on disk
    pub fn path(&self) -> &Path {
        &self.dir.path
    }
}

/// Per-worker task deque
pub type LocalQueue = DequeWorker<DirTask>;

/// Statistics for the frontier
#[derive(Debug, Default)]
pub struct FrontierStats {
    /// Total tasks enqueued
    pub enqueued: AtomicU64,

    /// Total tasks completed
    pub completed: AtomicU64,

    /// Tasks taken from another worker's deque
    pub stolen: AtomicU64,
}

impl FrontierStats {
    pub fn enqueued(&self) -> u64 {
        self.enqueued.load(Ordering::Relaxed)
    }

    pub fn completed(&self) -> u64 {
        self.completed.load(Ordering::Relaxed)
    }

    pub fn stolen(&self) -> u64 {
        self.stolen.load(Ordering::Relaxed)
    }
}

/// Shared frontier for the parallel walker
pub struct Frontier {
    injector: Injector<DirTask>,
    stealers: Vec<Stealer<DirTask>>,
    /// Tasks queued or in flight
    pending: AtomicUsize,
    /// Workers holding a task
    active: AtomicUsize,
    stats: FrontierStats,
}

impl Frontier {
    /// Create a frontier and the local deques for `worker_count` workers.
    ///
    /// The deque at index `i` belongs to worker `i`.
    pub fn new(worker_count: usize) -> (Arc<Self>, Vec<LocalQueue>) {
        let locals: Vec<LocalQueue> = (0..worker_count).map(|_| DequeWorker::new_fifo()).collect();
        let stealers = locals.iter().map(|w| w.stealer()).collect();

        let frontier = Arc::new(Self {
            injector: Injector::new(),
            stealers,
            pending: AtomicUsize::new(0),
            active: AtomicUsize::new(0),
            stats: FrontierStats::default(),
        });

        (frontier, locals)
    }

    /// Add a task to the global injector
    pub fn seed(&self, task: DirTask) {
        self.pending.fetch_add(1, Ordering::SeqCst);
        self.stats.enqueued.fetch_add(1, Ordering::Relaxed);
        self.injector.push(task);
    }

    /// Add a task to a worker's own deque
    pub fn push(&self, local: &LocalQueue, task: DirTask) {
        self.pending.fetch_add(1, Ordering::SeqCst);
        self.stats.enqueued.fetch_add(1, Ordering::Relaxed);
        local.push(task);
    }

    /// Claim the next task for `worker_id`: own deque, injector, then siblings
    pub fn find_task(&self, local: &LocalQueue, worker_id: usize) -> Option<TaskGuard<'_>> {
        let task = local.pop().or_else(|| {
            iter::repeat_with(|| {
                self.injector
                    .steal_batch_and_pop(local)
                    .or_else(|| self.steal_from_siblings(worker_id))
            })
            .find(|steal| !steal.is_retry())
            .and_then(Steal::success)
        })?;

        Some(TaskGuard::new(self, task))
    }

    fn steal_from_siblings(&self, worker_id: usize) -> Steal<DirTask> {
        let steal: Steal<DirTask> = self
            .stealers
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != worker_id)
            .map(|(_, stealer)| stealer.steal())
            .collect();

        if let Steal::Success(_) = steal {
            self.stats.stolen.fetch_add(1, Ordering::Relaxed);
        }
        steal
    }

    /// Tasks queued or in flight
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    /// Workers currently holding a task
    pub fn active(&self) -> usize {
        self.active.load(Ordering::Relaxed)
    }

    /// True once every task ever pushed has been completed
    pub fn is_drained(&self) -> bool {
        self.pending() == 0
    }

    pub fn stats(&self) -> &FrontierStats {
        &self.stats
    }
}

/// A claimed task; completes it on drop.
///
/// Dropping also runs during unwinding, so a failing or panicking expansion
/// still releases its slot and the frontier can drain.
pub struct TaskGuard<'a> {
    frontier: &'a Frontier,
    task: DirTask,
}

impl<'a> TaskGuard<'a> {
    fn new(frontier: &'a Frontier, task: DirTask) -> Self {
        frontier.active.fetch_add(1, Ordering::Relaxed);
        Self { frontier, task }
    }

    pub fn task(&self) -> &DirTask {
        &self.task
    }
}

impl Drop for TaskGuard<'_> {
    fn drop(&mut self) {
        self.frontier.active.fetch_sub(1, Ordering::Relaxed);
        self.frontier.stats.completed.fetch_add(1, Ordering::Relaxed);
        self.frontier.pending.fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Mutex;
    use std::thread;

    fn task(rel: &str) -> DirTask {
        DirTask::new(Entry::new(rel.to_string(), Path::new("/r").join(rel)))
    }

    #[test]
    fn test_frontier_basic() {
        let (frontier, locals) = Frontier::new(1);
        assert!(frontier.is_drained());

        frontier.seed(task("a"));
        assert!(!frontier.is_drained());
        assert_eq!(frontier.pending(), 1);

        let guard = frontier.find_task(&locals[0], 0).unwrap();
        assert_eq!(guard.task().rel(), "a");
        assert_eq!(guard.task().path(), Path::new("/r/a"));
        assert_eq!(frontier.active(), 1);

        // Queue is empty but the task is still in flight
        assert!(frontier.find_task(&locals[0], 0).is_none());
        assert!(!frontier.is_drained());

        drop(guard);
        assert!(frontier.is_drained());
        assert_eq!(frontier.active(), 0);
    }

    #[test]
    fn test_children_keep_frontier_open() {
        let (frontier, locals) = Frontier::new(1);
        frontier.seed(task("a"));

        let guard = frontier.find_task(&locals[0], 0).unwrap();
        frontier.push(&locals[0], task("a/b"));
        drop(guard);
        assert!(!frontier.is_drained());

        let child = frontier.find_task(&locals[0], 0).unwrap();
        assert_eq!(child.task().rel(), "a/b");
        drop(child);
        assert!(frontier.is_drained());

        assert_eq!(frontier.stats().enqueued(), 2);
        assert_eq!(frontier.stats().completed(), 2);
    }

    #[test]
    fn test_steal_from_sibling() {
        let (frontier, locals) = Frontier::new(2);
        frontier.push(&locals[0], task("x"));

        let stolen = frontier.find_task(&locals[1], 1).unwrap();
        assert_eq!(stolen.task().rel(), "x");
        assert_eq!(frontier.stats().stolen(), 1);
    }

    #[test]
    fn test_guard_released_on_panic() {
        let (frontier, locals) = Frontier::new(1);
        frontier.seed(task("a"));

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = frontier.find_task(&locals[0], 0).unwrap();
            panic!("expansion failed");
        }));

        assert!(result.is_err());
        assert!(frontier.is_drained());
    }

    #[test]
    fn test_concurrent_drain_visits_every_task_once() {
        const WORKERS: usize = 4;
        const FANOUT: usize = 4;
        const DEPTH: usize = 5;

        let (frontier, locals) = Frontier::new(WORKERS);
        frontier.seed(task("0"));
        let seen = Arc::new(Mutex::new(Vec::new()));

        let handles: Vec<_> = locals
            .into_iter()
            .enumerate()
            .map(|(id, local)| {
                let frontier = Arc::clone(&frontier);
                let seen = Arc::clone(&seen);
                thread::spawn(move || loop {
                    match frontier.find_task(&local, id) {
                        Some(guard) => {
                            let rel = guard.task().rel().to_string();
                            if rel.split('/').count() < DEPTH {
                                for child in 0..FANOUT {
                                    frontier.push(&local, task(&format!("{rel}/{child}")));
                                }
                            }
                            seen.lock().unwrap().push(rel);
                        }
                        None if frontier.is_drained() => break,
                        None => thread::yield_now(),
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        let seen = seen.lock().unwrap();
        let expected: usize = (0..DEPTH as u32).map(|d| FANOUT.pow(d)).sum();
        assert_eq!(seen.len(), expected);
        assert_eq!(seen.iter().collect::<HashSet<_>>().len(), expected);
    }
}
