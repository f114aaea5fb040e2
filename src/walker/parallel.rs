//! Parallel walker
//!
//! Architecture:
//! ```text
//! Calling thread: list each root → emit root-level paths → seed frontier
//! │
//! ├── Worker 0: find task → list dir → push subdirs locally → batch paths
//! ├── Worker 1: find task → list dir → push subdirs locally → batch paths
//! └── Worker N: ...
//! │
//! └── Calling thread: recv batches and warnings until every worker exits
//! ```
//!
//! Workers exit once the frontier is drained (no task queued or in flight),
//! or when the shutdown flag is raised.

use crate::error::{Result, WalkOutcome, WalkWarning, WalkerError, WorkerError};
use crate::walker::frontier::{DirTask, Frontier, LocalQueue};
use crate::walker::policy::{materialize, Entry, Expansion, TraversalPolicy};
use crate::walker::report::{WalkCounters, WalkReport};
use crossbeam_channel::{unbounded, Sender};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, trace, warn};

/// Paths sent to the collector per message
const BATCH_SIZE: usize = 1000;

/// Failed task lookups before an idle worker sleeps
const MAX_IDLE_SPINS: u32 = 1000;

/// Message from a worker to the collecting thread
enum Message {
    Paths(Vec<String>),
    Warning(WalkWarning),
}

/// Multi-threaded walker over a work-stealing frontier
pub struct ParallelWalker {
    policy: Arc<TraversalPolicy>,
    full_paths: bool,
    worker_count: usize,
    counters: Arc<WalkCounters>,
    shutdown: Arc<AtomicBool>,
}

impl ParallelWalker {
    pub fn new(policy: Arc<TraversalPolicy>, full_paths: bool, worker_count: usize) -> Self {
        Self {
            policy,
            full_paths,
            worker_count: worker_count.max(1),
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

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// Walk every root and collect the accepted paths
    pub fn crawl(&self, roots: &[PathBuf]) -> Result<WalkReport> {
        let start = Instant::now();
        let (frontier, locals) = Frontier::new(self.worker_count);
        let mut paths = Vec::new();
        let mut warnings = Vec::new();

        // Root-level entries never enter the frontier
        for root in roots {
            let mut expansion = self.policy.expand(&Entry::root(root)).map_err(|source| {
                WalkerError::RootNotReadable {
                    path: root.clone(),
                    source,
                }
            })?;
            self.counters.record_expansion(&expansion);
            warnings.append(&mut expansion.warnings);

            paths.extend(
                expansion
                    .emitted
                    .into_iter()
                    .map(|child| materialize(child, self.full_paths)),
            );
            for dir in expansion.subdirs {
                frontier.seed(DirTask::new(dir));
            }
        }

        info!(
            roots = roots.len(),
            workers = self.worker_count,
            seeded = frontier.pending(),
            "Starting parallel walk"
        );

        let (tx, rx) = unbounded::<Message>();
        let handles = self.spawn_workers(&frontier, locals, &tx)?;

        // Drop our sender so the receive loop ends with the last worker
        drop(tx);

        for message in rx {
            match message {
                Message::Paths(batch) => paths.extend(batch),
                Message::Warning(warning) => warnings.push(warning),
            }
        }

        let mut panicked = None;
        for (id, handle) in handles.into_iter().enumerate() {
            if handle.join().is_err() {
                error!(worker = id, "Worker thread panicked");
                panicked.get_or_insert(id);
            }
        }
        if let Some(id) = panicked {
            return Err(WorkerError::Panicked { id }.into());
        }

        let completed = frontier.is_drained();
        let stats = frontier.stats();
        info!(
            paths = paths.len(),
            warnings = warnings.len(),
            enqueued = stats.enqueued(),
            stolen = stats.stolen(),
            completed,
            "Parallel walk finished"
        );

        self.counters.set_frontier(0, 0);

        Ok(WalkReport {
            paths,
            warnings,
            stats: self.counters.stats(start.elapsed()),
            completed,
        })
    }

    fn spawn_workers(
        &self,
        frontier: &Arc<Frontier>,
        locals: Vec<LocalQueue>,
        tx: &Sender<Message>,
    ) -> Result<Vec<JoinHandle<()>>> {
        let mut handles = Vec::with_capacity(locals.len());
        // Stops workers of this walk only; the shutdown flag belongs to the caller
        let abort = Arc::new(AtomicBool::new(false));

        for (id, local) in locals.into_iter().enumerate() {
            let context = WorkerContext {
                id,
                local,
                frontier: Arc::clone(frontier),
                policy: Arc::clone(&self.policy),
                full_paths: self.full_paths,
                tx: tx.clone(),
                counters: Arc::clone(&self.counters),
                shutdown: Arc::clone(&self.shutdown),
                abort: Arc::clone(&abort),
            };

            match thread::Builder::new()
                .name(format!("walker-{}", id))
                .spawn(move || context.run())
            {
                Ok(handle) => handles.push(handle),
                Err(e) => {
                    error!(worker = id, error = %e, "Failed to spawn worker");
                    abort.store(true, Ordering::SeqCst);
                    for handle in handles {
                        let _ = handle.join();
                    }
                    return Err(WorkerError::SpawnFailed {
                        id,
                        reason: e.to_string(),
                    }
                    .into());
                }
            }
        }

        Ok(handles)
    }
}

/// State owned by one worker thread
struct WorkerContext {
    id: usize,
    local: LocalQueue,
    frontier: Arc<Frontier>,
    policy: Arc<TraversalPolicy>,
    full_paths: bool,
    tx: Sender<Message>,
    counters: Arc<WalkCounters>,
    shutdown: Arc<AtomicBool>,
    abort: Arc<AtomicBool>,
}

impl WorkerContext {
    fn stopped(&self) -> bool {
        self.shutdown.load(Ordering::Relaxed) || self.abort.load(Ordering::Relaxed)
    }

    fn run(self) {
        debug!(worker = self.id, "Worker starting");

        let mut batch: Vec<String> = Vec::with_capacity(BATCH_SIZE);
        let mut idle_spins = 0;
        let mut expanded = 0u64;

        while !self.stopped() {
            let Some(guard) = self.frontier.find_task(&self.local, self.id) else {
                if self.frontier.is_drained() {
                    break;
                }

                idle_spins += 1;
                if idle_spins > MAX_IDLE_SPINS {
                    thread::sleep(Duration::from_micros(100));
                    idle_spins = 0;
                } else {
                    std::hint::spin_loop();
                }
                continue;
            };
            idle_spins = 0;

            let outcome = self.expand(guard.task(), &mut batch);
            expanded += 1;

            match outcome {
                WalkOutcome::Expanded {
                    path,
                    emitted,
                    subdirs,
                } => {
                    trace!(worker = self.id, path = %path.display(), emitted, subdirs, "Directory expanded");
                }
                WalkOutcome::Failed { path, error } => {
                    warn!(worker = self.id, path = %path.display(), error = %error, "Directory listing failed");
                    let _ = self.tx.send(Message::Warning(WalkWarning::new(path, error)));
                }
            }

            let active = self.frontier.active();
            self.counters
                .set_frontier(self.frontier.pending().saturating_sub(active), active);

            // Children are counted, so the task may complete
            drop(guard);

            if batch.len() >= BATCH_SIZE {
                let full = std::mem::replace(&mut batch, Vec::with_capacity(BATCH_SIZE));
                if self.tx.send(Message::Paths(full)).is_err() {
                    break;
                }
            }
        }

        if !batch.is_empty() {
            let _ = self.tx.send(Message::Paths(batch));
        }

        debug!(worker = self.id, expanded, "Worker finished");
    }

    fn expand(&self, task: &DirTask, batch: &mut Vec<String>) -> WalkOutcome {
        match self.policy.expand(&task.dir) {
            Ok(expansion) => {
                self.counters.record_expansion(&expansion);

                let Expansion {
                    subdirs,
                    emitted,
                    warnings,
                    ..
                } = expansion;
                let outcome = WalkOutcome::Expanded {
                    path: task.path().to_path_buf(),
                    emitted: emitted.len(),
                    subdirs: subdirs.len(),
                };

                for warning in warnings {
                    warn!(worker = self.id, path = %warning.path.display(), reason = %warning.reason, "Entry skipped");
                    let _ = self.tx.send(Message::Warning(warning));
                }
                batch.extend(
                    emitted
                        .into_iter()
                        .map(|child| materialize(child, self.full_paths)),
                );
                for dir in subdirs {
                    self.frontier.push(&self.local, DirTask::new(dir));
                }

                outcome
            }
            Err(error) => {
                self.counters.record_error();
                WalkOutcome::Failed {
                    path: task.path().to_path_buf(),
                    error,
                }
            }
        }
    }
}
