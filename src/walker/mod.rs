//! Directory walkers
//!
//! # Architecture
//!
//! ```text
//!                  ┌──────────────────────────┐
//!                  │     TraversalPolicy      │
//!                  │  emit / descend / skip   │
//!                  └────────────┬─────────────┘
//!                               │
//!            ┌──────────────────┴──────────────────┐
//!            │                                     │
//!  ┌─────────▼──────────┐              ┌───────────▼───────────┐
//!  │  SequentialWalker  │              │    ParallelWalker     │
//!  │  explicit stack    │              │  Frontier (stealing)  │
//!  │  top-down/bottom-up│              │  N workers → channel  │
//!  └────────────────────┘              └───────────────────────┘
//! ```
//!
//! Both walkers expand directories through the same policy, so for an
//! unchanged tree they return the same set of paths.

pub mod frontier;
pub mod parallel;
pub mod policy;
pub mod report;
pub mod sequential;

pub use frontier::{DirTask, Frontier, FrontierStats, TaskGuard};
pub use parallel::ParallelWalker;
pub use policy::{Disposition, Entry, EntryKind, Expansion, TraversalPolicy};
pub use report::{WalkCounters, WalkProgress, WalkReport, WalkStats};
pub use sequential::SequentialWalker;
