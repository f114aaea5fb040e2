//! dirpaths - Filtered Directory Path Enumeration
//!
//! Enumerates the file paths under one or more root directories, either on
//! the calling thread or on a pool of work-stealing worker threads.
//!
//! # Features
//!
//! - **Level Filters**: bound the depth of accepted paths and constrain the
//!   folder name found at each level with include/exclude substrings.
//!
//! - **Pruning**: directories that no descendant could pass through are never
//!   opened.
//!
//! - **Folder Collapsing**: at the max level, emit folders that hold files
//!   instead of the files themselves.
//!
//! - **Parallel Walk**: N workers share a frontier of unexpanded
//!   directories; a task counter tells them when the walk is done. Both
//!   walkers return the same set of paths.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                         DirPaths                           │
//! │   roots + WalkConfig → TraversalPolicy (PathFilter)        │
//! └──────────────┬──────────────────────────────┬──────────────┘
//!                │                              │
//!     ┌──────────▼─────────┐        ┌───────────▼────────────┐
//!     │  SequentialWalker  │        │     ParallelWalker     │
//!     │  top-down or       │        │  Frontier + N workers  │
//!     │  bottom-up         │        │  → result channel      │
//!     └──────────┬─────────┘        └───────────┬────────────┘
//!                └──────────────┬───────────────┘
//!                               ▼
//!                    WalkReport { paths, warnings, stats }
//! ```
//!
//! # Example
//!
//! ```bash
//! # Every file, relative to the root
//! dirpaths ~/projects
//!
//! # Parallel, two levels deep, folders holding files collapsed
//! dirpaths /data -P -w 16 --max-level 2 --non-empty-folders
//!
//! # Only 2007 projects, skipping temp folders one level down
//! dirpaths /archive --level-include 0=2007 --level-exclude 1=temp
//! ```

pub mod compare;
pub mod config;
pub mod dirpaths;
pub mod error;
pub mod filter;
pub mod progress;
pub mod tree;
pub mod walker;

pub use compare::unique;
pub use config::{CliArgs, OutputFormat, Selection, WalkConfig};
pub use dirpaths::{DirPaths, RootSet};
pub use error::{ConfigError, Result, WalkWarning, WalkerError};
pub use filter::{LevelFilter, PathFilter};
pub use tree::{DirTree, TreeBranch, TreeNode};
pub use walker::{ParallelWalker, SequentialWalker, WalkProgress, WalkReport, WalkStats};
