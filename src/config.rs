//! Configuration types for dirpaths
//!
//! This module defines:
//! - CLI argument parsing using clap derive macros
//! - Runtime walk configuration with validation
//! - Parsing of `LEVEL=A,B` per-level filter arguments

use crate::error::ConfigError;
use crate::filter::LevelFilter;
use crate::tree::TreeBranch;
use clap::Parser;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Maximum reasonable worker count
const MAX_WORKERS: usize = 512;

/// Enumerate file paths under one or more directories
#[derive(Parser, Debug, Clone)]
#[command(
    name = "dirpaths",
    version,
    about = "Enumerate file paths under one or more directories",
    long_about = "Walks one or more directory trees and prints the paths of the files found.\n\n\
                  Paths can be filtered by depth, by case-insensitive substrings, and by\n\
                  per-level include/exclude sets. Hidden entries are always skipped.",
    after_help = "EXAMPLES:\n    \
        dirpaths ~/projects --exclude .xls --exclude .doc\n    \
        dirpaths /data -P -w 16 --max-level 3 --non-empty-folders\n    \
        dirpaths /archive --level-include 0=2007,2008 --level-exclude 1=temp\n    \
        dirpaths /a /b --full-paths --sort --json\n    \
        dirpaths tree ~/projects --json",
    args_conflicts_with_subcommands = true,
    subcommand_negates_reqs = true
)]
pub struct CliArgs {
    /// Root directories to walk
    #[arg(value_name = "ROOT", required = true)]
    pub roots: Vec<PathBuf>,

    /// Subcommand (tree)
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Emit absolute paths instead of root-relative ones
    #[arg(short = 'f', long)]
    pub full_paths: bool,

    /// Yield directory contents before the directory itself (sequential walk)
    #[arg(long)]
    pub bottom_up: bool,

    /// Keep only paths containing one of these substrings (can be repeated)
    #[arg(short = 'i', long = "include", value_name = "SUBSTR", action = clap::ArgAction::Append)]
    pub include: Vec<String>,

    /// Drop paths containing any of these substrings (can be repeated)
    #[arg(short = 'e', long = "exclude", value_name = "SUBSTR", action = clap::ArgAction::Append)]
    pub exclude: Vec<String>,

    /// Minimum path level to keep (a file in the root is level 1)
    #[arg(long, default_value = "0", value_name = "NUM")]
    pub min_level: usize,

    /// Maximum path level to keep (unlimited if not set)
    #[arg(long, value_name = "NUM")]
    pub max_level: Option<usize>,

    /// Path segment at LEVEL must contain one of the values (can be repeated)
    #[arg(long = "level-include", value_name = "LEVEL=A,B", action = clap::ArgAction::Append)]
    pub level_include: Vec<String>,

    /// Path segment at LEVEL must contain none of the values (can be repeated)
    #[arg(long = "level-exclude", value_name = "LEVEL=A,B", action = clap::ArgAction::Append)]
    pub level_exclude: Vec<String>,

    /// At the max level, emit folders holding files instead of descending
    #[arg(long)]
    pub non_empty_folders: bool,

    /// Walk with a pool of parallel workers
    #[arg(short = 'P', long)]
    pub parallel: bool,

    /// Number of worker threads for the parallel walk
    #[arg(
        short = 'w',
        long,
        default_value_t = default_workers(),
        value_name = "NUM"
    )]
    pub workers: usize,

    /// Only list files directly inside the roots
    #[arg(long)]
    pub only_files: bool,

    /// Only list folders directly inside the roots
    #[arg(long)]
    pub only_folders: bool,

    /// Sort the output
    #[arg(long)]
    pub sort: bool,

    /// Keep OS metadata entries such as Thumbs.db and desktop.ini
    #[arg(long)]
    pub keep_os_metadata: bool,

    /// Print a JSON document instead of one path per line
    #[arg(long)]
    pub json: bool,

    /// Show a progress spinner on stderr
    #[arg(short = 'p', long)]
    pub progress: bool,

    /// Quiet mode - suppress header and summary
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// Verbose output (debug logging)
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

/// Subcommands
#[derive(clap::Subcommand, Debug, Clone)]
pub enum Command {
    /// Print the nested directory tree of a root
    Tree {
        /// Root directory
        #[arg(value_name = "ROOT")]
        root: PathBuf,

        /// Folder name at LEVEL must be one of the values (can be repeated)
        #[arg(long = "folder-include", value_name = "LEVEL=A,B", action = clap::ArgAction::Append)]
        folder_include: Vec<String>,

        /// Folder name at LEVEL must not be one of the values (can be repeated)
        #[arg(long = "folder-exclude", value_name = "LEVEL=A,B", action = clap::ArgAction::Append)]
        folder_exclude: Vec<String>,

        /// Print JSON instead of an indented listing
        #[arg(long)]
        json: bool,

        /// Verbose output (debug logging)
        #[arg(short = 'v', long)]
        verbose: bool,
    },
}

impl CliArgs {
    /// Whether debug logging was requested, on the main command or a subcommand
    pub fn verbose(&self) -> bool {
        match &self.command {
            Some(Command::Tree { verbose, .. }) => *verbose || self.verbose,
            None => self.verbose,
        }
    }
}

/// How results are printed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// One path per line
    Lines,
    /// A single JSON document
    Json,
}

/// What a run collects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Selection {
    /// Every file below the roots
    #[default]
    Walk,
    /// Files directly inside the roots
    Files,
    /// Folders directly inside the roots
    Folders,
}

fn default_workers() -> usize {
    num_cpus::get().min(MAX_WORKERS)
}

/// Validated runtime configuration for a walk
#[derive(Debug, Clone)]
pub struct WalkConfig {
    /// Emit absolute paths instead of root-relative ones
    pub full_paths: bool,

    /// Sequential walk order: directory before its contents
    pub top_down: bool,

    /// Global include substrings
    pub include: Vec<String>,

    /// Global exclude substrings
    pub exclude: Vec<String>,

    /// Minimum path level (0 = unbounded)
    pub min_level: usize,

    /// Maximum path level
    pub max_level: Option<usize>,

    /// Per-level filters keyed by 0-based segment index
    pub level_filters: BTreeMap<usize, LevelFilter>,

    /// Collapse folders with direct files at the max level
    pub non_empty_folders: bool,

    /// Use the parallel walker
    pub parallelize: bool,

    /// Number of parallel workers
    pub worker_count: usize,

    /// Walk, or list direct children only
    pub selection: Selection,

    /// Sort collected paths
    pub sort: bool,

    /// Skip `.DS_Store`, `Thumbs.db` and friends
    pub skip_os_metadata: bool,
}

impl Default for WalkConfig {
    fn default() -> Self {
        Self {
            full_paths: false,
            top_down: true,
            include: Vec::new(),
            exclude: Vec::new(),
            min_level: 0,
            max_level: None,
            level_filters: BTreeMap::new(),
            non_empty_folders: false,
            parallelize: false,
            worker_count: default_workers(),
            selection: Selection::Walk,
            sort: false,
            skip_os_metadata: true,
        }
    }
}

impl WalkConfig {
    /// Check option consistency before any traversal starts
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.parallelize && (self.worker_count == 0 || self.worker_count > MAX_WORKERS) {
            return Err(ConfigError::InvalidWorkerCount {
                count: self.worker_count,
                max: MAX_WORKERS,
            });
        }

        if let Some(max) = self.max_level {
            if max == 0 {
                return Err(ConfigError::InvalidMaxLevel);
            }
            if self.min_level > max {
                return Err(ConfigError::InvalidLevelRange {
                    min: self.min_level,
                    max,
                });
            }
        }

        if self.non_empty_folders && self.max_level.is_none() {
            return Err(ConfigError::NonEmptyFoldersWithoutMaxLevel);
        }

        Ok(())
    }

    /// True when any filter option differs from its default
    pub fn has_filters(&self) -> bool {
        !self.include.is_empty()
            || !self.exclude.is_empty()
            || !self.level_filters.is_empty()
            || self.min_level != 0
            || self.max_level.is_some()
            || self.non_empty_folders
    }
}

/// Everything the binary needs for a walk run
#[derive(Debug, Clone)]
pub struct CliConfig {
    /// Roots to walk
    pub roots: Vec<PathBuf>,

    /// Walk configuration
    pub walk: WalkConfig,

    /// Output format
    pub format: OutputFormat,

    /// Show progress spinner
    pub show_progress: bool,

    /// Show header and summary
    pub show_summary: bool,
}

impl CliConfig {
    /// Create and validate configuration from CLI arguments
    pub fn from_args(args: CliArgs) -> Result<Self, ConfigError> {
        if args.roots.is_empty() {
            return Err(ConfigError::NoRoots);
        }

        let selection = match (args.only_files, args.only_folders) {
            (true, true) => return Err(ConfigError::ConflictingSelection),
            (true, false) => Selection::Files,
            (false, true) => Selection::Folders,
            (false, false) => Selection::Walk,
        };

        let mut level_filters: BTreeMap<usize, LevelFilter> = BTreeMap::new();
        for arg in &args.level_include {
            let (level, values) = parse_level_filter(arg)?;
            level_filters.entry(level).or_default().include.extend(values);
        }
        for arg in &args.level_exclude {
            let (level, values) = parse_level_filter(arg)?;
            level_filters.entry(level).or_default().exclude.extend(values);
        }

        let walk = WalkConfig {
            full_paths: args.full_paths,
            top_down: !args.bottom_up,
            include: args.include,
            exclude: args.exclude,
            min_level: args.min_level,
            max_level: args.max_level,
            level_filters,
            non_empty_folders: args.non_empty_folders,
            parallelize: args.parallel,
            worker_count: args.workers,
            selection,
            sort: args.sort,
            skip_os_metadata: !args.keep_os_metadata,
        };
        walk.validate()?;

        Ok(Self {
            roots: args.roots,
            walk,
            format: if args.json {
                OutputFormat::Json
            } else {
                OutputFormat::Lines
            },
            show_progress: args.progress && !args.quiet,
            show_summary: !args.quiet,
        })
    }
}

/// Build per-level tree branches from `LEVEL=A,B` folder arguments
pub fn tree_branches(
    folder_include: &[String],
    folder_exclude: &[String],
) -> Result<Vec<TreeBranch>, ConfigError> {
    let mut branches: BTreeMap<usize, TreeBranch> = BTreeMap::new();
    for arg in folder_include {
        let (level, values) = parse_level_filter(arg)?;
        branches.entry(level).or_default().include.extend(values);
    }
    for arg in folder_exclude {
        let (level, values) = parse_level_filter(arg)?;
        branches.entry(level).or_default().exclude.extend(values);
    }

    let depth = branches.keys().next_back().map_or(0, |last| last + 1);
    Ok((0..depth)
        .map(|level| branches.remove(&level).unwrap_or_default())
        .collect())
}

/// Parse a `LEVEL=A,B` argument into its level and values
pub fn parse_level_filter(arg: &str) -> Result<(usize, Vec<String>), ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidLevelFilter {
        arg: arg.to_string(),
        reason: reason.to_string(),
    };

    let (level, values) = arg
        .split_once('=')
        .ok_or_else(|| invalid("expected LEVEL=VALUE[,VALUE...]"))?;

    let level = level
        .trim()
        .parse::<usize>()
        .map_err(|_| invalid("level must be a non-negative integer"))?;

    let values: Vec<String> = values
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
        .collect();

    if values.is_empty() {
        return Err(invalid("at least one value is required"));
    }

    Ok((level, values))
}
