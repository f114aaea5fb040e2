//! Progress reporting for the walker
//!
//! Provides real-time progress display using indicatif spinners. Everything
//! here writes to stderr; stdout carries the paths.

use crate::walker::{WalkProgress, WalkReport};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Duration;

/// Progress reporter that displays walk status
#[derive(Clone)]
pub struct ProgressReporter {
    bar: ProgressBar,
}

impl ProgressReporter {
    /// Create a new progress reporter
    pub fn new() -> Self {
        let bar = ProgressBar::new_spinner();

        let spinner = ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏");
        bar.set_style(spinner);

        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar }
    }

    /// Update the progress display
    pub fn update(&self, progress: &WalkProgress) {
        let msg = format!(
            "Dirs: {} | Paths: {} | Rate: {:.0} dirs/s | Queue: {} | Workers: {}/{}",
            format_number(progress.dirs),
            format_number(progress.files),
            progress.dirs_per_second(),
            progress.queue_size,
            progress.active_workers,
            progress.total_workers,
        );

        self.bar.set_message(msg);
    }

    /// Set a status message
    pub fn set_status(&self, status: &str) {
        self.bar.set_message(status.to_string());
    }

    /// Finish the progress display with a final message
    pub fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }

    /// Finish and clear the progress display
    pub fn finish_and_clear(&self) {
        self.bar.finish_and_clear();
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

/// Format a number with thousands separators
pub fn format_number(n: u64) -> String {
    let s = n.to_string();
    let bytes: Vec<_> = s.bytes().rev().collect();

    let chunks: Vec<String> = bytes
        .chunks(3)
        .map(|chunk| chunk.iter().rev().map(|&b| b as char).collect::<String>())
        .collect();

    chunks.into_iter().rev().collect::<Vec<_>>().join(",")
}

/// Print a summary of the walk results
pub fn print_summary(report: &WalkReport) {
    let stats = &report.stats;
    let duration_secs = stats.duration.as_secs_f64();
    let rate = if duration_secs > 0.0 {
        stats.dirs as f64 / duration_secs
    } else {
        0.0
    };

    let title = if report.completed {
        style("Walk Complete").green().bold()
    } else {
        style("Walk Interrupted").yellow().bold()
    };

    eprintln!();
    eprintln!("{}", title);
    eprintln!("{}", style("─".repeat(50)).dim());
    eprintln!(
        "  {} {}",
        style("Directories:").bold(),
        format_number(stats.dirs)
    );
    eprintln!("  {} {}", style("Paths:").bold(), format_number(report.len() as u64));
    eprintln!("  {} {}", style("Skipped:").bold(), format_number(stats.skipped));
    eprintln!(
        "  {} {:.1}s ({:.0} dirs/sec)",
        style("Duration:").bold(),
        duration_secs,
        rate
    );
    if stats.errors > 0 {
        eprintln!(
            "  {} {}",
            style("Errors:").yellow().bold(),
            format_number(stats.errors)
        );
        for warning in report.warnings.iter().take(10) {
            eprintln!("    {}", style(warning).dim());
        }
        if report.warnings.len() > 10 {
            eprintln!("    ... and {} more", report.warnings.len() - 10);
        }
    }
    eprintln!();
}

/// Print a header at the start of the walk
pub fn print_header(roots: &[PathBuf], mode: &str, filtered: bool) {
    eprintln!();
    eprintln!(
        "{} {}",
        style("dirpaths").cyan().bold(),
        env!("CARGO_PKG_VERSION")
    );
    eprintln!("{}", style("─".repeat(50)).dim());
    for root in roots {
        eprintln!("  {} {}", style("Root:").bold(), root.display());
    }
    eprintln!("  {} {}", style("Mode:").bold(), mode);
    eprintln!(
        "  {} {}",
        style("Filter:").bold(),
        if filtered { "on" } else { "off" }
    );
    eprintln!();
}
