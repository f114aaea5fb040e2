//! dirpaths - filtered directory path enumeration
//!
//! Entry point for the CLI application.

use anyhow::{Context, Result};
use clap::Parser;
use dirpaths::config::{tree_branches, CliArgs, CliConfig, Command, OutputFormat};
use dirpaths::progress::{print_header, print_summary, ProgressReporter};
use dirpaths::{DirPaths, DirTree, WalkReport};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::process::ExitCode;
use std::sync::atomic::Ordering;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let args = CliArgs::parse();

    setup_logging(args.verbose(), args.quiet)?;

    if let Some(Command::Tree {
        root,
        folder_include,
        folder_exclude,
        json,
        ..
    }) = &args.command
    {
        return run_tree(root, folder_include, folder_exclude, *json);
    }

    let config = CliConfig::from_args(args).context("Invalid configuration")?;
    run_walk(config)
}

fn run_walk(config: CliConfig) -> Result<()> {
    let dirpaths = DirPaths::new(config.roots.clone(), config.walk.clone())
        .context("Invalid configuration")?;

    // Setup signal handler for graceful shutdown
    let shutdown_flag = dirpaths.shutdown_flag();
    ctrlc::set_handler(move || {
        eprintln!("\nInterrupt received, shutting down...");
        shutdown_flag.store(true, Ordering::SeqCst);
    })
    .context("Failed to set signal handler")?;

    if config.show_summary {
        let mode = if config.walk.parallelize {
            format!("parallel ({} workers)", config.walk.worker_count)
        } else {
            "sequential".to_string()
        };
        print_header(dirpaths.roots(), &mode, dirpaths.is_filtered());
    }

    let report = if config.show_progress {
        let progress = ProgressReporter::new();
        progress.set_status("Walking...");

        let reporter = progress.clone();
        let result = dirpaths.run_with_progress(move |p| reporter.update(&p));

        match &result {
            Ok(report) if report.completed => progress.finish("Walk completed"),
            Ok(_) => progress.finish("Walk interrupted"),
            Err(_) => progress.finish_and_clear(),
        }
        result
    } else {
        dirpaths.run()
    }
    .context("Walk failed")?;

    write_paths(&report, config.format).context("Failed to write output")?;

    if config.show_summary {
        print_summary(&report);
    }

    if !report.completed {
        info!("Walk was interrupted before completion");
    }

    if !report.warnings.is_empty() {
        info!(warnings = report.warnings.len(), "Walk completed with unreadable directories");
    }

    Ok(())
}

fn run_tree(root: &Path, folder_include: &[String], folder_exclude: &[String], json: bool) -> Result<()> {
    let branches = tree_branches(folder_include, folder_exclude).context("Invalid configuration")?;
    let branches = (!branches.is_empty()).then_some(branches.as_slice());

    let tree = DirTree::build(root, branches)
        .with_context(|| format!("Failed to build tree of {}", root.display()))?;

    let mut out = io::stdout().lock();
    if json {
        writeln!(out, "{}", tree.to_json()?)?;
    } else {
        write!(out, "{}", tree.render())?;
    }
    out.flush()?;

    Ok(())
}

fn write_paths(report: &WalkReport, format: OutputFormat) -> Result<()> {
    let mut out = BufWriter::new(io::stdout().lock());

    match format {
        OutputFormat::Lines => {
            for path in report {
                writeln!(out, "{}", path)?;
            }
        }
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut out, report)?;
            writeln!(out)?;
        }
    }

    out.flush()?;
    Ok(())
}

fn setup_logging(verbose: bool, quiet: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("dirpaths=debug,warn")
    } else if quiet {
        EnvFilter::new("dirpaths=error")
    } else {
        EnvFilter::new("dirpaths=info,warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    Ok(())
}
