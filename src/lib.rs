// src/lib.rs

//! mimir: a small incremental, parallel build engine.
//!
//! Given a declarative build file of targets (inputs, outputs, a shell
//! command, dependency names), mimir computes a correct execution order,
//! skips work whose outputs exist and whose content signature is unchanged,
//! runs the rest with bounded parallelism in dependency order, and records
//! signatures so the next invocation can skip unchanged work again.

pub mod buildfile;
pub mod cache;
pub mod cli;
pub mod dag;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod signature;
pub mod target;

use std::io::ErrorKind;

use anyhow::{anyhow, Result};
use tracing::{info, warn};

use crate::buildfile::parse_file;
use crate::cache::Cache;
use crate::cli::{BuildCommand, CliArgs};
use crate::dag::Dag;
use crate::exec::{BuildStats, Executor, ExecutorConfig};

/// High-level entry point used by `main.rs`.
///
/// Exit-code mapping lives in `main`: `Ok` is exit 0, any `Err` is exit 1.
pub fn run(args: CliArgs) -> Result<()> {
    match &args.command {
        Some(BuildCommand::Clean) => clean(),
        Some(BuildCommand::Build) | None => build(&args),
    }
}

/// Clear the in-memory cache and remove the cache directory. A directory
/// that is already gone is fine.
fn clean() -> Result<()> {
    println!("Cleaning cache...");

    let cache = Cache::default();
    cache.clear();

    if let Err(err) = std::fs::remove_dir_all(cache.dir()) {
        if err.kind() != ErrorKind::NotFound {
            warn!(dir = ?cache.dir(), error = %err, "could not remove cache directory");
        }
    }

    println!("Cache cleaned.");
    Ok(())
}

fn build(args: &CliArgs) -> Result<()> {
    let targets = parse_file(&args.file)?;
    if targets.is_empty() {
        return Err(anyhow!("no targets found in {}", args.file));
    }
    println!("Loaded {} targets from {}", targets.len(), args.file);

    let mut dag = Dag::new();
    for target in targets {
        let name = target.name().to_string();
        if !dag.add(target) {
            warn!(target = %name, "duplicate target name; keeping the first definition");
        }
    }

    let missing = dag.validate_dependencies();
    if !missing.is_empty() {
        let mut message = String::from("missing dependencies:");
        for dep in &missing {
            message.push_str("\n  - ");
            message.push_str(dep);
        }
        return Err(anyhow!(message));
    }

    let cycle = dag.detect_cycles();
    if cycle.has_cycle {
        return Err(anyhow!(
            "cycle detected in dependency graph: {}",
            cycle.path.join(" -> ")
        ));
    }

    let cache = Cache::default();
    cache.load();

    let jobs = args.jobs.max(1);
    let executor = Executor::with_config(ExecutorConfig {
        jobs,
        dry_run: args.dry_run,
        verbose: args.verbose,
        stop_on_error: !args.keep_going,
        color_output: !args.no_color,
    });

    if args.dry_run {
        print!("[DRY RUN] ");
    }
    println!("Building with {jobs} parallel job(s)...");
    info!(file = %args.file, jobs, dry_run = args.dry_run, "starting build");

    let (success, stats) = executor.execute_with_stats(&dag, &cache);

    if !cache.save() {
        warn!(file = ?cache.file(), "failed to save build cache");
    }

    print_stats(&stats);

    if !success {
        return Err(anyhow!("build failed"));
    }
    println!("\nBuild completed successfully!");
    Ok(())
}

fn print_stats(stats: &BuildStats) {
    println!();
    println!("Build statistics:");
    println!("  Total targets:   {}", stats.total);
    println!("  Built:           {}", stats.built);
    println!("  Skipped:         {}", stats.skipped);
    println!("  Failed:          {}", stats.failed);
    println!("  Elapsed time:    {:.2}s", stats.elapsed_seconds());
}
