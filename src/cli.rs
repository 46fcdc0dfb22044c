// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, Subcommand, ValueEnum};

/// Command-line arguments for `mimir`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "mimir",
    version,
    about = "Incremental, parallel build engine driven by a declarative build file.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the build file (YAML or TOML).
    #[arg(
        short = 'f',
        long = "file",
        value_name = "PATH",
        default_value = "build.yaml"
    )]
    pub file: String,

    /// Number of parallel jobs.
    #[arg(short = 'j', long = "jobs", value_name = "N", default_value_t = 1)]
    pub jobs: usize,

    /// Print what would run without executing commands.
    #[arg(short = 'n', long = "dry-run")]
    pub dry_run: bool,

    /// Keep building remaining targets after one fails.
    #[arg(short = 'k', long = "keep-going")]
    pub keep_going: bool,

    /// Verbose status output (include commands).
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Disable colored output.
    #[arg(long = "no-color")]
    pub no_color: bool,

    /// Logging level (error, warn, info, debug, trace). Falls back to the
    /// `MIMIR_LOG` environment variable, then to warnings only.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Option<BuildCommand>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum BuildCommand {
    /// Build targets from the build file (default).
    Build,
    /// Clear the signature cache and remove the cache directory.
    Clean,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
