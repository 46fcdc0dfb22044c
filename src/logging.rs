// src/logging.rs

//! Tracing initialisation for the CLI.

use std::str::FromStr;

use anyhow::Result;
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::cli::LogLevel;

/// Install the global subscriber.
///
/// The diagnostic level comes from the `--log-level` flag when given,
/// otherwise from `MIMIR_LOG`. Status lines are the tool's primary output,
/// so with neither set only warnings and errors get through.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let level = cli_level
        .map(Level::from)
        .or_else(|| {
            std::env::var("MIMIR_LOG")
                .ok()
                .and_then(|value| Level::from_str(value.trim()).ok())
        })
        .unwrap_or(Level::WARN);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_level(true)
                .with_target(true),
        )
        .with(tracing_subscriber::filter::LevelFilter::from_level(level))
        .init();

    Ok(())
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        }
    }
}
