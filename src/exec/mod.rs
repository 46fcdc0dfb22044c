// src/exec/mod.rs

//! Command execution: the pluggable runner and the build scheduler.

mod executor;
mod runner;
mod status;

pub use executor::{BuildStats, Executor, ExecutorConfig, ProgressCallback};
pub use runner::{
    CommandOptions, CommandResult, CommandRunner, MockCommandRunner, SystemCommandRunner,
};
pub use status::{Status, StatusPrinter};
