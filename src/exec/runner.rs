// src/exec/runner.rs

//! Pluggable execution of opaque shell command strings.
//!
//! The engine itself only calls [`CommandRunner::run_simple`]; the richer
//! [`CommandRunner::run`] surface exists for embedders that want captured
//! output or a working directory. Runners must tolerate concurrent calls
//! from executor workers.

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Command;
use std::sync::Mutex;
use std::time::Duration;

use tracing::{debug, warn};

/// Result of one command execution.
#[derive(Debug, Clone, Default)]
pub struct CommandResult {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    pub timed_out: bool,
}

impl CommandResult {
    pub fn success(&self) -> bool {
        self.exit_code == 0 && !self.timed_out
    }
}

/// Options for one command execution.
#[derive(Debug, Clone, Default)]
pub struct CommandOptions {
    /// Working directory; `None` inherits the current one.
    pub working_dir: Option<PathBuf>,
    /// Advisory timeout. [`SystemCommandRunner`] does not enforce it;
    /// runners that do surface expiry through `timed_out`.
    pub timeout: Option<Duration>,
    /// Capture stdout/stderr instead of inheriting the console.
    pub capture_output: bool,
}

pub trait CommandRunner: Send + Sync {
    fn run(&self, command: &str, options: &CommandOptions) -> CommandResult;

    /// Convenience: success of [`CommandRunner::run`] with default options.
    fn run_simple(&self, command: &str) -> bool {
        self.run(command, &CommandOptions::default()).success()
    }
}

/// Default runner: hands the command string to the platform shell.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemCommandRunner;

impl SystemCommandRunner {
    pub fn new() -> Self {
        Self
    }

    fn shell(command: &str) -> Command {
        if cfg!(windows) {
            let mut cmd = Command::new("cmd");
            cmd.arg("/C").arg(command);
            cmd
        } else {
            let mut cmd = Command::new("sh");
            cmd.arg("-c").arg(command);
            cmd
        }
    }
}

impl CommandRunner for SystemCommandRunner {
    fn run(&self, command: &str, options: &CommandOptions) -> CommandResult {
        debug!(command = %command, "running shell command");

        let mut cmd = Self::shell(command);
        if let Some(dir) = &options.working_dir {
            cmd.current_dir(dir);
        }

        if options.capture_output {
            match cmd.output() {
                Ok(output) => CommandResult {
                    exit_code: output.status.code().unwrap_or(-1),
                    stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                    stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                    timed_out: false,
                },
                Err(err) => {
                    warn!(command = %command, error = %err, "failed to spawn command");
                    CommandResult {
                        exit_code: -1,
                        ..CommandResult::default()
                    }
                }
            }
        } else {
            match cmd.status() {
                Ok(status) => CommandResult {
                    exit_code: status.code().unwrap_or(-1),
                    ..CommandResult::default()
                },
                Err(err) => {
                    warn!(command = %command, error = %err, "failed to spawn command");
                    CommandResult {
                        exit_code: -1,
                        ..CommandResult::default()
                    }
                }
            }
        }
    }
}

type CommandHandler = Box<dyn Fn(&str, &CommandOptions) -> CommandResult + Send + Sync>;

#[derive(Default)]
struct MockState {
    default_result: CommandResult,
    results: HashMap<String, CommandResult>,
    handler: Option<CommandHandler>,
    last_command: String,
    command_count: usize,
}

/// Scripted runner for tests: returns canned results per command (or from a
/// handler closure) and records what it was asked to run. All state is
/// behind a mutex so it satisfies the concurrent-callability contract.
#[derive(Default)]
pub struct MockCommandRunner {
    state: Mutex<MockState>,
}

impl MockCommandRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_default_result(&self, result: CommandResult) {
        self.state.lock().unwrap().default_result = result;
    }

    pub fn set_result_for(&self, command: impl Into<String>, result: CommandResult) {
        self.state
            .lock()
            .unwrap()
            .results
            .insert(command.into(), result);
    }

    pub fn set_handler(
        &self,
        handler: impl Fn(&str, &CommandOptions) -> CommandResult + Send + Sync + 'static,
    ) {
        self.state.lock().unwrap().handler = Some(Box::new(handler));
    }

    pub fn last_command(&self) -> String {
        self.state.lock().unwrap().last_command.clone()
    }

    pub fn command_count(&self) -> usize {
        self.state.lock().unwrap().command_count
    }

    pub fn reset(&self) {
        *self.state.lock().unwrap() = MockState::default();
    }
}

impl CommandRunner for MockCommandRunner {
    fn run(&self, command: &str, options: &CommandOptions) -> CommandResult {
        let mut state = self.state.lock().unwrap();
        state.last_command = command.to_string();
        state.command_count += 1;

        if let Some(handler) = &state.handler {
            return handler(command, options);
        }

        state
            .results
            .get(command)
            .cloned()
            .unwrap_or_else(|| state.default_result.clone())
    }
}
