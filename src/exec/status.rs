// src/exec/status.rs

//! Human-readable status lines, serialized across workers.

use std::fmt;
use std::sync::Mutex;

const COLOR_GREEN: &str = "\x1b[32m";
const COLOR_RED: &str = "\x1b[31m";
const COLOR_YELLOW: &str = "\x1b[33m";
const COLOR_RESET: &str = "\x1b[0m";

/// Per-target status vocabulary. The strings are free-form for consumers;
/// nothing in the engine parses them back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// The target is about to run its command.
    Build,
    /// Progress-callback variant emitted when a target is picked up.
    Building,
    /// Outputs present and signature unchanged; nothing to do.
    UpToDate,
    Success,
    Failed,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Build => "BUILD",
            Status::Building => "BUILDING",
            Status::UpToDate => "UP-TO-DATE",
            Status::Success => "SUCCESS",
            Status::Failed => "FAILED",
        }
    }

    fn color(self) -> &'static str {
        match self {
            Status::Success | Status::UpToDate => COLOR_GREEN,
            Status::Failed => COLOR_RED,
            Status::Build => COLOR_YELLOW,
            Status::Building => COLOR_RESET,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Prints `[ STATUS ] target` lines under its own mutex so lines from
/// concurrent workers never interleave. This lock is never held together
/// with the scheduler lock.
#[derive(Debug, Default)]
pub struct StatusPrinter {
    color: bool,
    verbose: bool,
    output: Mutex<()>,
}

impl StatusPrinter {
    pub fn new(color: bool, verbose: bool) -> Self {
        Self {
            color,
            verbose,
            output: Mutex::new(()),
        }
    }

    /// Print one status line; `message` (usually the command) is appended
    /// only in verbose mode.
    pub fn print(&self, status: Status, target: &str, message: Option<&str>) {
        let _guard = self.output.lock().unwrap();

        let (color, reset) = if self.color {
            (status.color(), COLOR_RESET)
        } else {
            ("", "")
        };

        match message.filter(|_| self.verbose) {
            Some(message) => {
                println!("{color}[ {status} ] {target}\n  {message}{reset}");
            }
            None => {
                println!("{color}[ {status} ] {target}{reset}");
            }
        }
    }
}
