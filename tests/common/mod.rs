// tests/common/mod.rs

//! Shared scaffolding for integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use mimir::target::Target;

/// Write a file, creating parent directories as needed.
pub fn write_file(path: impl AsRef<Path>, contents: &str) {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

/// A target with only a name and a command.
pub fn cmd_target(name: &str, command: &str) -> Target {
    Target::new(name).with_command(command)
}

/// A target that copies `input` to `output` with declared paths, so the
/// incremental machinery sees both.
pub fn copy_target(name: &str, input: &PathBuf, output: &PathBuf) -> Target {
    Target::new(name)
        .with_command(format!(
            "cp {} {}",
            input.to_string_lossy(),
            output.to_string_lossy()
        ))
        .with_inputs(vec![input.to_string_lossy().into_owned()])
        .with_outputs(vec![output.to_string_lossy().into_owned()])
}
