// src/errors.rs

//! Error kinds surfaced before any target runs.
//!
//! The engine itself never returns out-of-band errors: executor results are
//! booleans, signature and cache operations are total. What can fail up
//! front is reading and parsing the build file; those failures are typed
//! here so the CLI can report them and exit non-zero.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BuildFileError {
    /// The file extension is neither YAML nor TOML.
    #[error("unknown build file format: {}", .0.display())]
    UnknownFormat(PathBuf),

    #[error("failed to read build file {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Syntax error; `message` carries the underlying parser's location
    /// information when available.
    #[error("parse error in {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },
}
