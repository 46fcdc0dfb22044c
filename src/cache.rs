// src/cache.rs

//! Persistent mapping from target name to its last successful signature.
//!
//! The on-disk format is one `name=signature` entry per line in
//! `<dir>/cache.txt`; the first `=` on a line is the separator and lines
//! without one are skipped on load. A missing or unreadable file is treated
//! as an empty cache, never as an error.
//!
//! The in-memory map sits behind a reader-writer lock so executor workers
//! can check staleness concurrently while completions write new entries.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use tracing::{debug, warn};

/// Default cache directory, relative to the working directory.
pub const DEFAULT_CACHE_DIR: &str = ".mimir";

/// File name of the serialized cache inside the cache directory.
pub const CACHE_FILE_NAME: &str = "cache.txt";

#[derive(Debug)]
pub struct Cache {
    dir: PathBuf,
    file: PathBuf,
    signatures: RwLock<HashMap<String, String>>,
}

impl Default for Cache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_DIR)
    }
}

impl Cache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let file = dir.join(CACHE_FILE_NAME);
        Self {
            dir,
            file,
            signatures: RwLock::new(HashMap::new()),
        }
    }

    /// Replace the in-memory map with the contents of the cache file.
    ///
    /// Returns `false` when the file cannot be opened; the map is cleared
    /// either way, so callers may treat both outcomes as "start empty".
    /// Lines without a `=` separator are skipped, which also tolerates a
    /// file truncated by an interrupted save.
    pub fn load(&self) -> bool {
        let mut signatures = self.signatures.write().unwrap();
        signatures.clear();

        let file = match File::open(&self.file) {
            Ok(file) => file,
            Err(err) => {
                debug!(file = ?self.file, error = %err, "no cache file; starting empty");
                return false;
            }
        };

        for line in BufReader::new(file).lines() {
            let line = match line {
                Ok(line) => line,
                Err(err) => {
                    warn!(file = ?self.file, error = %err, "stopping cache load mid-file");
                    break;
                }
            };
            match line.split_once('=') {
                Some((name, signature)) => {
                    signatures.insert(name.to_string(), signature.to_string());
                }
                None => {
                    if !line.is_empty() {
                        debug!(line = %line, "skipping unparseable cache line");
                    }
                }
            }
        }

        debug!(entries = signatures.len(), file = ?self.file, "cache loaded");
        true
    }

    /// Serialize every entry as `name=signature`, creating the cache
    /// directory first. Holds only a read guard: the snapshot is consistent
    /// but concurrent readers are not blocked. Entry order is unspecified.
    pub fn save(&self) -> bool {
        let signatures = self.signatures.read().unwrap();

        if let Err(err) = fs::create_dir_all(&self.dir) {
            warn!(dir = ?self.dir, error = %err, "cannot create cache directory");
            return false;
        }

        let file = match File::create(&self.file) {
            Ok(file) => file,
            Err(err) => {
                warn!(file = ?self.file, error = %err, "cannot create cache file");
                return false;
            }
        };

        let mut writer = BufWriter::new(file);
        for (name, signature) in signatures.iter() {
            if let Err(err) = writeln!(writer, "{name}={signature}") {
                warn!(file = ?self.file, error = %err, "cache write failed");
                return false;
            }
        }
        if let Err(err) = writer.flush() {
            warn!(file = ?self.file, error = %err, "cache flush failed");
            return false;
        }

        debug!(entries = signatures.len(), file = ?self.file, "cache saved");
        true
    }

    /// Stored signature for a target, or the empty string when absent.
    pub fn get(&self, name: &str) -> String {
        self.signatures
            .read()
            .unwrap()
            .get(name)
            .cloned()
            .unwrap_or_default()
    }

    /// Stored signature for a target; `None` is distinct from an empty
    /// stored value.
    pub fn find(&self, name: &str) -> Option<String> {
        self.signatures.read().unwrap().get(name).cloned()
    }

    pub fn set(&self, name: impl Into<String>, signature: impl Into<String>) {
        self.signatures
            .write()
            .unwrap()
            .insert(name.into(), signature.into());
    }

    /// Erase an entry, returning whether one existed.
    pub fn remove(&self, name: &str) -> bool {
        self.signatures.write().unwrap().remove(name).is_some()
    }

    /// True iff no entry exists for `name` or the stored signature differs
    /// from `current_signature`.
    pub fn needs_rebuild(&self, name: &str, current_signature: &str) -> bool {
        self.signatures
            .read()
            .unwrap()
            .get(name)
            .map_or(true, |stored| stored != current_signature)
    }

    pub fn clear(&self) {
        self.signatures.write().unwrap().clear();
    }

    pub fn len(&self) -> usize {
        self.signatures.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.signatures.read().unwrap().is_empty()
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn file(&self) -> &Path {
        &self.file
    }
}
