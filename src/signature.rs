// src/signature.rs

//! Content-addressed target signatures.
//!
//! A signature is a deterministic lowercase hex fingerprint of a target's
//! command string and the current contents of its input files. All three
//! operations are total: an unreadable input contributes an empty string
//! instead of failing, which makes the stored signature differ from any
//! future readable state and forces a rebuild.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use blake3::Hasher;
use tracing::debug;

/// Hash of a file's byte contents, or the empty string if the file cannot
/// be opened or read.
pub fn file_signature(path: impl AsRef<Path>) -> String {
    let path = path.as_ref();

    let mut file = match File::open(path) {
        Ok(file) => file,
        Err(err) => {
            debug!(path = ?path, error = %err, "input unreadable; empty file signature");
            return String::new();
        }
    };

    let mut hasher = Hasher::new();
    let mut buf = [0u8; 8192];
    loop {
        match file.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => {
                hasher.update(&buf[..n]);
            }
            Err(err) => {
                debug!(path = ?path, error = %err, "read failed; empty file signature");
                return String::new();
            }
        }
    }

    hasher.finalize().to_hex().to_string()
}

/// Hash of a command string.
pub fn command_signature(command: &str) -> String {
    hash_str(command)
}

/// Hash of the command combined with every input's file signature, in
/// declared order. Reordering inputs changes the result.
pub fn target_signature(command: &str, inputs: &[String]) -> String {
    let mut combined = String::from(command);
    for input in inputs {
        combined.push('|');
        combined.push_str(&file_signature(input));
    }
    hash_str(&combined)
}

fn hash_str(data: &str) -> String {
    blake3::hash(data.as_bytes()).to_hex().to_string()
}
