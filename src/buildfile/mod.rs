// src/buildfile/mod.rs

//! Build file parsing: the textual-input-to-target-list boundary.
//!
//! Two formats are supported, dispatched on file extension: YAML documents
//! with a `targets:` list, and TOML documents with `[target.<name>]`
//! tables. Both may carry `variables` and `config` maps used by command
//! expansion. The engine consumes only the resulting [`crate::target::Target`]s.

mod expand;
mod loader;
mod model;

pub use expand::{expand_command, expand_glob};
pub use loader::{parse_file, parse_toml, parse_yaml};
pub use model::{TomlDocument, TomlTarget, YamlDocument, YamlTarget};
