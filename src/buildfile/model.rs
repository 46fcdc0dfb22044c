// src/buildfile/model.rs

use std::collections::BTreeMap;

use serde::Deserialize;

/// YAML build file shape:
///
/// ```yaml
/// variables:
///   cc: gcc
/// config:
///   mode: debug
/// targets:
///   - name: app
///     command: ${cc} -o app main.c
///     inputs: [main.c]
///     outputs: [app]
///     dependencies: [generate]
/// ```
///
/// All sections are optional; multiline commands use YAML block scalars.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct YamlDocument {
    #[serde(default)]
    pub variables: BTreeMap<String, String>,

    #[serde(default)]
    pub config: BTreeMap<String, String>,

    #[serde(default)]
    pub targets: Vec<YamlTarget>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct YamlTarget {
    /// Entries with an empty name are dropped by the loader.
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub command: String,

    #[serde(default)]
    pub inputs: Vec<String>,

    #[serde(default)]
    pub outputs: Vec<String>,

    #[serde(default)]
    pub dependencies: Vec<String>,
}

/// TOML build file shape:
///
/// ```toml
/// [variables]
/// cc = "gcc"
///
/// [config]
/// mode = "debug"
///
/// [target.app]
/// command = "${cc} -o app main.c"
/// inputs = ["main.c"]
/// outputs = ["app"]
/// dependencies = ["generate"]
/// ```
///
/// Target names are the `[target.<name>]` table keys.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlDocument {
    #[serde(default)]
    pub variables: BTreeMap<String, String>,

    #[serde(default)]
    pub config: BTreeMap<String, String>,

    #[serde(default)]
    pub target: BTreeMap<String, TomlTarget>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlTarget {
    #[serde(default)]
    pub command: String,

    #[serde(default)]
    pub inputs: Vec<String>,

    #[serde(default)]
    pub outputs: Vec<String>,

    #[serde(default)]
    pub dependencies: Vec<String>,
}
