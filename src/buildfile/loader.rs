// src/buildfile/loader.rs

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use tracing::{debug, warn};

use crate::buildfile::expand::{expand_command, target_scope};
use crate::buildfile::model::{TomlDocument, YamlDocument};
use crate::errors::BuildFileError;
use crate::target::Target;

/// Parse a build file into targets, dispatching on the file extension.
///
/// `.yaml` / `.yml` and `.toml` are recognized; anything else is an
/// [`BuildFileError::UnknownFormat`].
pub fn parse_file(path: impl AsRef<Path>) -> Result<Vec<Target>, BuildFileError> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("yaml") | Some("yml") => parse_yaml(path),
        Some("toml") => parse_toml(path),
        _ => Err(BuildFileError::UnknownFormat(path.to_path_buf())),
    }
}

pub fn parse_yaml(path: impl AsRef<Path>) -> Result<Vec<Target>, BuildFileError> {
    let path = path.as_ref();
    let contents = read(path)?;

    let doc: YamlDocument =
        serde_yaml::from_str(&contents).map_err(|err| BuildFileError::Parse {
            path: path.to_path_buf(),
            message: match err.location() {
                Some(loc) => format!("line {}, column {}: {}", loc.line(), loc.column(), err),
                None => err.to_string(),
            },
        })?;

    let mut targets = Vec::with_capacity(doc.targets.len());
    for raw in doc.targets {
        if raw.name.is_empty() {
            warn!(file = ?path, "dropping target without a name");
            continue;
        }
        targets.push(build_target(
            raw.name,
            raw.command,
            raw.inputs,
            raw.outputs,
            raw.dependencies,
            &doc.variables,
            &doc.config,
        ));
    }

    debug!(file = ?path, targets = targets.len(), "parsed YAML build file");
    Ok(targets)
}

pub fn parse_toml(path: impl AsRef<Path>) -> Result<Vec<Target>, BuildFileError> {
    let path = path.as_ref();
    let contents = read(path)?;

    let doc: TomlDocument = toml::from_str(&contents).map_err(|err| BuildFileError::Parse {
        path: path.to_path_buf(),
        message: err.message().to_string(),
    })?;

    let mut targets = Vec::with_capacity(doc.target.len());
    for (name, raw) in doc.target {
        targets.push(build_target(
            name,
            raw.command,
            raw.inputs,
            raw.outputs,
            raw.dependencies,
            &doc.variables,
            &doc.config,
        ));
    }

    debug!(file = ?path, targets = targets.len(), "parsed TOML build file");
    Ok(targets)
}

fn read(path: &Path) -> Result<String, BuildFileError> {
    fs::read_to_string(path).map_err(|source| BuildFileError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Expand the command against the per-target scope and assemble the target.
/// Only the command is expanded; the stored lists keep their raw items.
fn build_target(
    name: String,
    command: String,
    inputs: Vec<String>,
    outputs: Vec<String>,
    dependencies: Vec<String>,
    variables: &BTreeMap<String, String>,
    config: &BTreeMap<String, String>,
) -> Target {
    let scope = target_scope(variables, &inputs, &outputs, &dependencies);
    let command = expand_command(command.trim_end(), &scope, config);

    Target::new(name)
        .with_command(command)
        .with_inputs(inputs)
        .with_outputs(outputs)
        .with_dependencies(dependencies)
}
