// src/buildfile/expand.rs

//! Variable, expression and glob expansion for build file commands.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use globset::Glob;
use regex::{Captures, Regex};
use tracing::{debug, warn};

/// Upper bound on expansion passes. Expansion is re-applied while
/// substitutions keep producing new `${...}` occurrences; a variable that
/// refers to itself stops here instead of looping forever.
const MAX_EXPANSION_PASSES: usize = 8;

fn var_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\$\{(\w+)\}").expect("static pattern"))
}

fn expr_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\$\{\{([^}]+)\}\}").expect("static pattern"))
}

fn ternary_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"^\s*(\w+)\s+if\s+config\.(\w+)\s*==\s*"([^"]+)"\s*else\s*(\w+)\s*$"#)
            .expect("static pattern")
    })
}

/// Expand `${name}` and `${{ expr }}` occurrences in a command string.
///
/// `expr` is either a plain variable name or the ternary form
/// `a if config.key == "value" else b`. An unknown name expands to the name
/// itself rather than failing; build files are user input and the command
/// is opaque to the engine anyway.
pub fn expand_command(
    command: &str,
    variables: &BTreeMap<String, String>,
    config: &BTreeMap<String, String>,
) -> String {
    let mut out = command.to_string();

    for _ in 0..MAX_EXPANSION_PASSES {
        let expanded = expr_pattern()
            .replace_all(&out, |caps: &Captures<'_>| {
                evaluate_expression(&caps[1], variables, config)
            })
            .into_owned();
        let expanded = var_pattern()
            .replace_all(&expanded, |caps: &Captures<'_>| {
                evaluate_expression(&caps[1], variables, config)
            })
            .into_owned();

        if expanded == out {
            break;
        }
        out = expanded;
    }

    out
}

fn evaluate_expression(
    expr: &str,
    variables: &BTreeMap<String, String>,
    config: &BTreeMap<String, String>,
) -> String {
    if let Some(caps) = ternary_pattern().captures(expr) {
        let chosen = if config.get(&caps[2]).map(String::as_str) == Some(&caps[3]) {
            &caps[1]
        } else {
            &caps[4]
        };
        return variables.get(chosen).cloned().unwrap_or_default();
    }

    variables
        .get(expr.trim())
        .cloned()
        .unwrap_or_else(|| expr.to_string())
}

/// Expand a single list item into file paths.
///
/// Items containing `**` are matched against every file under the literal
/// prefix directory; results are sorted so expansion is stable. Plain items
/// are kept when the path exists. Items matching nothing expand to nothing.
pub fn expand_glob(pattern: &str) -> Vec<String> {
    let Some(idx) = pattern.find("**") else {
        if Path::new(pattern).exists() {
            return vec![pattern.to_string()];
        }
        return Vec::new();
    };

    let base = &pattern[..idx];
    let base_dir = if base.is_empty() {
        Path::new(".")
    } else {
        Path::new(base)
    };

    let matcher = match Glob::new(pattern) {
        Ok(glob) => glob.compile_matcher(),
        Err(err) => {
            warn!(pattern = %pattern, error = %err, "invalid glob; expanding to nothing");
            return Vec::new();
        }
    };

    let mut files = Vec::new();
    walk_files(base_dir, &mut files);

    // Strip the `./` produced by walking the current directory so paths
    // line up with the pattern.
    let mut matches: Vec<String> = files
        .iter()
        .map(|path| path.strip_prefix("./").unwrap_or(path))
        .filter(|path| matcher.is_match(path))
        .map(|path| path.to_string_lossy().into_owned())
        .collect();
    matches.sort();

    debug!(pattern = %pattern, matches = matches.len(), "expanded glob");
    matches
}

fn walk_files(dir: &Path, out: &mut Vec<PathBuf>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            walk_files(&path, out);
        } else if path.is_file() {
            out.push(path);
        }
    }
}

/// The per-target variable scope: user variables plus the `inputs`,
/// `outputs` and `dependencies` auto-variables, each glob-expanded and
/// space-joined. The target's stored lists keep the raw items.
pub(crate) fn target_scope(
    variables: &BTreeMap<String, String>,
    inputs: &[String],
    outputs: &[String],
    dependencies: &[String],
) -> BTreeMap<String, String> {
    let mut scope = variables.clone();
    scope.insert("inputs".to_string(), expand_list(inputs));
    scope.insert("outputs".to_string(), expand_list(outputs));
    scope.insert("dependencies".to_string(), expand_list(dependencies));
    scope
}

fn expand_list(items: &[String]) -> String {
    items
        .iter()
        .flat_map(|item| expand_glob(item))
        .collect::<Vec<_>>()
        .join(" ")
}
