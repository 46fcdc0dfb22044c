// src/dag/graph.rs

use std::collections::HashMap;

use tracing::debug;

use crate::target::Target;

/// Keyed collection of build targets.
///
/// Edges point from a target to each of its declared dependencies. The
/// container accepts any input, including self references, unknown
/// dependency names and (rejected) duplicates; [`Dag::validate_dependencies`]
/// and [`Dag::detect_cycles`] report the violations before execution.
///
/// Iteration order over targets is unspecified.
#[derive(Debug, Clone, Default)]
pub struct Dag {
    targets: HashMap<String, Target>,
}

impl Dag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a target keyed by its name. Returns `false` without mutating
    /// when a target with the same name is already present.
    pub fn add(&mut self, target: Target) -> bool {
        if self.targets.contains_key(target.name()) {
            debug!(target = %target.name(), "duplicate target rejected");
            return false;
        }
        self.targets.insert(target.name().to_string(), target);
        true
    }

    /// Remove a target by name, returning whether it existed.
    pub fn remove(&mut self, name: &str) -> bool {
        self.targets.remove(name).is_some()
    }

    pub fn has(&self, name: &str) -> bool {
        self.targets.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Target> {
        self.targets.get(name)
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn clear(&mut self) {
        self.targets.clear();
    }

    pub fn targets(&self) -> impl Iterator<Item = &Target> {
        self.targets.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.targets.keys().map(|name| name.as_str())
    }

    /// Declared dependencies of a target, in declared order; empty for an
    /// unknown name.
    pub fn dependencies(&self, name: &str) -> &[String] {
        self.targets
            .get(name)
            .map(|target| target.dependencies())
            .unwrap_or(&[])
    }

    /// Every target whose dependency list contains `name`, found by scan.
    /// Order is unspecified.
    pub fn dependents(&self, name: &str) -> Vec<String> {
        self.targets
            .values()
            .filter(|target| target.dependencies().iter().any(|dep| dep == name))
            .map(|target| target.name().to_string())
            .collect()
    }

    /// Every dependency reference that does not name a registered target.
    /// A name referenced by several targets appears once per reference;
    /// callers treat the result as a multiset.
    pub fn validate_dependencies(&self) -> Vec<String> {
        let mut missing = Vec::new();
        for target in self.targets.values() {
            for dep in target.dependencies() {
                if !self.targets.contains_key(dep) {
                    missing.push(dep.clone());
                }
            }
        }
        missing
    }
}
