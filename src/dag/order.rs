// src/dag/order.rs

//! Cycle detection and topological ordering over a [`Dag`].

use std::collections::HashMap;

use tracing::debug;

use super::graph::Dag;

/// Outcome of [`Dag::detect_cycles`].
///
/// When a cycle exists, `path` holds the names along it with the entry node
/// repeated at the end, e.g. `["b", "c", "b"]`. The reported cycle is *some*
/// cycle of the graph, not necessarily the shortest one.
#[derive(Debug, Clone, Default)]
pub struct CycleCheck {
    pub has_cycle: bool,
    pub path: Vec<String>,
}

/// Tri-state DFS marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    OnPath,
    Finished,
}

impl Dag {
    /// Depth-first search for a directed cycle among declared dependency
    /// edges. Self references count as cycles. Unknown dependency names are
    /// traversed as leaf nodes and cannot form cycles.
    pub fn detect_cycles(&self) -> CycleCheck {
        let mut marks: HashMap<&str, Mark> = HashMap::new();
        let mut stack: Vec<&str> = Vec::new();
        let mut path: Vec<String> = Vec::new();

        for name in self.names() {
            if marks.get(name).copied().unwrap_or(Mark::Unvisited) == Mark::Unvisited
                && self.visit(name, &mut marks, &mut stack, &mut path)
            {
                debug!(cycle = ?path, "dependency cycle detected");
                return CycleCheck {
                    has_cycle: true,
                    path,
                };
            }
        }

        CycleCheck::default()
    }

    fn visit<'a>(
        &'a self,
        node: &'a str,
        marks: &mut HashMap<&'a str, Mark>,
        stack: &mut Vec<&'a str>,
        path: &mut Vec<String>,
    ) -> bool {
        marks.insert(node, Mark::OnPath);
        stack.push(node);

        if let Some(target) = self.get(node) {
            for dep in target.dependencies() {
                match marks.get(dep.as_str()).copied().unwrap_or(Mark::Unvisited) {
                    Mark::Unvisited => {
                        if self.visit(dep, marks, stack, path) {
                            return true;
                        }
                    }
                    Mark::OnPath => {
                        // The suffix of the current path starting at the
                        // first occurrence of `dep`, closed by re-appending
                        // `dep` itself.
                        let start = stack
                            .iter()
                            .position(|name| *name == dep.as_str())
                            .unwrap_or(0);
                        path.extend(stack[start..].iter().map(|name| name.to_string()));
                        path.push(dep.clone());
                        return true;
                    }
                    Mark::Finished => {}
                }
            }
        }

        marks.insert(node, Mark::Finished);
        stack.pop();
        false
    }

    /// Kahn-style topological sort: dependencies first.
    ///
    /// Each node starts with a degree equal to its number of declared
    /// dependencies; zero-degree nodes seed the queue, and popping a name
    /// decrements the degree of every target whose dependency list contains
    /// it. With a cycle present (or dependencies on unknown names) the
    /// affected nodes never reach degree zero, so the result is a partial
    /// order that may be shorter than [`Dag::len`]. Callers that need the
    /// full guarantee run [`Dag::detect_cycles`] first.
    pub fn topological_sort(&self) -> Vec<String> {
        let mut degrees: HashMap<&str, usize> = self
            .targets()
            .map(|target| (target.name(), target.dependencies().len()))
            .collect();

        let mut queue: Vec<&str> = degrees
            .iter()
            .filter(|(_, degree)| **degree == 0)
            .map(|(name, _)| *name)
            .collect();

        let mut order: Vec<String> = Vec::with_capacity(self.len());
        let mut idx = 0;

        while idx < queue.len() {
            let current = queue[idx];
            idx += 1;
            order.push(current.to_string());

            for target in self.targets() {
                if target.dependencies().iter().any(|dep| dep == current) {
                    if let Some(degree) = degrees.get_mut(target.name()) {
                        *degree = degree.saturating_sub(1);
                        if *degree == 0 {
                            queue.push(target.name());
                        }
                    }
                }
            }
        }

        if order.len() < self.len() {
            debug!(
                ordered = order.len(),
                total = self.len(),
                "topological order is partial; graph is cyclic or references unknown names"
            );
        }

        order
    }
}
