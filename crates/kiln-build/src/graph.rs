//! Require graph discovered while linking a build

use std::collections::{HashMap, HashSet};

/// Directed graph of compiled modules and the paths they require.
///
/// Modules are kept in the order they were added so every query is
/// deterministic.
#[derive(Debug, Clone, Default)]
pub struct RequireGraph {
    order: Vec<String>,
    /// Map from module path to its declared requires
    edges: HashMap<String, Vec<String>>,
}

impl RequireGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a module and its requires. Re-adding a module replaces its edges.
    pub fn add_module(&mut self, path: impl Into<String>, requires: Vec<String>) {
        let path = path.into();
        if !self.edges.contains_key(&path) {
            self.order.push(path.clone());
        }
        self.edges.insert(path, requires);
    }

    /// Requires of a module, or `None` if it was never compiled
    pub fn requires_of(&self, path: &str) -> Option<&[String]> {
        self.edges.get(path).map(Vec::as_slice)
    }

    pub fn module_count(&self) -> usize {
        self.order.len()
    }

    /// Find the first require cycle, walking modules in insertion order.
    ///
    /// The returned path starts and ends with the same module.
    pub fn find_cycle(&self) -> Option<Vec<String>> {
        let mut visited = HashSet::new();
        let mut stack = Vec::new();

        for path in &self.order {
            if !visited.contains(path.as_str()) {
                if let Some(cycle) = self.find_cycle_from(path, &mut visited, &mut stack) {
                    return Some(cycle);
                }
            }
        }

        None
    }

    fn find_cycle_from<'a>(
        &'a self,
        current: &'a str,
        visited: &mut HashSet<&'a str>,
        stack: &mut Vec<&'a str>,
    ) -> Option<Vec<String>> {
        visited.insert(current);
        stack.push(current);

        if let Some(requires) = self.edges.get(current) {
            for dep in requires {
                if let Some(pos) = stack.iter().position(|p| *p == dep.as_str()) {
                    let mut cycle: Vec<String> =
                        stack[pos..].iter().map(|p| p.to_string()).collect();
                    cycle.push(dep.clone());
                    return Some(cycle);
                }
                if !visited.contains(dep.as_str()) {
                    if let Some(cycle) = self.find_cycle_from(dep, visited, stack) {
                        return Some(cycle);
                    }
                }
            }
        }

        stack.pop();
        None
    }
}
