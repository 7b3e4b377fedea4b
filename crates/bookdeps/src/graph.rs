//! Workbook dependency graph
//!
//! Nodes are canonical workbook names. An edge `B -> A` means "B is required
//! by A": a formula in A reads from B.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;

use serde::ser::{Serialize, SerializeStruct, Serializer};

/// Dependency graph between workbooks
///
/// All collections are ordered, so iteration, DOT output and JSON output are
/// stable for a given input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyGraph {
    /// Every workbook seen, isolated ones included
    nodes: BTreeSet<String>,
    /// Workbook -> workbooks that depend on it (dependents)
    dependents: BTreeMap<String, BTreeSet<String>>,
    /// Workbook -> workbooks it depends on (precedents)
    precedents: BTreeMap<String, BTreeSet<String>>,
}

impl DependencyGraph {
    /// Create a new empty dependency graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from each workbook's dependency set
    ///
    /// Every key becomes a node, as does every name in a dependency set.
    pub fn from_dependencies(dependencies: &BTreeMap<String, BTreeSet<String>>) -> Self {
        let mut graph = Self::new();
        for (dependent, targets) in dependencies {
            graph.add_node(dependent);
            for dependency in targets {
                graph.add_dependency(dependency, dependent);
            }
        }
        graph
    }

    /// Add a workbook with no edges (no-op if already present)
    pub fn add_node(&mut self, name: &str) {
        if !self.nodes.contains(name) {
            self.nodes.insert(name.to_string());
        }
    }

    /// Add a dependency: `dependent` depends on `dependency`
    ///
    /// Self-edges are dropped; both names still become nodes.
    pub fn add_dependency(&mut self, dependency: &str, dependent: &str) {
        self.add_node(dependency);
        self.add_node(dependent);
        if dependency == dependent {
            return;
        }
        self.dependents
            .entry(dependency.to_string())
            .or_default()
            .insert(dependent.to_string());
        self.precedents
            .entry(dependent.to_string())
            .or_default()
            .insert(dependency.to_string());
    }

    /// All workbook names
    pub fn nodes(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(String::as_str)
    }

    /// Number of workbooks
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges
    pub fn edge_count(&self) -> usize {
        self.dependents.values().map(BTreeSet::len).sum()
    }

    /// Check whether any edge exists
    pub fn has_edges(&self) -> bool {
        self.dependents.values().any(|set| !set.is_empty())
    }

    /// Edges as `(dependency, dependent)` pairs
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str)> {
        self.dependents.iter().flat_map(|(dependency, dependents)| {
            dependents
                .iter()
                .map(move |dependent| (dependency.as_str(), dependent.as_str()))
        })
    }

    /// Workbooks that depend on `name`
    pub fn dependents_of(&self, name: &str) -> impl Iterator<Item = &str> {
        self.dependents
            .get(name)
            .into_iter()
            .flat_map(|set| set.iter().map(String::as_str))
    }

    /// Workbooks `name` depends on
    pub fn dependencies_of(&self, name: &str) -> impl Iterator<Item = &str> {
        self.precedents
            .get(name)
            .into_iter()
            .flat_map(|set| set.iter().map(String::as_str))
    }

    /// Check whether `name` transitively depends on itself
    ///
    /// A workbook that only depends on a cycle without being part of it is
    /// not reported.
    pub fn has_cycle_through(&self, name: &str) -> bool {
        self.reaches(name, name)
    }

    /// Check whether any workbook transitively depends on itself
    pub fn has_cycle(&self) -> bool {
        let mut visited = BTreeSet::new();
        let mut in_stack = BTreeSet::new();
        self.nodes()
            .any(|name| self.detect_cycle(name, &mut visited, &mut in_stack))
    }

    /// Workbooks that sit on a dependency cycle
    pub fn cycles(&self) -> BTreeSet<&str> {
        self.nodes()
            .filter(|name| self.has_cycle_through(name))
            .collect()
    }

    /// Whether `to` is reachable from `from` along at least one edge
    fn reaches(&self, from: &str, to: &str) -> bool {
        let mut stack: Vec<&str> = self.dependencies_of(from).collect();
        let mut seen = BTreeSet::new();
        while let Some(current) = stack.pop() {
            if current == to {
                return true;
            }
            if seen.insert(current) {
                stack.extend(self.dependencies_of(current));
            }
        }
        false
    }

    fn detect_cycle<'a>(
        &'a self,
        name: &'a str,
        visited: &mut BTreeSet<&'a str>,
        in_stack: &mut BTreeSet<&'a str>,
    ) -> bool {
        if in_stack.contains(name) {
            return true;
        }
        if visited.contains(name) {
            return false;
        }

        visited.insert(name);
        in_stack.insert(name);

        for precedent in self.dependencies_of(name) {
            if self.detect_cycle(precedent, visited, in_stack) {
                return true;
            }
        }

        in_stack.remove(name);
        false
    }

    /// Render as a Graphviz digraph
    ///
    /// Every node is declared, so isolated workbooks appear in the drawing.
    pub fn to_dot(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "digraph workbooks {{");
        let _ = writeln!(out, "  rankdir=LR;");
        let _ = writeln!(out, "  node [shape=box];");

        for name in &self.nodes {
            let _ = writeln!(out, "  \"{}\";", escape_dot(name));
        }
        for (dependency, dependent) in self.edges() {
            let _ = writeln!(
                out,
                "  \"{}\" -> \"{}\";",
                escape_dot(dependency),
                escape_dot(dependent)
            );
        }

        out.push_str("}\n");
        out
    }
}

impl Serialize for DependencyGraph {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(serde::Serialize)]
        struct Edge<'a> {
            from: &'a str,
            to: &'a str,
        }

        let edges: Vec<Edge<'_>> = self
            .edges()
            .map(|(from, to)| Edge { from, to })
            .collect();

        let mut state = serializer.serialize_struct("DependencyGraph", 2)?;
        state.serialize_field("nodes", &self.nodes)?;
        state.serialize_field("edges", &edges)?;
        state.end()
    }
}

fn escape_dot(name: &str) -> String {
    name.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn deps(entries: &[(&str, &[&str])]) -> BTreeMap<String, BTreeSet<String>> {
        entries
            .iter()
            .map(|(name, targets)| {
                (
                    name.to_string(),
                    targets.iter().map(|t| t.to_string()).collect(),
                )
            })
            .collect()
    }

    #[test]
    fn test_add_dependency() {
        let mut graph = DependencyGraph::new();
        graph.add_dependency("B.xlsx", "A.xlsx");

        assert!(graph.dependents_of("B.xlsx").any(|n| n == "A.xlsx"));
        assert!(graph.dependencies_of("A.xlsx").any(|n| n == "B.xlsx"));
        assert_eq!(graph.edges().collect::<Vec<_>>(), vec![("B.xlsx", "A.xlsx")]);
    }

    #[test]
    fn test_self_edges_dropped() {
        let mut graph = DependencyGraph::new();
        graph.add_dependency("A.xlsx", "A.xlsx");
        assert_eq!(graph.node_count(), 1);
        assert_eq!(graph.edge_count(), 0);
        assert!(!graph.has_edges());
    }

    #[test]
    fn test_isolated_nodes_kept() {
        let graph = DependencyGraph::from_dependencies(&deps(&[
            ("A.xlsx", &["B.xlsx"]),
            ("B.xlsx", &[]),
            ("C.xlsx", &[]),
        ]));
        assert_eq!(
            graph.nodes().collect::<Vec<_>>(),
            vec!["A.xlsx", "B.xlsx", "C.xlsx"]
        );
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn test_dependency_targets_become_nodes() {
        let graph = DependencyGraph::from_dependencies(&deps(&[("A.xlsx", &["Ghost.xlsx"])]));
        assert_eq!(graph.node_count(), 2);
    }

    #[test]
    fn test_duplicate_edges_collapse() {
        let mut graph = DependencyGraph::new();
        graph.add_dependency("B.xlsx", "A.xlsx");
        graph.add_dependency("B.xlsx", "A.xlsx");
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn test_cycles() {
        let graph = DependencyGraph::from_dependencies(&deps(&[
            ("A.xlsx", &["B.xlsx"]),
            ("B.xlsx", &["C.xlsx"]),
            ("C.xlsx", &["A.xlsx"]),
            ("D.xlsx", &["A.xlsx"]),
        ]));

        assert!(graph.has_cycle_through("A.xlsx"));
        assert!(!graph.has_cycle_through("D.xlsx"));
        assert!(graph.has_cycle());
        assert_eq!(
            graph.cycles().into_iter().collect::<Vec<_>>(),
            vec!["A.xlsx", "B.xlsx", "C.xlsx"]
        );
    }

    #[test]
    fn test_dependent_of_cycle_is_not_on_it() {
        // A <-> B, and D reads from A
        let graph = DependencyGraph::from_dependencies(&deps(&[
            ("A.xlsx", &["B.xlsx"]),
            ("B.xlsx", &["A.xlsx"]),
            ("D.xlsx", &["A.xlsx"]),
        ]));

        let cycles = graph.cycles();
        assert_eq!(cycles.iter().copied().collect::<Vec<_>>(), vec!["A.xlsx", "B.xlsx"]);
        for name in graph.nodes() {
            assert_eq!(
                graph.has_cycle_through(name),
                cycles.contains(name),
                "{name}"
            );
        }
        assert!(graph.has_cycle());
    }

    #[test]
    fn test_acyclic() {
        let graph = DependencyGraph::from_dependencies(&deps(&[
            ("A.xlsx", &["B.xlsx", "C.xlsx"]),
            ("B.xlsx", &["C.xlsx"]),
        ]));
        assert!(!graph.has_cycle_through("A.xlsx"));
        assert!(!graph.has_cycle());
        assert!(graph.cycles().is_empty());
    }

    #[test]
    fn test_to_dot() {
        let graph = DependencyGraph::from_dependencies(&deps(&[
            ("A.xlsx", &["B \"v2\".xlsx"]),
            ("Lonely.xlsx", &[]),
        ]));
        let dot = graph.to_dot();

        assert!(dot.starts_with("digraph workbooks {"));
        assert!(dot.contains("  \"Lonely.xlsx\";"));
        assert!(dot.contains("  \"B \\\"v2\\\".xlsx\" -> \"A.xlsx\";"));
        assert!(dot.ends_with("}\n"));
    }

    #[test]
    fn test_serialize() {
        let graph = DependencyGraph::from_dependencies(&deps(&[
            ("A.xlsx", &["B.xlsx"]),
            ("B.xlsx", &[]),
        ]));
        let json = serde_json::to_value(&graph).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "nodes": ["A.xlsx", "B.xlsx"],
                "edges": [{"from": "B.xlsx", "to": "A.xlsx"}]
            })
        );
    }
}
