//! Analysis output: graph, flat dependency table and empty-state signal

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::graph::DependencyGraph;

/// One row of the dependency table: `file` reads from `depends_on`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct DependencyRow {
    pub file: String,
    pub depends_on: String,
}

/// Result of one analysis run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyReport {
    /// Every workbook and every edge
    pub graph: DependencyGraph,
    /// `(dependent, dependency)` rows, ordered by dependent then dependency
    pub table: Vec<DependencyRow>,
    /// True when no workbook depends on another
    pub no_dependencies: bool,
}

impl DependencyReport {
    /// Assemble a report from each workbook's dependency set
    ///
    /// `names` lists every workbook in the run so that isolated ones still
    /// show up as nodes.
    pub fn assemble<'a, I>(names: I, dependencies: &BTreeMap<String, BTreeSet<String>>) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut graph = DependencyGraph::from_dependencies(dependencies);
        for name in names {
            graph.add_node(name);
        }

        let table: Vec<DependencyRow> = dependencies
            .iter()
            .flat_map(|(dependent, targets)| {
                targets
                    .iter()
                    .filter(move |target| *target != dependent)
                    .map(move |target| DependencyRow {
                        file: dependent.clone(),
                        depends_on: target.clone(),
                    })
            })
            .collect();

        let no_dependencies = table.is_empty();
        Self {
            graph,
            table,
            no_dependencies,
        }
    }

    /// Check whether any workbook depends on another
    pub fn has_dependencies(&self) -> bool {
        !self.no_dependencies
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn set(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_table_ordering() {
        let mut deps = BTreeMap::new();
        deps.insert("B.xlsx".to_string(), set(&["C.xlsx", "A.xlsx"]));
        deps.insert("A.xlsx".to_string(), set(&["C.xlsx"]));
        deps.insert("C.xlsx".to_string(), set(&[]));

        let report = DependencyReport::assemble(["A.xlsx", "B.xlsx", "C.xlsx"], &deps);
        let rows: Vec<_> = report
            .table
            .iter()
            .map(|r| (r.file.as_str(), r.depends_on.as_str()))
            .collect();
        assert_eq!(
            rows,
            vec![
                ("A.xlsx", "C.xlsx"),
                ("B.xlsx", "A.xlsx"),
                ("B.xlsx", "C.xlsx"),
            ]
        );
        assert!(report.has_dependencies());
        assert_eq!(report.graph.edge_count(), 3);
    }

    #[test]
    fn test_empty_state() {
        let mut deps = BTreeMap::new();
        for name in ["X.xlsx", "Y.xlsx", "Z.xlsx"] {
            deps.insert(name.to_string(), BTreeSet::new());
        }

        let report = DependencyReport::assemble(["X.xlsx", "Y.xlsx", "Z.xlsx"], &deps);
        assert!(report.no_dependencies);
        assert!(report.table.is_empty());
        assert_eq!(report.graph.node_count(), 3);
        assert_eq!(report.graph.edge_count(), 0);
    }

    #[test]
    fn test_names_without_entries_become_nodes() {
        let report = DependencyReport::assemble(["Only.xlsx"], &BTreeMap::new());
        assert_eq!(report.graph.nodes().collect::<Vec<_>>(), vec!["Only.xlsx"]);
        assert!(report.no_dependencies);
    }

    #[test]
    fn test_self_dependency_ignored() {
        let mut deps = BTreeMap::new();
        deps.insert("A.xlsx".to_string(), set(&["A.xlsx"]));

        let report = DependencyReport::assemble(["A.xlsx"], &deps);
        assert!(report.no_dependencies);
        assert_eq!(report.graph.edge_count(), 0);
    }
}
