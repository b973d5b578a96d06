use serde::Serialize;
use std::collections::{BTreeSet, HashSet, VecDeque};
use std::path::{Path, PathBuf};

/// `from` refers to a type declared in `to` by the simple name `via`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct DependencyEdge {
    pub from: PathBuf,
    pub to: PathBuf,
    pub via: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Impact {
    pub direct: BTreeSet<PathBuf>,
    pub transitive: BTreeSet<PathBuf>,
}

/// Cross-file references kept as a plain edge list; cycles between files
/// are ordinary data here.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    edges: Vec<DependencyEdge>,
    seen: HashSet<DependencyEdge>,
}

impl DependencyGraph {
    pub fn add(&mut self, edge: DependencyEdge) {
        if edge.from != edge.to && self.seen.insert(edge.clone()) {
            self.edges.push(edge);
        }
    }

    /// Drops every edge leaving `file`.
    pub fn remove_from(&mut self, file: &Path) {
        self.edges.retain(|e| e.from != file);
        self.seen.retain(|e| e.from != file);
    }

    pub fn edges(&self) -> &[DependencyEdge] {
        &self.edges
    }

    pub fn edges_from<'a>(&'a self, file: &'a Path) -> impl Iterator<Item = &'a DependencyEdge> + 'a {
        self.edges.iter().filter(move |e| e.from == file)
    }

    pub fn edges_to<'a>(&'a self, file: &'a Path) -> impl Iterator<Item = &'a DependencyEdge> + 'a {
        self.edges.iter().filter(move |e| e.to == file)
    }

    pub fn importers(&self, file: &Path) -> BTreeSet<PathBuf> {
        self.edges_to(file).map(|e| e.from.clone()).collect()
    }

    pub fn dependencies(&self, file: &Path) -> BTreeSet<PathBuf> {
        self.edges_from(file).map(|e| e.to.clone()).collect()
    }

    /// Files that depend on `file` directly, and those reachable only
    /// through other dependents.
    pub fn impact(&self, file: &Path) -> Impact {
        let direct = self.importers(file);
        let mut visited: BTreeSet<PathBuf> = direct.clone();
        visited.insert(file.to_path_buf());
        let mut queue: VecDeque<PathBuf> = direct.iter().cloned().collect();
        let mut transitive = BTreeSet::new();

        while let Some(current) = queue.pop_front() {
            for user in self.importers(&current) {
                if visited.insert(user.clone()) {
                    transitive.insert(user.clone());
                    queue.push_back(user);
                }
            }
        }

        Impact { direct, transitive }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge(from: &str, to: &str, via: &str) -> DependencyEdge {
        DependencyEdge {
            from: PathBuf::from(from),
            to: PathBuf::from(to),
            via: via.to_string(),
        }
    }

    #[test]
    fn test_duplicate_and_self_edges_ignored() {
        let mut graph = DependencyGraph::default();
        graph.add(edge("A", "B", "B"));
        graph.add(edge("A", "B", "B"));
        graph.add(edge("A", "A", "A"));
        assert_eq!(graph.edges().len(), 1);
    }

    #[test]
    fn test_importers_and_dependencies() {
        let mut graph = DependencyGraph::default();
        graph.add(edge("A", "C", "C"));
        graph.add(edge("B", "C", "C"));
        assert_eq!(graph.importers(Path::new("C")).len(), 2);
        assert_eq!(graph.dependencies(Path::new("A")), BTreeSet::from([PathBuf::from("C")]));
        graph.remove_from(Path::new("A"));
        assert_eq!(graph.importers(Path::new("C")), BTreeSet::from([PathBuf::from("B")]));
    }

    #[test]
    fn test_impact_handles_cycles() {
        let mut graph = DependencyGraph::default();
        graph.add(edge("B", "A", "A"));
        graph.add(edge("C", "B", "B"));
        graph.add(edge("A", "C", "C"));
        let impact = graph.impact(Path::new("A"));
        assert_eq!(impact.direct, BTreeSet::from([PathBuf::from("B")]));
        assert_eq!(impact.transitive, BTreeSet::from([PathBuf::from("C")]));
    }
}
