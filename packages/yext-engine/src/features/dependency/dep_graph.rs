//! Import graph with petgraph
//!
//! Directed graph where nodes are canonical document paths and an edge
//! A → B means "A imports B". Entry documents are tracked separately so
//! unreachable imports can be purged.

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};

use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use petgraph::visit::{Bfs, EdgeRef};
use petgraph::Direction;

#[derive(Debug, Default)]
pub struct DependencyGraph {
    graph: StableDiGraph<PathBuf, ()>,

    /// Path → Node index mapping
    path_to_node: HashMap<PathBuf, NodeIndex>,

    /// Documents resolved directly by a caller
    entries: BTreeSet<PathBuf>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure_node(&mut self, path: &Path) -> NodeIndex {
        if let Some(&idx) = self.path_to_node.get(path) {
            return idx;
        }
        let idx = self.graph.add_node(path.to_path_buf());
        self.path_to_node.insert(path.to_path_buf(), idx);
        idx
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.path_to_node.contains_key(path)
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Register a document without edges
    pub fn add_document(&mut self, path: &Path) {
        self.ensure_node(path);
    }

    pub fn add_entry(&mut self, path: &Path) {
        self.ensure_node(path);
        self.entries.insert(path.to_path_buf());
    }

    pub fn remove_entry(&mut self, path: &Path) -> bool {
        self.entries.remove(path)
    }

    pub fn is_entry(&self, path: &Path) -> bool {
        self.entries.contains(path)
    }

    pub fn entries(&self) -> Vec<PathBuf> {
        self.entries.iter().cloned().collect()
    }

    /// Record that `from` imports `to`.
    ///
    /// Rejects an edge that would close a cycle and returns the full cycle
    /// `[to, ..., from, to]` instead; nothing is added in that case.
    pub fn bind(&mut self, from: &Path, to: &Path) -> Result<(), Vec<PathBuf>> {
        if from == to {
            tracing::debug!(path = %from.display(), "rejected self import");
            return Err(vec![from.to_path_buf(), to.to_path_buf()]);
        }

        let from_idx = self.ensure_node(from);
        let to_idx = self.ensure_node(to);
        if self.graph.contains_edge(from_idx, to_idx) {
            return Ok(());
        }

        if let Some(mut cycle) = self.find_path(to_idx, from_idx) {
            cycle.push(to.to_path_buf());
            tracing::debug!(from = %from.display(), to = %to.display(), len = cycle.len(), "rejected import cycle");
            return Err(cycle);
        }

        self.graph.add_edge(from_idx, to_idx, ());
        Ok(())
    }

    /// Shortest import chain `start → ... → goal` (BFS)
    fn find_path(&self, start: NodeIndex, goal: NodeIndex) -> Option<Vec<PathBuf>> {
        let mut previous: HashMap<NodeIndex, NodeIndex> = HashMap::new();
        let mut queue = VecDeque::from([start]);
        let mut seen = HashSet::from([start]);

        while let Some(idx) = queue.pop_front() {
            if idx == goal {
                let mut chain = vec![self.graph[idx].clone()];
                let mut cursor = idx;
                while let Some(&prev) = previous.get(&cursor) {
                    chain.push(self.graph[prev].clone());
                    cursor = prev;
                }
                chain.reverse();
                return Some(chain);
            }
            for next in self.graph.neighbors_directed(idx, Direction::Outgoing) {
                if seen.insert(next) {
                    previous.insert(next, idx);
                    queue.push_back(next);
                }
            }
        }
        None
    }

    /// Drop every outgoing edge of `path`
    pub fn clear_dependencies(&mut self, path: &Path) {
        let Some(&idx) = self.path_to_node.get(path) else {
            return;
        };
        let edges: Vec<_> = self
            .graph
            .edges_directed(idx, Direction::Outgoing)
            .map(|e| e.id())
            .collect();
        for edge in edges {
            self.graph.remove_edge(edge);
        }
    }

    /// Documents `path` imports directly
    pub fn dependencies(&self, path: &Path) -> Vec<PathBuf> {
        self.neighbors(path, Direction::Outgoing)
    }

    /// Documents importing `path` directly
    pub fn dependents(&self, path: &Path) -> Vec<PathBuf> {
        self.neighbors(path, Direction::Incoming)
    }

    fn neighbors(&self, path: &Path, direction: Direction) -> Vec<PathBuf> {
        match self.path_to_node.get(path) {
            Some(&idx) => self
                .graph
                .neighbors_directed(idx, direction)
                .map(|n| self.graph[n].clone())
                .collect(),
            None => Vec::new(),
        }
    }

    pub fn dependencies_transitive(&self, path: &Path) -> BTreeSet<PathBuf> {
        self.transitive(path, Direction::Outgoing)
    }

    pub fn dependents_transitive(&self, path: &Path) -> BTreeSet<PathBuf> {
        self.transitive(path, Direction::Incoming)
    }

    fn transitive(&self, path: &Path, direction: Direction) -> BTreeSet<PathBuf> {
        let mut result = BTreeSet::new();
        let Some(&start) = self.path_to_node.get(path) else {
            return result;
        };
        let mut queue = VecDeque::from([start]);
        let mut seen = HashSet::from([start]);
        while let Some(idx) = queue.pop_front() {
            for next in self.graph.neighbors_directed(idx, direction) {
                if seen.insert(next) {
                    result.insert(self.graph[next].clone());
                    queue.push_back(next);
                }
            }
        }
        result
    }

    /// Remove a document node with all its edges
    pub fn remove(&mut self, path: &Path) -> bool {
        self.entries.remove(path);
        match self.path_to_node.remove(path) {
            Some(idx) => {
                self.graph.remove_node(idx);
                true
            }
            None => false,
        }
    }

    /// Evict every node unreachable from the entries; returns the removed
    /// paths.
    pub fn purge(&mut self) -> Vec<PathBuf> {
        let mut reachable = HashSet::new();
        for entry in &self.entries {
            if let Some(&start) = self.path_to_node.get(entry) {
                let mut bfs = Bfs::new(&self.graph, start);
                while let Some(idx) = bfs.next(&self.graph) {
                    reachable.insert(idx);
                }
            }
        }

        let stale: Vec<NodeIndex> = self
            .graph
            .node_indices()
            .filter(|idx| !reachable.contains(idx))
            .collect();

        let mut removed = Vec::with_capacity(stale.len());
        for idx in stale {
            if let Some(path) = self.graph.remove_node(idx) {
                self.path_to_node.remove(&path);
                removed.push(path);
            }
        }
        removed.sort();

        if !removed.is_empty() {
            tracing::debug!(removed = removed.len(), "purged unreachable documents");
        }
        removed
    }

    pub fn clear(&mut self) {
        self.graph.clear();
        self.path_to_node.clear();
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(name: &str) -> PathBuf {
        PathBuf::from(format!("/docs/{}.yaml", name))
    }

    #[test]
    fn test_two_node_cycle_reports_full_chain() {
        let mut graph = DependencyGraph::new();
        graph.add_entry(&p("a"));
        assert!(graph.bind(&p("a"), &p("b")).is_ok());

        let cycle = graph.bind(&p("b"), &p("a")).unwrap_err();
        assert_eq!(cycle, vec![p("a"), p("b"), p("a")]);
        assert!(graph.dependencies(&p("b")).is_empty());
    }

    #[test]
    fn test_self_import() {
        let mut graph = DependencyGraph::new();
        assert_eq!(graph.bind(&p("a"), &p("a")).unwrap_err(), vec![p("a"), p("a")]);
    }

    #[test]
    fn test_longer_cycle_and_rebind() {
        let mut graph = DependencyGraph::new();
        graph.bind(&p("a"), &p("b")).unwrap();
        graph.bind(&p("b"), &p("c")).unwrap();
        // Existing edge is fine
        graph.bind(&p("a"), &p("b")).unwrap();

        let cycle = graph.bind(&p("c"), &p("a")).unwrap_err();
        assert_eq!(cycle, vec![p("a"), p("b"), p("c"), p("a")]);
    }

    #[test]
    fn test_transitive_queries() {
        let mut graph = DependencyGraph::new();
        graph.bind(&p("a"), &p("b")).unwrap();
        graph.bind(&p("b"), &p("c")).unwrap();
        graph.bind(&p("d"), &p("c")).unwrap();

        let deps: Vec<_> = graph.dependencies_transitive(&p("a")).into_iter().collect();
        assert_eq!(deps, vec![p("b"), p("c")]);

        let dependents: Vec<_> = graph.dependents_transitive(&p("c")).into_iter().collect();
        assert_eq!(dependents, vec![p("a"), p("b"), p("d")]);
    }

    #[test]
    fn test_clear_dependencies_and_purge() {
        let mut graph = DependencyGraph::new();
        graph.add_entry(&p("a"));
        graph.bind(&p("a"), &p("b")).unwrap();
        graph.bind(&p("b"), &p("c")).unwrap();

        assert!(graph.purge().is_empty());

        graph.clear_dependencies(&p("a"));
        let removed = graph.purge();
        assert_eq!(removed, vec![p("b"), p("c")]);
        assert!(graph.contains(&p("a")));
        assert_eq!(graph.node_count(), 1);
    }

    #[test]
    fn test_remove_entry_then_purge() {
        let mut graph = DependencyGraph::new();
        graph.add_entry(&p("a"));
        graph.add_entry(&p("x"));
        graph.bind(&p("a"), &p("shared")).unwrap();
        graph.bind(&p("x"), &p("shared")).unwrap();

        graph.remove_entry(&p("a"));
        assert_eq!(graph.purge(), vec![p("a")]);
        assert!(graph.contains(&p("shared")));
    }
}
