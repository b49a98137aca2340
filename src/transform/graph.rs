//! Directed graph over file extensions with unit-cost edges.

use std::collections::VecDeque;

use petgraph::algo::dijkstra;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use rustc_hash::FxHashMap;

/// A directed graph whose vertices are extensions (`".md"`, `".svelte"`).
///
/// Vertex ids are assigned in first-seen order. Edges leaving a vertex are
/// visited in registration order, so breadth-first search breaks ties
/// deterministically in favor of the edge registered first.
#[derive(Debug, Clone, Default)]
pub struct ExtensionGraph {
    ids: FxHashMap<String, NodeIndex>,
    graph: DiGraph<String, ()>,
}

impl ExtensionGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    fn node(&mut self, ext: &str) -> NodeIndex {
        if let Some(&id) = self.ids.get(ext) {
            return id;
        }
        let id = self.graph.add_node(ext.to_string());
        self.ids.insert(ext.to_string(), id);
        id
    }

    /// Insert a vertex if missing and return its id.
    pub fn add_vertex(&mut self, ext: &str) -> usize {
        self.node(ext).index()
    }

    /// Insert a directed edge. Returns `false` if it already existed.
    pub fn add_edge(&mut self, from: &str, to: &str) -> bool {
        let from = self.node(from);
        let to = self.node(to);
        if self.graph.find_edge(from, to).is_some() {
            return false;
        }
        self.graph.add_edge(from, to, ());
        true
    }

    /// Check if an extension is a vertex.
    pub fn contains(&self, ext: &str) -> bool {
        self.ids.contains_key(ext)
    }

    /// Check if a direct edge exists.
    pub fn has_edge(&self, from: &str, to: &str) -> bool {
        match (self.ids.get(from), self.ids.get(to)) {
            (Some(&f), Some(&t)) => self.graph.find_edge(f, t).is_some(),
            _ => false,
        }
    }

    /// Number of vertices.
    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    /// Check if the graph has no vertices.
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Iterate extensions in first-seen order.
    pub fn extensions(&self) -> impl Iterator<Item = &str> {
        self.graph.node_indices().map(|id| self.graph[id].as_str())
    }

    /// Shortest path by hop count, including both endpoints.
    ///
    /// Returns `None` if either extension is unknown or `to` is unreachable.
    /// A vertex reaches itself with the one-element path `[from]`.
    pub fn shortest_path(&self, from: &str, to: &str) -> Option<Vec<String>> {
        let src = *self.ids.get(from)?;
        let dst = *self.ids.get(to)?;

        let mut parent: Vec<Option<NodeIndex>> = vec![None; self.graph.node_count()];
        let mut seen = vec![false; self.graph.node_count()];
        let mut queue = VecDeque::from([src]);
        seen[src.index()] = true;

        while let Some(cur) = queue.pop_front() {
            if cur == dst {
                break;
            }
            for next in self.successors(cur) {
                if !seen[next.index()] {
                    seen[next.index()] = true;
                    parent[next.index()] = Some(cur);
                    queue.push_back(next);
                }
            }
        }
        if !seen[dst.index()] {
            return None;
        }

        let mut hops = vec![dst];
        let mut cur = dst;
        while let Some(prev) = parent[cur.index()] {
            hops.push(prev);
            cur = prev;
        }
        hops.reverse();
        Some(hops.into_iter().map(|id| self.graph[id].clone()).collect())
    }

    /// Hop distance from `from` to every reachable extension (itself at 0).
    ///
    /// Sorted by distance, then by vertex id. Returns `None` if `from` is
    /// unknown.
    pub fn distances(&self, from: &str) -> Option<Vec<(&str, usize)>> {
        let src = *self.ids.get(from)?;
        let mut reachable: Vec<(usize, NodeIndex)> = dijkstra(&self.graph, src, None, |_| 1usize)
            .into_iter()
            .map(|(id, d)| (d, id))
            .collect();
        reachable.sort_unstable();
        Some(
            reachable
                .into_iter()
                .map(|(d, id)| (self.graph[id].as_str(), d))
                .collect(),
        )
    }

    /// Direct successors in edge registration order.
    ///
    /// petgraph walks a vertex's edges newest first.
    fn successors(&self, node: NodeIndex) -> Vec<NodeIndex> {
        let mut out: Vec<_> = self
            .graph
            .edges(node)
            .map(|e| (e.id(), e.target()))
            .collect();
        out.sort_unstable_by_key(|&(id, _)| id);
        out.into_iter().map(|(_, to)| to).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(edges: &[(&str, &str)]) -> ExtensionGraph {
        let mut g = ExtensionGraph::new();
        for (from, to) in edges {
            g.add_edge(from, to);
        }
        g
    }

    #[test]
    fn test_first_seen_ids() {
        let mut g = ExtensionGraph::new();
        assert_eq!(g.add_vertex(".md"), 0);
        assert_eq!(g.add_vertex(".svelte"), 1);
        assert_eq!(g.add_vertex(".md"), 0);
        assert_eq!(g.len(), 2);
    }

    #[test]
    fn test_duplicate_edge() {
        let mut g = ExtensionGraph::new();
        assert!(g.add_edge(".md", ".svelte"));
        assert!(!g.add_edge(".md", ".svelte"));
        assert!(g.has_edge(".md", ".svelte"));
        assert!(!g.has_edge(".svelte", ".md"));
    }

    #[test]
    fn test_shortest_path() {
        let g = graph(&[(".md", ".svelte"), (".svelte", ".jsx"), (".jsx", ".js")]);
        assert_eq!(
            g.shortest_path(".md", ".js").unwrap(),
            [".md", ".svelte", ".jsx", ".js"]
        );
        assert_eq!(g.shortest_path(".md", ".md").unwrap(), [".md"]);
        assert!(g.shortest_path(".js", ".md").is_none());
        assert!(g.shortest_path(".md", ".css").is_none());
    }

    #[test]
    fn test_tie_prefers_first_registered_edge() {
        let g = graph(&[
            (".a", ".b"),
            (".a", ".c"),
            (".c", ".d"),
            (".b", ".d"),
        ]);
        assert_eq!(g.shortest_path(".a", ".d").unwrap(), [".a", ".b", ".d"]);
    }

    #[test]
    fn test_tie_prefers_first_registered_edge_late_hub() {
        // Later edges out of `.a` must not win the tie
        let g = graph(&[
            (".a", ".x"),
            (".x", ".z"),
            (".a", ".y"),
            (".y", ".z"),
            (".a", ".w"),
        ]);
        assert_eq!(g.shortest_path(".a", ".z").unwrap(), [".a", ".x", ".z"]);
        assert_eq!(g.extensions().collect::<Vec<_>>(), [".a", ".x", ".z", ".y", ".w"]);
    }

    #[test]
    fn test_distances_sorted() {
        let g = graph(&[(".md", ".svelte"), (".svelte", ".jsx"), (".md", ".html")]);
        let dist = g.distances(".md").unwrap();
        assert_eq!(
            dist,
            [(".md", 0), (".svelte", 1), (".html", 1), (".jsx", 2)]
        );
        assert!(g.distances(".css").is_none());
    }
}
