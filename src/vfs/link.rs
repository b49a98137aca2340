//! Output → input dependency links.
//!
//! ```text
//! inputs   (forward)            dependents (reverse)
//! bud/view/index.js ─► view/index.svelte   view/index.svelte ─► bud/view/index.js
//!                   ─► view/layout.svelte  view/layout.svelte ─► bud/view/index.js
//! ```
//!
//! Generators declare which paths they read; [`LinkGraph::affected`] walks the
//! reverse index to find every output that must be regenerated after a change.

use std::collections::VecDeque;

use rustc_hash::{FxHashMap, FxHashSet};

/// Bipartite dependency graph between generated outputs and their inputs.
#[derive(Debug, Clone, Default)]
pub struct LinkGraph {
    inputs: FxHashMap<String, FxHashSet<String>>,
    dependents: FxHashMap<String, FxHashSet<String>>,
}

impl LinkGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare that `output` was produced from `input`.
    ///
    /// Returns `false` if the link already existed. Self-links are ignored.
    pub fn link(&mut self, output: &str, input: &str) -> bool {
        if output == input {
            return false;
        }
        let added = self
            .inputs
            .entry(output.to_string())
            .or_default()
            .insert(input.to_string());
        if added {
            self.dependents
                .entry(input.to_string())
                .or_default()
                .insert(output.to_string());
        }
        added
    }

    /// Inputs declared by `output`, sorted.
    pub fn inputs(&self, output: &str) -> Vec<&str> {
        sorted(self.inputs.get(output))
    }

    /// Outputs that declared `input`, sorted.
    pub fn dependents(&self, input: &str) -> Vec<&str> {
        sorted(self.dependents.get(input))
    }

    /// Drop every link declared by `output`.
    pub fn unlink(&mut self, output: &str) {
        let Some(inputs) = self.inputs.remove(output) else {
            return;
        };
        for input in inputs {
            if let Some(outputs) = self.dependents.get_mut(&input) {
                outputs.remove(output);
                if outputs.is_empty() {
                    self.dependents.remove(&input);
                }
            }
        }
    }

    /// The changed paths plus every output reachable from them through the
    /// reverse index, each listed once, in breadth-first order.
    pub fn affected<'a>(&self, changed: impl IntoIterator<Item = &'a str>) -> Vec<String> {
        let mut seen: FxHashSet<&str> = FxHashSet::default();
        let mut order = Vec::new();
        let mut queue: VecDeque<&str> = VecDeque::new();

        for path in changed {
            if seen.insert(path) {
                queue.push_back(path);
            }
        }
        while let Some(path) = queue.pop_front() {
            order.push(path.to_string());
            for output in self.dependents(path) {
                if seen.insert(output) {
                    queue.push_back(output);
                }
            }
        }
        order
    }

    /// Number of links.
    pub fn len(&self) -> usize {
        self.inputs.values().map(FxHashSet::len).sum()
    }

    /// Check if there are no links.
    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }
}

fn sorted(set: Option<&FxHashSet<String>>) -> Vec<&str> {
    let mut out: Vec<&str> = set
        .map(|s| s.iter().map(String::as_str).collect())
        .unwrap_or_default();
    out.sort_unstable();
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_both_directions() {
        let mut links = LinkGraph::new();
        assert!(links.link("bud/index.js", "view/index.svelte"));
        assert!(!links.link("bud/index.js", "view/index.svelte"));
        assert!(links.link("bud/index.js", "view/layout.svelte"));
        assert!(!links.link("a", "a"));

        assert_eq!(
            links.inputs("bud/index.js"),
            ["view/index.svelte", "view/layout.svelte"]
        );
        assert_eq!(links.dependents("view/layout.svelte"), ["bud/index.js"]);
        assert_eq!(links.len(), 2);
    }

    #[test]
    fn test_affected_transitive() {
        let mut links = LinkGraph::new();
        links.link("b", "a");
        links.link("c", "b");
        links.link("d", "x");

        assert_eq!(links.affected(["a"]), ["a", "b", "c"]);
        assert_eq!(links.affected(["x", "a"]), ["x", "a", "d", "b", "c"]);
        assert_eq!(links.affected(["unrelated"]), ["unrelated"]);
    }

    #[test]
    fn test_affected_handles_cycles() {
        let mut links = LinkGraph::new();
        links.link("a", "b");
        links.link("b", "a");
        assert_eq!(links.affected(["a"]), ["a", "b"]);
    }

    #[test]
    fn test_unlink() {
        let mut links = LinkGraph::new();
        links.link("out", "in1");
        links.link("out", "in2");
        links.link("other", "in1");

        links.unlink("out");
        assert!(links.inputs("out").is_empty());
        assert_eq!(links.dependents("in1"), ["other"]);
        assert!(links.dependents("in2").is_empty());
        assert_eq!(links.len(), 1);
    }
}
