//! Path-segment radix index.
//!
//! ```text
//! insert("bud/view/index.js", ..)
//!
//! (root)
//! └── bud            marker
//!     └── view       marker
//!         └── index.js   value
//! ```
//!
//! Every insert creates marker nodes for the missing ancestors, so listing a
//! directory never needs a separate manifest.

use std::collections::BTreeMap;

#[derive(Debug)]
struct Node<V> {
    value: Option<V>,
    children: BTreeMap<String, Node<V>>,
}

impl<V> Default for Node<V> {
    fn default() -> Self {
        Self {
            value: None,
            children: BTreeMap::new(),
        }
    }
}

/// Radix index keyed by clean tree paths.
///
/// The first value inserted for a path wins; later inserts are rejected.
#[derive(Debug)]
pub struct RadixIndex<V> {
    root: Node<V>,
    len: usize,
}

impl<V> Default for RadixIndex<V> {
    fn default() -> Self {
        Self {
            root: Node::default(),
            len: 0,
        }
    }
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

impl<V> RadixIndex<V> {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value. Returns `false` (and drops `value`) if the path already
    /// holds one.
    pub fn insert(&mut self, path: &str, value: V) -> bool {
        let mut node = &mut self.root;
        for seg in segments(path) {
            node = node.children.entry(seg.to_string()).or_default();
        }
        if node.value.is_some() {
            return false;
        }
        node.value = Some(value);
        self.len += 1;
        true
    }

    fn node(&self, path: &str) -> Option<&Node<V>> {
        let mut node = &self.root;
        for seg in segments(path) {
            node = node.children.get(seg)?;
        }
        Some(node)
    }

    /// Value stored exactly at `path`.
    pub fn get(&self, path: &str) -> Option<&V> {
        self.node(path)?.value.as_ref()
    }

    /// Check if `path` is known, either holding a value or as a marker.
    pub fn contains(&self, path: &str) -> bool {
        self.node(path).is_some()
    }

    /// Check if `path` is a marker: known, holding no value itself.
    pub fn is_marker(&self, path: &str) -> bool {
        self.node(path).is_some_and(|n| n.value.is_none())
    }

    /// Deepest value at `path` or above it that satisfies `accept`.
    ///
    /// Returns the matching prefix along with the value.
    pub fn longest_prefix(&self, path: &str, accept: impl Fn(&V) -> bool) -> Option<(String, &V)> {
        let mut node = &self.root;
        let mut walked: Vec<&str> = Vec::new();
        let mut best = node
            .value
            .as_ref()
            .filter(|v| accept(v))
            .map(|v| (0, v));

        for seg in segments(path) {
            let Some(next) = node.children.get(seg) else {
                break;
            };
            node = next;
            walked.push(seg);
            if let Some(v) = node.value.as_ref().filter(|v| accept(v)) {
                best = Some((walked.len(), v));
            }
        }

        best.map(|(depth, v)| (walked[..depth].join("/"), v))
    }

    /// Direct children of `path` by name, with their values (`None` for
    /// markers). Returns `None` if `path` is unknown.
    pub fn children(&self, path: &str) -> Option<Vec<(&str, Option<&V>)>> {
        let node = self.node(path)?;
        Some(
            node.children
                .iter()
                .map(|(name, child)| (name.as_str(), child.value.as_ref()))
                .collect(),
        )
    }

    /// Number of stored values.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if no values are stored.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_insert_wins() {
        let mut index = RadixIndex::new();
        assert!(index.insert("bud/main.go", 1));
        assert!(!index.insert("bud/main.go", 2));
        assert_eq!(index.get("bud/main.go"), Some(&1));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_parent_markers() {
        let mut index = RadixIndex::new();
        index.insert("a/b/c.txt", ());
        assert!(index.is_marker("a"));
        assert!(index.is_marker("a/b"));
        assert!(!index.is_marker("a/b/c.txt"));
        assert!(index.contains(""));
        assert!(!index.contains("a/x"));
        assert!(index.get("a/b").is_none());
    }

    #[test]
    fn test_longest_prefix() {
        let mut index = RadixIndex::new();
        index.insert("public", "server");
        index.insert("public/img", "dir");
        index.insert("public/img/logo.svg", "file");

        let any = |_: &&str| true;
        assert_eq!(
            index.longest_prefix("public/img/a/b.png", any),
            Some(("public/img".to_string(), &"dir"))
        );
        assert_eq!(
            index.longest_prefix("public/x.css", any),
            Some(("public".to_string(), &"server"))
        );
        assert_eq!(index.longest_prefix("other/x.css", any), None);

        // Segment boundaries matter
        assert_eq!(index.longest_prefix("publicity/x", any), None);

        // Filtered
        let not_dir = |v: &&str| *v != "dir";
        assert_eq!(
            index.longest_prefix("public/img/a.png", not_dir),
            Some(("public".to_string(), &"server"))
        );
    }

    #[test]
    fn test_root_value() {
        let mut index = RadixIndex::new();
        index.insert("", "root");
        assert_eq!(
            index.longest_prefix("a/b", |_| true),
            Some((String::new(), &"root"))
        );
    }

    #[test]
    fn test_children() {
        let mut index = RadixIndex::new();
        index.insert("view/index.svelte", 1);
        index.insert("view/layout/main.svelte", 2);
        index.insert("view/about.svelte", 3);

        let children = index.children("view").unwrap();
        assert_eq!(
            children,
            [
                ("about.svelte", Some(&3)),
                ("index.svelte", Some(&1)),
                ("layout", None),
            ]
        );
        assert!(index.children("missing").is_none());
    }
}
