//! Multi-hop extension transforms.

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use super::error::TranspileError;
use super::graph::ExtensionGraph;
use crate::BoxError;
use crate::path;

/// A registered transform step.
pub type TransformFn = Arc<dyn Fn(&mut File) -> Result<(), BoxError> + Send + Sync>;

// =============================================================================
// File
// =============================================================================

/// The unit a transform chain works on.
///
/// Holds the extension-less path, the current extension and the payload.
/// Every step mutates the same `File`; the extension advances after each hop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct File {
    base: String,
    ext: String,
    /// Current content.
    pub data: Vec<u8>,
}

impl File {
    /// Create a file, splitting the extension off `path`.
    pub fn new(path: &str, data: impl Into<Vec<u8>>) -> Self {
        Self {
            base: path::strip_ext(path).to_string(),
            ext: path::ext(path).to_string(),
            data: data.into(),
        }
    }

    /// Path with the current extension.
    pub fn path(&self) -> String {
        format!("{}{}", self.base, self.ext)
    }

    /// Path without extension.
    pub fn base(&self) -> &str {
        &self.base
    }

    /// Current extension.
    pub fn ext(&self) -> &str {
        &self.ext
    }

    /// Content as UTF-8.
    pub fn text(&self) -> Result<&str, std::str::Utf8Error> {
        std::str::from_utf8(&self.data)
    }
}

// =============================================================================
// Transpiler
// =============================================================================

/// Registry of extension transforms and the graph that chains them.
///
/// Build it once at startup, then share it behind an `Arc`; every query takes
/// `&self`.
///
/// # Example
///
/// ```
/// use genfs::transform::Transpiler;
///
/// let mut tr = Transpiler::new();
/// tr.add(".svelte", ".svelte", |file| {
///     file.data = format!("<main>{}</main>", file.text()?).into_bytes();
///     Ok(())
/// })?;
/// tr.add(".svelte", ".jsx", |file| {
///     file.data = format!("export default function(){{return {}}}", file.text()?).into_bytes();
///     Ok(())
/// })?;
///
/// let out = tr.transpile("hello.svelte", ".jsx", "<h1>hi</h1>")?;
/// assert_eq!(out, b"export default function(){return <main><h1>hi</h1></main>}");
/// # Ok::<(), genfs::transform::TranspileError>(())
/// ```
#[derive(Default)]
pub struct Transpiler {
    graph: ExtensionGraph,
    loops: FxHashMap<String, Vec<TransformFn>>,
    edges: FxHashMap<String, TransformFn>,
}

fn edge_key(from: &str, to: &str) -> String {
    format!("{from}>{to}")
}

impl Transpiler {
    /// Create an empty transpiler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a transform.
    ///
    /// With `from == to` the function joins that extension's loop list and
    /// runs, in registration order, every time a chain visits the extension.
    /// Otherwise it becomes the single edge `from → to`; registering the same
    /// edge twice fails with [`TranspileError::DuplicateEdge`].
    pub fn add<F>(&mut self, from: &str, to: &str, f: F) -> Result<(), TranspileError>
    where
        F: Fn(&mut File) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        if from == to {
            self.loops.entry(from.to_string()).or_default().push(Arc::new(f));
            return Ok(());
        }
        if !self.graph.add_edge(from, to) {
            return Err(TranspileError::DuplicateEdge {
                from: from.to_string(),
                to: to.to_string(),
            });
        }
        self.edges.insert(edge_key(from, to), Arc::new(f));
        Ok(())
    }

    /// Minimum-hop list of extensions from `from` to `to`, both included.
    pub fn path(&self, from: &str, to: &str) -> Result<Vec<String>, TranspileError> {
        if from == to {
            return Ok(vec![from.to_string()]);
        }
        self.graph
            .shortest_path(from, to)
            .ok_or_else(|| TranspileError::no_path(from, to))
    }

    /// Check if content with extension `from` can become `to`.
    pub fn has_path(&self, from: &str, to: &str) -> bool {
        self.path(from, to).is_ok()
    }

    /// Transform `code` read from `from_path` into extension `to_ext`.
    pub fn transpile(
        &self,
        from_path: &str,
        to_ext: &str,
        code: impl Into<Vec<u8>>,
    ) -> Result<Vec<u8>, TranspileError> {
        let mut file = File::new(from_path, code);
        self.transpile_file(&mut file, to_ext)?;
        Ok(file.data)
    }

    /// Transform a file in place, advancing its extension to `to_ext`.
    pub fn transpile_file(&self, file: &mut File, to_ext: &str) -> Result<(), TranspileError> {
        let hops = self.path(file.ext(), to_ext)?;
        tracing::trace!(path = %file.path(), ?hops, "transpile");

        self.run_loops(file, &hops[0])?;
        for pair in hops.windows(2) {
            let (prev, cur) = (&pair[0], &pair[1]);
            if let Some(f) = self.edges.get(&edge_key(prev, cur)) {
                f(file).map_err(|source| TranspileError::Transform {
                    path: file.path(),
                    from: prev.clone(),
                    to: cur.clone(),
                    source,
                })?;
            }
            file.ext = cur.clone();
            self.run_loops(file, cur)?;
        }
        Ok(())
    }

    fn run_loops(&self, file: &mut File, ext: &str) -> Result<(), TranspileError> {
        let Some(loops) = self.loops.get(ext) else {
            return Ok(());
        };
        for f in loops {
            f(file).map_err(|source| TranspileError::Transform {
                path: file.path(),
                from: ext.to_string(),
                to: ext.to_string(),
                source,
            })?;
        }
        Ok(())
    }

    /// Pick the cheapest reachable extension among `accepted`.
    ///
    /// Candidates are compared by hop count from `from`; ties go to whichever
    /// comes first in `accepted`. `from` itself counts as zero hops.
    pub fn best(&self, from: &str, accepted: &[&str]) -> Result<String, TranspileError> {
        let Some(distances) = self.graph.distances(from) else {
            return if accepted.contains(&from) {
                Ok(from.to_string())
            } else {
                Err(TranspileError::no_path(from, &accepted.join("|")))
            };
        };

        let mut start = 0;
        while start < distances.len() {
            let d = distances[start].1;
            let end = distances[start..]
                .iter()
                .position(|&(_, dd)| dd != d)
                .map_or(distances.len(), |n| start + n);
            let bucket = &distances[start..end];
            if let Some(ext) = accepted
                .iter()
                .find(|ext| bucket.iter().any(|(e, _)| e == *ext))
            {
                return Ok(ext.to_string());
            }
            start = end;
        }
        Err(TranspileError::no_path(from, &accepted.join("|")))
    }

    /// The transform graph.
    pub fn graph(&self) -> &ExtensionGraph {
        &self.graph
    }

    /// Registered extensions in first-seen order.
    ///
    /// Extensions with only loop functions are not part of the graph.
    pub fn extensions(&self) -> impl Iterator<Item = &str> {
        self.graph.extensions()
    }
}

impl fmt::Debug for Transpiler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut edges: Vec<_> = self.edges.keys().collect();
        edges.sort();
        f.debug_struct("Transpiler")
            .field("edges", &edges)
            .field("loops", &self.loops.keys().collect::<Vec<_>>())
            .finish()
    }
}
