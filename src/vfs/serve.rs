//! Serve source files converted through a [`Transpiler`].

use std::sync::Arc;
use std::time::SystemTime;

use super::generator::{skip, FileServer, GenFile, Generator};
use super::tree::Context;
use crate::BoxError;
use crate::path::{ext, join, strip_ext};
use crate::transform::Transpiler;

/// A [`FileServer`] that answers `<prefix>/<stem><to_ext>` by transpiling
/// `<source_dir>/<stem><from_ext>`.
///
/// Among the source files that exist, the one with the fewest hops to the
/// requested extension wins; ties go to the extension registered first.
/// A request with no convertible source is skipped.
///
/// ```text
/// serve "bud/view" from "view"
///
/// bud/view/index.js  ◄── transpile ── view/index.svelte
/// bud/view/about.js  ◄── transpile ── view/about.md  (.md → .svelte → .js)
/// ```
pub struct TranspileServer {
    transpiler: Arc<Transpiler>,
    source_dir: String,
}

impl TranspileServer {
    /// Serve files converted from `source_dir`.
    pub fn new(transpiler: Arc<Transpiler>, source_dir: &str) -> Self {
        Self {
            transpiler,
            source_dir: crate::path::clean(source_dir),
        }
    }

    /// Existing source file for the request, with its modification time.
    fn source(&self, ctx: &Context, rel: &str) -> Option<(String, Option<SystemTime>)> {
        let to = ext(rel);
        if to.is_empty() {
            return None;
        }
        let stem = join(&self.source_dir, strip_ext(rel));

        let mut exts: Vec<&str> = self.transpiler.extensions().collect();
        if !exts.contains(&to) {
            exts.push(to);
        }
        let mut candidates: Vec<(usize, &str)> = exts
            .into_iter()
            .filter_map(|from| Some((self.transpiler.path(from, to).ok()?.len(), from)))
            .collect();
        candidates.sort_by_key(|&(hops, _)| hops);

        candidates.into_iter().find_map(|(_, from)| {
            let path = format!("{stem}{from}");
            let meta = ctx.stat(&path).ok().filter(|m| !m.is_dir())?;
            Some((path, meta.modified))
        })
    }
}

impl FileServer for TranspileServer {
    fn serve_file(&self, ctx: &Context, file: &mut GenFile) -> Result<(), BoxError> {
        let Some((source, modified)) = self.source(ctx, file.relative()) else {
            return Err(skip());
        };
        tracing::trace!(%source, target = %file.path(), "transpile");

        let code = ctx.read(&source)?;
        file.data = self.transpiler.transpile(&source, file.ext(), code)?;
        if let Some(modified) = modified {
            file.set_modified(modified);
        }
        Ok(())
    }
}

/// Build a server generator converting files of `source_dir`.
///
/// ```ignore
/// tree.register("bud/view", serve_transpiled(transpiler, "view"));
/// ```
pub fn serve_transpiled(transpiler: Arc<Transpiler>, source_dir: &str) -> Generator {
    Generator::server(TranspileServer::new(transpiler, source_dir))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::{MemFs, ReadFs};
    use crate::vfs::VirtualTree;

    fn transpiler() -> Arc<Transpiler> {
        let mut tr = Transpiler::new();
        tr.add(".svelte", ".js", |file| {
            file.data = [b"js(".as_slice(), file.data.as_slice(), b")".as_slice()].concat();
            Ok(())
        })
        .unwrap();
        tr.add(".md", ".svelte", |file| {
            file.data = [b"svelte(".as_slice(), file.data.as_slice(), b")".as_slice()].concat();
            Ok(())
        })
        .unwrap();
        Arc::new(tr)
    }

    fn tree() -> (Arc<MemFs>, VirtualTree) {
        let src = Arc::new(MemFs::new());
        src.insert("view/index.svelte", "<h1>hi</h1>");
        src.insert("view/about.md", "# about");
        let tree = VirtualTree::builder(src.clone()).cache(true).build();
        tree.register("bud/view", serve_transpiled(transpiler(), "view"));
        (src, tree)
    }

    #[test]
    fn test_serves_one_hop() {
        let (_, tree) = tree();
        let data = tree.read_file("bud/view/index.js").unwrap();
        assert_eq!(data, b"js(<h1>hi</h1>)");
        assert_eq!(
            tree.links().inputs("bud/view/index.js"),
            ["view/index.js", "view/index.svelte"]
        );
    }

    #[test]
    fn test_serves_multi_hop() {
        let (_, tree) = tree();
        let data = tree.read_file("bud/view/about.js").unwrap();
        assert_eq!(data, b"js(svelte(# about))");
    }

    #[test]
    fn test_prefers_fewest_hops() {
        let (src, tree) = tree();
        src.insert("view/about.svelte", "direct");
        let data = tree.read_file("bud/view/about.js").unwrap();
        assert_eq!(data, b"js(direct)");
    }

    #[test]
    fn test_missing_source_is_skipped() {
        let (_, tree) = tree();
        assert!(tree.open("bud/view/contact.js").unwrap_err().is_not_exist());
        assert!(tree.open("bud/view/index").unwrap_err().is_not_exist());
    }

    #[test]
    fn test_change_source_regenerates() {
        let (src, tree) = tree();
        assert_eq!(tree.read_file("bud/view/index.js").unwrap(), b"js(<h1>hi</h1>)");

        src.insert("view/index.svelte", "<h2>bye</h2>");
        let invalidated = tree.change(["view/index.svelte"]);
        assert!(invalidated.contains(&"bud/view/index.js".to_string()));
        assert_eq!(tree.read_file("bud/view/index.js").unwrap(), b"js(<h2>bye</h2>)");
    }
}
