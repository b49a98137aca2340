//! Generator kinds and the values they fill in.

use std::fmt;
use std::sync::Arc;
use std::time::SystemTime;

use thiserror::Error;

use super::radix::RadixIndex;
use super::tree::Context;
use crate::BoxError;
use crate::path;

// =============================================================================
// Skip
// =============================================================================

/// Marker error a generator returns to say "this path does not exist".
#[derive(Debug, Error)]
#[error("generator skipped")]
pub struct Skipped;

/// Build the error a generator returns to skip its path.
///
/// A skipped path reads as not-existing for both `open` and sync.
///
/// ```ignore
/// tree.generate_file("bud/web.go", |_ctx, _file| {
///     if !has_views {
///         return Err(genfs::vfs::skip());
///     }
///     Ok(())
/// });
/// ```
pub fn skip() -> BoxError {
    Box::new(Skipped)
}

pub(crate) fn is_skip(err: &BoxError) -> bool {
    err.downcast_ref::<Skipped>().is_some()
}

// =============================================================================
// Generator Traits
// =============================================================================

/// Produces a single file at an exact path.
pub trait FileGenerator: Send + Sync {
    /// Fill in `file`.
    fn generate_file(&self, ctx: &Context, file: &mut GenFile) -> Result<(), BoxError>;
}

/// Produces a subtree by registering child generators on a [`Dir`].
///
/// Runs each time a path inside the subtree is resolved or listed.
pub trait DirGenerator: Send + Sync {
    /// Register the children of `dir`.
    fn generate_dir(&self, ctx: &Context, dir: &mut Dir) -> Result<(), BoxError>;
}

/// Produces independent leaves anywhere below a prefix.
pub trait FileServer: Send + Sync {
    /// Fill in `file`; [`GenFile::relative`] is the path below the prefix.
    fn serve_file(&self, ctx: &Context, file: &mut GenFile) -> Result<(), BoxError>;
}

pub(crate) struct FileFn<F>(pub(crate) F);
pub(crate) struct DirFn<F>(pub(crate) F);
pub(crate) struct ServeFn<F>(pub(crate) F);

impl<F> FileGenerator for FileFn<F>
where
    F: Fn(&Context, &mut GenFile) -> Result<(), BoxError> + Send + Sync,
{
    fn generate_file(&self, ctx: &Context, file: &mut GenFile) -> Result<(), BoxError> {
        (self.0)(ctx, file)
    }
}

impl<F> DirGenerator for DirFn<F>
where
    F: Fn(&Context, &mut Dir) -> Result<(), BoxError> + Send + Sync,
{
    fn generate_dir(&self, ctx: &Context, dir: &mut Dir) -> Result<(), BoxError> {
        (self.0)(ctx, dir)
    }
}

impl<F> FileServer for ServeFn<F>
where
    F: Fn(&Context, &mut GenFile) -> Result<(), BoxError> + Send + Sync,
{
    fn serve_file(&self, ctx: &Context, file: &mut GenFile) -> Result<(), BoxError> {
        (self.0)(ctx, file)
    }
}

// =============================================================================
// Generator
// =============================================================================

/// A registered generator. The set of kinds is closed.
#[derive(Clone)]
pub enum Generator {
    /// Exact path, one file.
    File(Arc<dyn FileGenerator>),
    /// Prefix, subtree of child generators.
    Dir(Arc<dyn DirGenerator>),
    /// Prefix, independent leaves.
    Server(Arc<dyn FileServer>),
}

impl Generator {
    /// Wrap a file generator.
    pub fn file(g: impl FileGenerator + 'static) -> Self {
        Self::File(Arc::new(g))
    }

    /// Wrap a directory generator.
    pub fn dir(g: impl DirGenerator + 'static) -> Self {
        Self::Dir(Arc::new(g))
    }

    /// Wrap a file server.
    pub fn server(g: impl FileServer + 'static) -> Self {
        Self::Server(Arc::new(g))
    }

    /// Check if this generator matches by prefix (dir or server).
    #[inline]
    pub fn is_prefix(&self) -> bool {
        !matches!(self, Self::File(_))
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::File(_) => "file",
            Self::Dir(_) => "dir",
            Self::Server(_) => "server",
        }
    }
}

impl fmt::Debug for Generator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Generator::{}", self.kind())
    }
}

// =============================================================================
// GenFile
// =============================================================================

/// The file a [`FileGenerator`] or [`FileServer`] fills in.
#[derive(Debug, Clone)]
pub struct GenFile {
    path: String,
    rel: String,
    /// Generated content.
    pub data: Vec<u8>,
    modified: Option<SystemTime>,
}

impl GenFile {
    pub(crate) fn new(path: &str, rel: &str) -> Self {
        Self {
            path: path.to_string(),
            rel: rel.to_string(),
            data: Vec::new(),
            modified: None,
        }
    }

    /// Full tree path being generated.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Path below the generator's registration point.
    ///
    /// For servers this is the requested leaf; for file generators it is the
    /// path relative to the enclosing [`Dir`] (or the full path at top level).
    pub fn relative(&self) -> &str {
        &self.rel
    }

    /// Extension of the path being generated.
    pub fn ext(&self) -> &str {
        path::ext(&self.path)
    }

    /// Report a modification time for the generated content.
    pub fn set_modified(&mut self, time: SystemTime) {
        self.modified = Some(time);
    }

    pub(crate) fn modified(&self) -> Option<SystemTime> {
        self.modified
    }
}

// =============================================================================
// Dir
// =============================================================================

/// The subtree a [`DirGenerator`] fills in with child generators.
///
/// Child paths are relative to the directory.
pub struct Dir {
    path: String,
    target: String,
    pub(crate) children: RadixIndex<Generator>,
}

impl Dir {
    pub(crate) fn new(path: &str, target: &str) -> Self {
        Self {
            path: path.to_string(),
            target: target.to_string(),
            children: RadixIndex::new(),
        }
    }

    /// Full tree path of this directory.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Path below this directory being resolved (empty for the directory
    /// itself). Generators may use it to register only what is needed.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Register a child generator. The first registration for a path wins.
    pub fn register(&mut self, rel: &str, generator: Generator) -> bool {
        self.children.insert(&path::clean(rel), generator)
    }

    /// Register a child file generator.
    pub fn generate_file<F>(&mut self, rel: &str, f: F) -> bool
    where
        F: Fn(&Context, &mut GenFile) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.register(rel, Generator::file(FileFn(f)))
    }

    /// Register a child directory generator.
    pub fn generate_dir<F>(&mut self, rel: &str, f: F) -> bool
    where
        F: Fn(&Context, &mut Dir) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.register(rel, Generator::dir(DirFn(f)))
    }

    /// Register a child file server.
    pub fn serve_file<F>(&mut self, rel: &str, f: F) -> bool
    where
        F: Fn(&Context, &mut GenFile) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.register(rel, Generator::server(ServeFn(f)))
    }
}

impl fmt::Debug for Dir {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dir")
            .field("path", &self.path)
            .field("target", &self.target)
            .field("children", &self.children.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skip_roundtrip() {
        assert!(is_skip(&skip()));
        assert!(!is_skip(&"other".into()));
    }

    #[test]
    fn test_dir_first_registration_wins() {
        let mut dir = Dir::new("bud", "");
        assert!(dir.generate_file("main.go", |_, _| Ok(())));
        assert!(!dir.serve_file("main.go", |_, _| Ok(())));
        assert!(matches!(dir.children.get("main.go"), Some(Generator::File(_))));
    }

    #[test]
    fn test_gen_file_accessors() {
        let file = GenFile::new("public/css/site.css", "css/site.css");
        assert_eq!(file.path(), "public/css/site.css");
        assert_eq!(file.relative(), "css/site.css");
        assert_eq!(file.ext(), ".css");
    }
}
