//! Generator-backed virtual tree.
//!
//! # Resolution
//!
//! ```text
//! open(path)
//!   │
//!   ├─► cache hit                         → memoized entry
//!   ├─► exact file generator              → generate
//!   ├─► longest-prefix dir / server       → delegate remainder
//!   │     └─► dir: run, resolve remainder among its children (recursive)
//!   ├─► registration marker               → virtual directory
//!   ├─► fallback filesystem               → disk entry
//!   └─► NotExist
//! ```
//!
//! # Locking
//!
//! The radix index, the link graph and the cache share one `RwLock`.
//! Lookups take the read lock, registration and invalidation the write lock.
//! Generator callbacks always run with no lock held, so they may read other
//! paths of the same tree. An epoch counter, bumped by registration and
//! invalidation, keeps a result computed across either from being cached.
//!
//! # Modification times
//!
//! A generated file that does not report its own time gets the time its
//! content was first seen: regenerating identical bytes keeps the old time,
//! new bytes get a newer one.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use xxhash_rust::xxh3::xxh3_64;

use super::entry::Entry;
use super::generator::{
    is_skip, Dir, DirFn, DirGenerator, FileFn, FileGenerator, FileServer, GenFile, Generator,
    ServeFn,
};
use super::link::LinkGraph;
use super::radix::RadixIndex;
use crate::BoxError;
use crate::config;
use crate::fs::{DirEntry, EntryKind, FsError, MemFs, Metadata, ReadFs};
use crate::path::{base, clean, join, relative};

// =============================================================================
// Context
// =============================================================================

/// Handle passed to generator callbacks.
///
/// Reads made through the context declare a link from the output being
/// generated to the path read, so [`VirtualTree::change`] on the input later
/// invalidates the output.
pub struct Context {
    tree: VirtualTree,
    output: String,
}

impl Context {
    /// The path being generated.
    pub fn output(&self) -> &str {
        &self.output
    }

    /// The tree the generator is registered on.
    pub fn tree(&self) -> &VirtualTree {
        &self.tree
    }

    /// Declare that the output depends on `input`.
    pub fn link(&self, input: &str) {
        self.tree.link(&self.output, &clean(input));
    }

    /// Read a file and link it as an input.
    pub fn read(&self, path: &str) -> Result<Vec<u8>, FsError> {
        self.link(path);
        self.tree.read_file(path)
    }

    /// List a directory and link it as an input.
    pub fn read_dir(&self, path: &str) -> Result<Vec<DirEntry>, FsError> {
        self.link(path);
        self.tree.read_dir(path)
    }

    /// Stat a path and link it as an input.
    pub fn stat(&self, path: &str) -> Result<Metadata, FsError> {
        self.link(path);
        self.tree.stat(path)
    }
}

// =============================================================================
// Lookup
// =============================================================================

/// A generator selected for a path.
struct Target {
    generator: Generator,
    /// Full path the generator is registered at.
    at: String,
    /// Path below `at` (for file generators: below the lookup base).
    rel: String,
}

/// Select the generator for `path` in an index whose keys are relative to
/// `base`. Also reports whether `path` is a registration marker.
fn lookup(index: &RadixIndex<Generator>, base: &str, path: &str) -> (Option<Target>, bool) {
    let Some(key) = relative(base, path) else {
        return (None, false);
    };

    if let Some(generator) = index.get(key) {
        let rel = if generator.is_prefix() { "" } else { key };
        let target = Target {
            generator: generator.clone(),
            at: path.to_string(),
            rel: rel.to_string(),
        };
        return (Some(target), false);
    }

    let target = index
        .longest_prefix(key, Generator::is_prefix)
        .map(|(prefix, generator)| Target {
            generator: generator.clone(),
            at: join(base, &prefix),
            rel: relative(&prefix, key).unwrap_or(key).to_string(),
        });
    (target, index.is_marker(key))
}

fn kind_of(generator: Option<&Generator>) -> EntryKind {
    match generator {
        Some(Generator::File(_)) => EntryKind::File,
        _ => EntryKind::Dir,
    }
}

/// Time `data` was first produced at `path`. New content gets a time strictly
/// after the previous one so metadata stamps always see the change.
fn first_seen(
    seen: &mut FxHashMap<String, (u64, SystemTime)>,
    path: &str,
    data: &[u8],
) -> SystemTime {
    let hash = xxh3_64(data);
    let prev = seen.get(path).copied();
    if let Some((prev_hash, time)) = prev
        && prev_hash == hash
    {
        return time;
    }

    let now = SystemTime::now();
    let time = match prev {
        Some((_, last)) if now <= last => last + Duration::from_nanos(1),
        _ => now,
    };
    seen.insert(path.to_string(), (hash, time));
    time
}

fn generate_error(path: &str, err: BoxError) -> FsError {
    if is_skip(&err) {
        FsError::not_exist(path)
    } else {
        FsError::generator(path, err)
    }
}

// =============================================================================
// VirtualTree
// =============================================================================

#[derive(Default)]
struct State {
    index: RadixIndex<Generator>,
    links: LinkGraph,
    cache: FxHashMap<String, Entry>,
    /// Content hash and first-seen time of each generated file.
    seen: FxHashMap<String, (u64, SystemTime)>,
    epoch: u64,
}

impl State {
    /// Drop cached entries at `path` and below it.
    fn evict_below(&mut self, path: &str) {
        self.cache
            .retain(|key, _| relative(path, key).is_none());
    }
}

struct Inner {
    fallback: Arc<dyn ReadFs>,
    cache: bool,
    state: RwLock<State>,
}

/// A path tree whose files are computed on demand by registered generators.
///
/// Cloning is cheap and every clone shares the same registrations.
///
/// # Example
///
/// ```
/// use genfs::fs::{MemFs, ReadFs};
/// use genfs::vfs::VirtualTree;
///
/// let tree = VirtualTree::new(MemFs::new());
/// tree.generate_file("bud/main.go", |_ctx, file| {
///     file.data = b"package main".to_vec();
///     Ok(())
/// });
///
/// assert_eq!(tree.read_file("bud/main.go").unwrap(), b"package main");
/// assert!(tree.stat("bud").unwrap().is_dir());
/// ```
#[derive(Clone)]
pub struct VirtualTree {
    inner: Arc<Inner>,
}

impl VirtualTree {
    /// Create a tree falling through to `fallback` for unregistered paths.
    ///
    /// Caching follows [`config::get`].
    pub fn new(fallback: impl ReadFs + 'static) -> Self {
        Self::builder(fallback).build()
    }

    /// Create a tree with no fallback filesystem.
    pub fn empty() -> Self {
        Self::new(MemFs::new())
    }

    /// Configure a tree before creating it.
    pub fn builder(fallback: impl ReadFs + 'static) -> TreeBuilder {
        TreeBuilder {
            fallback: Arc::new(fallback),
            cache: config::get().cache,
        }
    }

    /// The filesystem unregistered paths fall through to.
    pub fn fallback(&self) -> &dyn ReadFs {
        self.inner.fallback.as_ref()
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Register a generator at `path`.
    ///
    /// The first registration for a path wins; returns `false` if one existed.
    pub fn register(&self, path: &str, generator: Generator) -> bool {
        let path = clean(path);
        let mut state = self.inner.state.write();
        let inserted = state.index.insert(&path, generator);
        if inserted {
            state.epoch += 1;
            state.evict_below(&path);
        } else {
            tracing::debug!(%path, "generator already registered, keeping the first");
        }
        inserted
    }

    /// Register a file generator at an exact path.
    pub fn generate_file<F>(&self, path: &str, f: F) -> bool
    where
        F: Fn(&Context, &mut GenFile) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.register(path, Generator::file(FileFn(f)))
    }

    /// Register a directory generator for a subtree.
    pub fn generate_dir<F>(&self, path: &str, f: F) -> bool
    where
        F: Fn(&Context, &mut Dir) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.register(path, Generator::dir(DirFn(f)))
    }

    /// Register a file server for every leaf below a prefix.
    pub fn serve_file<F>(&self, path: &str, f: F) -> bool
    where
        F: Fn(&Context, &mut GenFile) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.register(path, Generator::server(ServeFn(f)))
    }

    // =========================================================================
    // Resolution
    // =========================================================================

    /// Resolve a path to a file or directory entry.
    pub fn open(&self, path: &str) -> Result<Entry, FsError> {
        let path = clean(path);

        let (target, marker, epoch) = {
            let state = self.inner.state.read();
            if let Some(entry) = state.cache.get(&path) {
                tracing::trace!(%path, "cache hit");
                return Ok(entry.clone());
            }
            let (target, marker) = lookup(&state.index, "", &path);
            (target, marker, state.epoch)
        };

        if let Some(target) = target
            && let Some(entry) = self.run(target, &path, epoch)?
        {
            return Ok(entry);
        }
        if marker {
            return Ok(Entry::dir(&path));
        }
        self.fall_through(&path)
    }

    /// Run a selected generator for `path`. `Ok(None)` means the generator
    /// does not produce it.
    fn run(&self, target: Target, path: &str, epoch: u64) -> Result<Option<Entry>, FsError> {
        let ctx = self.context(path);
        match target.generator {
            Generator::File(g) => {
                tracing::trace!(%path, "generate file");
                let mut file = GenFile::new(path, &target.rel);
                g.generate_file(&ctx, &mut file)
                    .map_err(|e| generate_error(path, e))?;
                Ok(Some(self.remember(path, file, epoch)))
            }
            Generator::Server(g) => {
                if target.rel.is_empty() {
                    return Ok(Some(Entry::dir(path)));
                }
                tracing::trace!(%path, at = %target.at, "serve file");
                let mut file = GenFile::new(path, &target.rel);
                g.serve_file(&ctx, &mut file)
                    .map_err(|e| generate_error(path, e))?;
                Ok(Some(self.remember(path, file, epoch)))
            }
            Generator::Dir(g) => {
                tracing::trace!(%path, at = %target.at, "generate dir");
                let mut dir = Dir::new(&target.at, &target.rel);
                g.generate_dir(&ctx, &mut dir)
                    .map_err(|e| generate_error(path, e))?;
                if target.rel.is_empty() {
                    return Ok(Some(Entry::dir(path)));
                }

                let (child, marker) = lookup(&dir.children, &target.at, path);
                if let Some(child) = child
                    && let Some(entry) = self.run(child, path, epoch)?
                {
                    return Ok(Some(entry));
                }
                Ok(marker.then(|| Entry::dir(path)))
            }
        }
    }

    /// Build the entry for a generated file and cache it unless the tree
    /// changed since `epoch`.
    fn remember(&self, path: &str, file: GenFile, epoch: u64) -> Entry {
        let mut state = self.inner.state.write();
        let modified = match file.modified() {
            Some(time) => time,
            None => first_seen(&mut state.seen, path, &file.data),
        };
        let entry = Entry::file(path, file.data, Some(modified));

        if self.inner.cache {
            if state.epoch == epoch {
                state.cache.insert(path.to_string(), entry.clone());
            } else {
                tracing::trace!(%path, "tree changed during generation, not caching");
            }
        }
        entry
    }

    fn fall_through(&self, path: &str) -> Result<Entry, FsError> {
        let fallback = &self.inner.fallback;
        let meta = fallback.stat(path)?;
        if meta.is_dir() {
            return Ok(Entry::dir(path));
        }
        let data = fallback.read_file(path)?;
        Ok(Entry::file(path, data, meta.modified))
    }

    // =========================================================================
    // Listing
    // =========================================================================

    /// List a directory: disk entries merged with generator children.
    ///
    /// Generator entries replace same-named disk entries. File generators are
    /// resolved while listing so skipped files drop out; directory entries stay
    /// lazy and run their generator only when their metadata is queried. A
    /// file generator that fails is listed lazily and reports the error from
    /// [`DirEntry::metadata`].
    pub fn list(&self, path: &str) -> Result<Vec<DirEntry>, FsError> {
        let path = clean(path);
        let mut found = false;
        let mut not_dir = false;
        let mut entries: BTreeMap<String, DirEntry> = BTreeMap::new();

        match self.inner.fallback.read_dir(&path) {
            Ok(list) => {
                found = true;
                for entry in list {
                    entries.insert(entry.name().to_string(), entry);
                }
            }
            Err(FsError::NotDir { .. }) => not_dir = true,
            Err(e) if e.is_not_exist() => {}
            Err(e) => return Err(e),
        }

        let (target, marker, children) = {
            let state = self.inner.state.read();
            let (target, marker) = lookup(&state.index, "", &path);
            let children: Vec<(String, EntryKind)> = state
                .index
                .children(&path)
                .unwrap_or_default()
                .into_iter()
                .map(|(name, g)| (name.to_string(), kind_of(g)))
                .collect();
            (target, marker, children)
        };

        found |= marker || !children.is_empty();
        let mut generated = children;
        if let Some(target) = target {
            if matches!(target.generator, Generator::File(_)) {
                return Err(FsError::NotDir { path });
            }
            if let Some(list) = self.list_target(target, &path)? {
                found = true;
                generated.extend(list);
            }
        }

        if !found {
            return Err(if not_dir {
                FsError::NotDir { path }
            } else {
                FsError::not_exist(path)
            });
        }

        for (name, kind) in generated {
            let full = join(&path, &name);
            if kind == EntryKind::Dir {
                entries.insert(name, self.lazy_entry(full, kind));
                continue;
            }
            // Skipped files are not listed
            match self.stat(&full) {
                Ok(meta) => {
                    entries.insert(name, DirEntry::new(base(&full), meta));
                }
                Err(e) if e.is_not_exist() => {
                    entries.remove(&name);
                }
                Err(_) => {
                    entries.insert(name, self.lazy_entry(full, kind));
                }
            }
        }
        Ok(entries.into_values().collect())
    }

    /// Generated children of `path` under a prefix generator, or `None` if the
    /// generator has nothing at `path`.
    fn list_target(
        &self,
        target: Target,
        path: &str,
    ) -> Result<Option<Vec<(String, EntryKind)>>, FsError> {
        match target.generator {
            Generator::File(_) => Ok(None),
            Generator::Server(_) => Ok(target.rel.is_empty().then(Vec::new)),
            Generator::Dir(g) => {
                let ctx = self.context(path);
                let mut dir = Dir::new(&target.at, &target.rel);
                g.generate_dir(&ctx, &mut dir)
                    .map_err(|e| generate_error(path, e))?;

                let (child, marker) = lookup(&dir.children, &target.at, path);
                let own = dir.children.children(&target.rel);
                let mut found = target.rel.is_empty() || marker || own.is_some();
                let mut list: Vec<(String, EntryKind)> = own
                    .unwrap_or_default()
                    .into_iter()
                    .map(|(name, g)| (name.to_string(), kind_of(g)))
                    .collect();

                if let Some(child) = child
                    && child.generator.is_prefix()
                    && let Some(nested) = self.list_target(child, path)?
                {
                    found = true;
                    list.extend(nested);
                }
                Ok(found.then_some(list))
            }
        }
    }

    fn lazy_entry(&self, path: String, kind: EntryKind) -> DirEntry {
        let tree = self.clone();
        let name = base(&path).to_string();
        DirEntry::lazy(name, kind, move || tree.stat(&path))
    }

    // =========================================================================
    // Links & Cache
    // =========================================================================

    fn context(&self, output: &str) -> Context {
        Context {
            tree: self.clone(),
            output: output.to_string(),
        }
    }

    fn link(&self, output: &str, input: &str) {
        self.inner.state.write().links.link(output, input);
    }

    /// Snapshot of the declared dependency links.
    pub fn links(&self) -> LinkGraph {
        self.inner.state.read().links.clone()
    }

    /// Check if a path has a memoized resolution.
    pub fn is_cached(&self, path: &str) -> bool {
        self.inner.state.read().cache.contains_key(&clean(path))
    }

    /// Invalidate changed paths and every output that depends on them.
    ///
    /// Returns the invalidated paths: the inputs first, then their dependents
    /// in breadth-first order. Links declared by invalidated outputs are
    /// dropped; they are declared again when the output is regenerated.
    pub fn change<I, S>(&self, paths: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let changed: Vec<String> = paths.into_iter().map(|p| clean(p.as_ref())).collect();
        let mut state = self.inner.state.write();
        state.epoch += 1;
        let affected = state.links.affected(changed.iter().map(String::as_str));
        for path in &affected {
            state.cache.remove(path);
            state.links.unlink(path);
        }
        tracing::debug!(?changed, invalidated = affected.len(), "change");
        affected
    }

    /// Drop every memoized resolution.
    pub fn clear_cache(&self) {
        let mut state = self.inner.state.write();
        state.epoch += 1;
        state.cache.clear();
    }

    /// Resolve independent paths in parallel.
    ///
    /// Concurrent resolutions of the same path are not deduplicated.
    #[cfg(feature = "batch")]
    pub fn open_batch<P: AsRef<str> + Sync>(&self, paths: &[P]) -> Vec<Result<Entry, FsError>> {
        use rayon::prelude::*;

        paths.par_iter().map(|p| self.open(p.as_ref())).collect()
    }
}

impl ReadFs for VirtualTree {
    fn stat(&self, path: &str) -> Result<Metadata, FsError> {
        self.open(path).map(|e| e.metadata())
    }

    fn read_file(&self, path: &str) -> Result<Vec<u8>, FsError> {
        let entry = self.open(path)?;
        if entry.is_dir() {
            return Err(FsError::IsDir {
                path: entry.path().to_string(),
            });
        }
        Ok(entry.data().to_vec())
    }

    fn read_dir(&self, path: &str) -> Result<Vec<DirEntry>, FsError> {
        self.list(path)
    }
}

impl fmt::Debug for VirtualTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.read();
        f.debug_struct("VirtualTree")
            .field("generators", &state.index.len())
            .field("links", &state.links.len())
            .field("cached", &state.cache.len())
            .finish()
    }
}

// =============================================================================
// TreeBuilder
// =============================================================================

/// Builder for [`VirtualTree`].
pub struct TreeBuilder {
    fallback: Arc<dyn ReadFs>,
    cache: bool,
}

impl TreeBuilder {
    /// Enable or disable memoization of generated files.
    pub fn cache(mut self, enabled: bool) -> Self {
        self.cache = enabled;
        self
    }

    /// Build the tree.
    pub fn build(self) -> VirtualTree {
        VirtualTree {
            inner: Arc::new(Inner {
                fallback: self.fallback,
                cache: self.cache,
                state: RwLock::new(State::default()),
            }),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
