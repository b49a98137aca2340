//! Filesystem abstraction shared by the virtual tree and the sync engine.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │  ReadFs   stat / read_file / read_dir                │
//! │    ├── OsFs         real disk under a root directory │
//! │    ├── MemFs        in-memory map                    │
//! │    └── VirtualTree  generators + fallthrough         │
//! │                                                      │
//! │  WriteFs: ReadFs  mkdir_all / write_file /           │
//! │                   remove_all / set_modified          │
//! │    ├── OsFs                                          │
//! │    └── MemFs                                         │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! Paths are slash-separated and relative to the tree root (see [`crate::path`]).

mod error;
mod mem;
mod os;

use std::fmt;
use std::sync::Arc;
use std::time::SystemTime;

pub use error::FsError;
pub use mem::MemFs;
pub use os::OsFs;

// =============================================================================
// Metadata
// =============================================================================

/// Kind of a tree entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    /// A regular file.
    File,
    /// A directory.
    Dir,
}

/// Metadata about a tree entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    /// File or directory.
    pub kind: EntryKind,
    /// Size in bytes (0 for directories).
    pub size: u64,
    /// Last modification time, if the tree tracks one.
    pub modified: Option<SystemTime>,
}

impl Metadata {
    /// Metadata for a file.
    pub fn file(size: u64, modified: Option<SystemTime>) -> Self {
        Self {
            kind: EntryKind::File,
            size,
            modified,
        }
    }

    /// Metadata for a directory.
    pub fn dir() -> Self {
        Self {
            kind: EntryKind::Dir,
            size: 0,
            modified: None,
        }
    }

    /// Check if this is a directory.
    #[inline]
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Dir
    }
}

// =============================================================================
// DirEntry
// =============================================================================

type StatFn = Arc<dyn Fn() -> Result<Metadata, FsError> + Send + Sync>;

enum Stat {
    Ready(Metadata),
    Lazy(StatFn),
}

/// A single entry of a directory listing.
///
/// Entries synthesized from generators are lazy: [`DirEntry::metadata`] runs
/// the generator only when it is queried.
pub struct DirEntry {
    name: String,
    kind: EntryKind,
    stat: Stat,
}

impl DirEntry {
    /// Create an entry with known metadata.
    pub fn new(name: impl Into<String>, metadata: Metadata) -> Self {
        Self {
            name: name.into(),
            kind: metadata.kind,
            stat: Stat::Ready(metadata),
        }
    }

    /// Create an entry whose metadata is computed on demand.
    pub fn lazy(
        name: impl Into<String>,
        kind: EntryKind,
        stat: impl Fn() -> Result<Metadata, FsError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            stat: Stat::Lazy(Arc::new(stat)),
        }
    }

    /// The entry's base name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// File or directory.
    pub fn kind(&self) -> EntryKind {
        self.kind
    }

    /// Check if this entry is a directory.
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Dir
    }

    /// Get the entry's metadata, computing it if lazy.
    pub fn metadata(&self) -> Result<Metadata, FsError> {
        match &self.stat {
            Stat::Ready(m) => Ok(m.clone()),
            Stat::Lazy(f) => f(),
        }
    }
}

impl fmt::Debug for DirEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirEntry")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("lazy", &matches!(self.stat, Stat::Lazy(_)))
            .finish()
    }
}

// =============================================================================
// Traits
// =============================================================================

/// Read access to a tree.
pub trait ReadFs: Send + Sync {
    /// Get metadata for a path.
    fn stat(&self, path: &str) -> Result<Metadata, FsError>;

    /// Read a whole file.
    fn read_file(&self, path: &str) -> Result<Vec<u8>, FsError>;

    /// List the direct children of a directory, sorted by name.
    fn read_dir(&self, path: &str) -> Result<Vec<DirEntry>, FsError>;

    /// Check if anything exists at a path.
    fn exists(&self, path: &str) -> bool {
        self.stat(path).is_ok()
    }
}

/// Write access to a tree, used as the sync target.
pub trait WriteFs: ReadFs {
    /// Create a directory and all missing parents.
    fn mkdir_all(&self, path: &str) -> Result<(), FsError>;

    /// Create or overwrite a file. `mode` applies when the file is created.
    fn write_file(&self, path: &str, data: &[u8], mode: u32) -> Result<(), FsError>;

    /// Remove a file or a directory with everything below it.
    ///
    /// Removing a missing path is not an error.
    fn remove_all(&self, path: &str) -> Result<(), FsError>;

    /// Set a file's modification time.
    fn set_modified(&self, path: &str, time: SystemTime) -> Result<(), FsError>;
}

impl<T: ReadFs + ?Sized> ReadFs for Arc<T> {
    fn stat(&self, path: &str) -> Result<Metadata, FsError> {
        (**self).stat(path)
    }

    fn read_file(&self, path: &str) -> Result<Vec<u8>, FsError> {
        (**self).read_file(path)
    }

    fn read_dir(&self, path: &str) -> Result<Vec<DirEntry>, FsError> {
        (**self).read_dir(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_lazy_entry_stats_on_demand() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let entry = DirEntry::lazy("x.css", EntryKind::File, move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Metadata::file(3, None))
        });

        assert_eq!(entry.name(), "x.css");
        assert!(!entry.is_dir());
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        assert_eq!(entry.metadata().unwrap().size, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_ready_entry() {
        let entry = DirEntry::new("sub", Metadata::dir());
        assert!(entry.is_dir());
        assert!(entry.metadata().unwrap().is_dir());
    }
}
