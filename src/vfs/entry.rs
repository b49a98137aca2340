//! Resolved tree entries.

use std::sync::Arc;
use std::time::SystemTime;

use crate::fs::{EntryKind, Metadata};

/// The result of resolving a path: a file with its bytes, or a directory.
///
/// Cheap to clone; the bytes are shared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    path: String,
    kind: EntryKind,
    data: Arc<[u8]>,
    modified: Option<SystemTime>,
}

impl Entry {
    /// A file entry.
    pub fn file(path: &str, data: impl Into<Arc<[u8]>>, modified: Option<SystemTime>) -> Self {
        Self {
            path: path.to_string(),
            kind: EntryKind::File,
            data: data.into(),
            modified,
        }
    }

    /// A directory entry.
    pub fn dir(path: &str) -> Self {
        Self {
            path: path.to_string(),
            kind: EntryKind::Dir,
            data: Arc::from(Vec::new()),
            modified: None,
        }
    }

    /// The resolved path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// File or directory.
    pub fn kind(&self) -> EntryKind {
        self.kind
    }

    /// Check if this is a directory.
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Dir
    }

    /// File content (empty for directories).
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Modification time reported by the generator or the disk.
    pub fn modified(&self) -> Option<SystemTime> {
        self.modified
    }

    /// Metadata derived from the entry.
    pub fn metadata(&self) -> Metadata {
        match self.kind {
            EntryKind::File => Metadata::file(self.data.len() as u64, self.modified),
            EntryKind::Dir => Metadata::dir(),
        }
    }
}
