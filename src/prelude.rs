//! Prelude module for convenient imports.
//!
//! ```ignore
//! use genfs::prelude::*;
//! ```

// Filesystem seam
pub use crate::fs::{DirEntry, EntryKind, FsError, MemFs, Metadata, OsFs, ReadFs, WriteFs};

// Transform
pub use crate::transform::{File, Transpiler, TranspileError};

// Virtual tree
pub use crate::vfs::{
    serve_transpiled, skip, Context, Dir, Entry, GenFile, Generator, VirtualTree,
};

// Sync
pub use crate::sync::{Op, StampKind, StampStrategy, SyncError, SyncReport, Syncer};

pub use crate::BoxError;
