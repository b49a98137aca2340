//! Diff-based directory sync.
//!
//! A [`Syncer`] walks a source tree (usually a [`VirtualTree`]) and a writable
//! target in lock-step, computes [`Op`]s from per-file [`Stamp`]s and applies
//! them. After each write the target file takes the source's modification
//! time, so an unchanged source produces no operations on the next run.
//!
//! # Example
//!
//! ```
//! use genfs::fs::{MemFs, ReadFs};
//! use genfs::sync::Syncer;
//! use genfs::vfs::VirtualTree;
//!
//! let tree = VirtualTree::empty();
//! tree.generate_file("bud/main.go", |_ctx, file| {
//!     file.data = b"package main".to_vec();
//!     Ok(())
//! });
//!
//! let disk = MemFs::new();
//! let syncer = Syncer::new(&tree, "bud", &disk, "bud");
//!
//! let report = syncer.sync().unwrap();
//! assert_eq!(report.created, 1);
//! assert_eq!(disk.read_file("bud/main.go").unwrap(), b"package main");
//!
//! assert!(syncer.sync().unwrap().is_empty());
//! ```
//!
//! [`VirtualTree`]: crate::vfs::VirtualTree

mod apply;
mod diff;
mod stamp;

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

pub use diff::Op;
pub use stamp::{Stamp, StampFn, StampKind, StampStrategy};

use crate::config;
use crate::fs::{FsError, ReadFs, WriteFs};
use crate::path::clean;

/// Skip predicate: entry name and whether the entry is a directory.
///
/// Predicates see base names at every depth, so `name == "node_modules"`
/// matches nested directories too. Matching entries are ignored on both
/// sides: never created, updated, deleted or descended into.
pub type SkipFn = Arc<dyn Fn(&str, bool) -> bool + Send + Sync>;

/// Build a skip predicate from a closure.
pub fn skip(f: impl Fn(&str, bool) -> bool + Send + Sync + 'static) -> SkipFn {
    Arc::new(f)
}

/// Error from a sync run.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Listing or stamping failed while computing operations.
    #[error("sync: {0}")]
    Diff(#[from] FsError),

    /// An operation failed; the operations before it were applied.
    #[error("sync {op}: {source}")]
    Apply {
        /// The failed operation.
        op: Op,
        /// The underlying error.
        source: FsError,
    },
}

/// Counts of applied operations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Files written that did not exist.
    pub created: usize,
    /// Files overwritten.
    pub updated: usize,
    /// Files and directories removed.
    pub deleted: usize,
}

impl SyncReport {
    /// Total number of operations.
    pub fn total(&self) -> usize {
        self.created + self.updated + self.deleted
    }

    /// Check if nothing changed.
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

impl fmt::Display for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} created, {} updated, {} deleted",
            self.created, self.updated, self.deleted
        )
    }
}

/// Syncs `source_dir` of a source tree into `target_dir` of a target tree.
pub struct Syncer<'a, S: ?Sized, T: ?Sized> {
    source: &'a S,
    source_dir: String,
    target: &'a T,
    target_dir: String,
    skips: Vec<SkipFn>,
    stamp: StampStrategy,
    mode: u32,
}

impl<'a, S, T> Syncer<'a, S, T>
where
    S: ReadFs + ?Sized,
    T: WriteFs + ?Sized,
{
    /// Create a syncer with the configured stamp strategy and file mode.
    pub fn new(source: &'a S, source_dir: &str, target: &'a T, target_dir: &str) -> Self {
        let config = config::get();
        Self {
            source,
            source_dir: clean(source_dir),
            target,
            target_dir: clean(target_dir),
            skips: Vec::new(),
            stamp: config.stamp.into(),
            mode: config.file_mode,
        }
    }

    /// Ignore entries matching `f` on both sides.
    pub fn with_skip(mut self, f: impl Fn(&str, bool) -> bool + Send + Sync + 'static) -> Self {
        self.skips.push(Arc::new(f));
        self
    }

    /// Add several skip predicates.
    pub fn with_skips(mut self, skips: impl IntoIterator<Item = SkipFn>) -> Self {
        self.skips.extend(skips);
        self
    }

    /// Use a different stamp strategy.
    pub fn with_stamp(mut self, stamp: impl Into<StampStrategy>) -> Self {
        self.stamp = stamp.into();
        self
    }

    /// Permission bits for created files.
    pub fn with_mode(mut self, mode: u32) -> Self {
        self.mode = mode;
        self
    }

    /// Compute the operations without applying them.
    ///
    /// A missing source directory is an error; a missing target directory
    /// is treated as empty.
    pub fn diff(&self) -> Result<Vec<Op>, SyncError> {
        let mut ops = Vec::new();
        self.diff_dir("", &mut ops)?;
        Ok(ops)
    }

    /// Apply previously computed operations.
    pub fn apply(&self, ops: &[Op]) -> Result<SyncReport, SyncError> {
        self.apply_ops(ops)
    }

    /// Diff and apply.
    pub fn sync(&self) -> Result<SyncReport, SyncError> {
        let ops = self.diff()?;
        let report = self.apply(&ops)?;
        tracing::debug!(
            source = %self.source_dir,
            target = %self.target_dir,
            %report,
            "synced"
        );
        Ok(report)
    }
}

/// Sync `source_dir` of `source` into `target_dir` of `target`.
pub fn dir<S, T>(
    source: &S,
    source_dir: &str,
    target: &T,
    target_dir: &str,
    skips: impl IntoIterator<Item = SkipFn>,
) -> Result<SyncReport, SyncError>
where
    S: ReadFs + ?Sized,
    T: WriteFs + ?Sized,
{
    Syncer::new(source, source_dir, target, target_dir)
        .with_skips(skips)
        .sync()
}
