//! Compute the operations that bring a target tree in line with a source.
//!
//! ```text
//! source/            target/
//! ├── a.txt   ───►   ├── a.txt     candidate: compare stamps → Update?
//! ├── new/    ───►   │             source only: Create each leaf file
//! │   └── x.js       │
//! │                  ├── old.txt   target only: Delete (unless skipped)
//! └── sub/    ───►   └── sub/      both dirs: recurse
//! ```

use std::collections::BTreeMap;
use std::fmt;

use super::Syncer;
use crate::fs::{DirEntry, EntryKind, FsError, ReadFs, WriteFs};
use crate::path::join;

/// One change to the target, by path relative to the synced directories.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Op {
    /// Write a file that is missing from the target.
    Create(String),
    /// Overwrite a file whose stamp differs.
    Update(String),
    /// Remove a file or directory missing from the source.
    Delete(String),
}

impl Op {
    /// Relative path the operation applies to.
    pub fn path(&self) -> &str {
        match self {
            Self::Create(p) | Self::Update(p) | Self::Delete(p) => p,
        }
    }

    /// Short lowercase name of the operation.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Create(_) => "create",
            Self::Update(_) => "update",
            Self::Delete(_) => "delete",
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name(), self.path())
    }
}

/// Kind of a source entry, resolving lazy entries. `None` when the entry
/// turns out not to exist (a skipped generator).
fn source_kind(entry: &DirEntry) -> Result<Option<EntryKind>, FsError> {
    match entry.metadata() {
        Ok(meta) => Ok(Some(meta.kind)),
        Err(e) if e.is_not_exist() => Ok(None),
        Err(e) => Err(e),
    }
}

impl<S, T> Syncer<'_, S, T>
where
    S: ReadFs + ?Sized,
    T: WriteFs + ?Sized,
{
    fn skipped(&self, entry: &DirEntry) -> bool {
        self.skips.iter().any(|skip| skip(entry.name(), entry.is_dir()))
    }

    /// Source entries of `rel` that are neither skipped nor missing, with
    /// their kinds. Skip predicates run before any lazy entry is resolved.
    fn source_entries(&self, rel: &str) -> Result<BTreeMap<String, EntryKind>, FsError> {
        let mut sources = BTreeMap::new();
        for entry in self.source.read_dir(&join(&self.source_dir, rel))? {
            if self.skipped(&entry) {
                continue;
            }
            if let Some(kind) = source_kind(&entry)? {
                sources.insert(entry.name().to_string(), kind);
            }
        }
        Ok(sources)
    }

    /// Diff the directory `rel` on both sides.
    pub(super) fn diff_dir(&self, rel: &str, ops: &mut Vec<Op>) -> Result<(), FsError> {
        let sources = self.source_entries(rel)?;

        let mut targets: BTreeMap<String, EntryKind> = BTreeMap::new();
        match self.target.read_dir(&join(&self.target_dir, rel)) {
            Ok(entries) => {
                for entry in entries {
                    if !self.skipped(&entry) {
                        targets.insert(entry.name().to_string(), entry.kind());
                    }
                }
            }
            Err(e) if e.is_not_exist() => {}
            Err(e) => return Err(e),
        }

        for (name, kind) in &sources {
            let path = join(rel, name);
            match (kind, targets.get(name)) {
                (_, None) => self.create(&path, *kind, ops)?,
                (EntryKind::Dir, Some(EntryKind::Dir)) => self.diff_dir(&path, ops)?,
                (EntryKind::File, Some(EntryKind::File)) => self.compare(path, ops)?,
                (_, Some(_)) => {
                    ops.push(Op::Delete(path.clone()));
                    self.create(&path, *kind, ops)?;
                }
            }
        }
        for name in targets.keys() {
            if !sources.contains_key(name) {
                ops.push(Op::Delete(join(rel, name)));
            }
        }
        Ok(())
    }

    /// One `Create` per leaf file under a source-only entry.
    fn create(&self, rel: &str, kind: EntryKind, ops: &mut Vec<Op>) -> Result<(), FsError> {
        if kind == EntryKind::File {
            ops.push(Op::Create(rel.to_string()));
            return Ok(());
        }
        for (name, kind) in self.source_entries(rel)? {
            self.create(&join(rel, &name), kind, ops)?;
        }
        Ok(())
    }

    fn compare(&self, rel: String, ops: &mut Vec<Op>) -> Result<(), FsError> {
        let source = self
            .stamp
            .stamp(self.source, &join(&self.source_dir, &rel))?;
        let target = self
            .stamp
            .stamp(self.target, &join(&self.target_dir, &rel))?;
        if source != target {
            tracing::trace!(path = %rel, ?source, ?target, "stamp changed");
            ops.push(Op::Update(rel));
        }
        Ok(())
    }
}
