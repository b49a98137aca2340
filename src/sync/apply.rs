//! Apply diff operations to the target tree.

use std::time::UNIX_EPOCH;

use super::diff::Op;
use super::{SyncError, SyncReport, Syncer};
use crate::fs::{FsError, ReadFs, WriteFs};
use crate::path::{join, parent};

impl<S, T> Syncer<'_, S, T>
where
    S: ReadFs + ?Sized,
    T: WriteFs + ?Sized,
{
    /// Apply `ops` in order, stopping at the first failure.
    pub(super) fn apply_ops(&self, ops: &[Op]) -> Result<SyncReport, SyncError> {
        let mut report = SyncReport::default();
        for op in ops {
            self.apply_op(op).map_err(|source| SyncError::Apply {
                op: op.clone(),
                source,
            })?;
            tracing::debug!(%op, "sync");
            match op {
                Op::Create(_) => report.created += 1,
                Op::Update(_) => report.updated += 1,
                Op::Delete(_) => report.deleted += 1,
            }
        }
        Ok(report)
    }

    fn apply_op(&self, op: &Op) -> Result<(), FsError> {
        let target = join(&self.target_dir, op.path());
        match op {
            Op::Create(rel) | Op::Update(rel) => {
                let source = join(&self.source_dir, rel);
                let meta = self.source.stat(&source)?;
                let data = self.source.read_file(&source)?;

                self.target.mkdir_all(parent(&target))?;
                self.target.write_file(&target, &data, self.mode)?;
                self.target
                    .set_modified(&target, meta.modified.unwrap_or(UNIX_EPOCH))
            }
            Op::Delete(_) => self.target.remove_all(&target),
        }
    }
}
