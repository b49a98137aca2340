//! Change-detection stamps.

use std::fmt;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use xxhash_rust::xxh3::xxh3_128;

use crate::fs::{FsError, Metadata, ReadFs};

/// Fingerprint of one file. Two files with equal stamps are considered in sync.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Stamp {
    /// Nothing exists at the path.
    Absent,
    /// Size and modification time.
    Meta {
        /// File size in bytes.
        size: u64,
        /// Modification time; the Unix epoch when unknown.
        mtime: SystemTime,
    },
    /// XXH3-128 of the file content.
    Hash(u128),
    /// Caller-defined fingerprint.
    Custom(String),
}

/// Built-in stamp strategies, selectable from [`Config`](crate::config::Config).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StampKind {
    /// Compare size and modification time.
    #[default]
    Metadata,
    /// Compare content hashes.
    Content,
}

/// Custom stamp function: metadata and content of the file.
pub type StampFn = Arc<dyn Fn(&Metadata, &[u8]) -> Stamp + Send + Sync>;

/// How the sync engine fingerprints files.
#[derive(Clone, Default)]
pub enum StampStrategy {
    /// `(size, mtime)`; cheap but blind to same-size edits within the clock
    /// resolution.
    #[default]
    Metadata,
    /// XXH3-128 of the content; reads every compared file.
    Content,
    /// Caller-defined.
    Custom(StampFn),
}

impl StampStrategy {
    /// Creates a custom strategy.
    pub fn custom(f: impl Fn(&Metadata, &[u8]) -> Stamp + Send + Sync + 'static) -> Self {
        Self::Custom(Arc::new(f))
    }

    /// Fingerprint the file at `path`. A missing file stamps as [`Stamp::Absent`].
    pub fn stamp<F: ReadFs + ?Sized>(&self, fs: &F, path: &str) -> Result<Stamp, FsError> {
        let meta = match fs.stat(path) {
            Ok(meta) => meta,
            Err(e) if e.is_not_exist() => return Ok(Stamp::Absent),
            Err(e) => return Err(e),
        };
        if meta.is_dir() {
            return Err(FsError::IsDir {
                path: path.to_string(),
            });
        }

        match self {
            Self::Metadata => Ok(Stamp::Meta {
                size: meta.size,
                mtime: meta.modified.unwrap_or(UNIX_EPOCH),
            }),
            Self::Content => Ok(Stamp::Hash(xxh3_128(&fs.read_file(path)?))),
            Self::Custom(f) => Ok(f(&meta, &fs.read_file(path)?)),
        }
    }
}

impl From<StampKind> for StampStrategy {
    fn from(kind: StampKind) -> Self {
        match kind {
            StampKind::Metadata => Self::Metadata,
            StampKind::Content => Self::Content,
        }
    }
}

impl fmt::Debug for StampStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Metadata => f.write_str("Metadata"),
            Self::Content => f.write_str("Content"),
            Self::Custom(_) => f.write_str("Custom"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MemFs;
    use std::time::Duration;

    #[test]
    fn test_absent() {
        let fs = MemFs::new();
        assert_eq!(StampStrategy::Metadata.stamp(&fs, "nope").unwrap(), Stamp::Absent);
        assert_eq!(StampStrategy::Content.stamp(&fs, "nope").unwrap(), Stamp::Absent);
    }

    #[test]
    fn test_metadata_tracks_mtime() {
        let t0 = UNIX_EPOCH + Duration::from_secs(1_000);
        let fs = MemFs::new();
        fs.insert_at("a.txt", "aa", t0);

        let stamp = StampStrategy::Metadata.stamp(&fs, "a.txt").unwrap();
        assert_eq!(stamp, Stamp::Meta { size: 2, mtime: t0 });

        fs.insert_at("a.txt", "bb", t0 + Duration::from_secs(1));
        assert_ne!(StampStrategy::Metadata.stamp(&fs, "a.txt").unwrap(), stamp);
    }

    #[test]
    fn test_content_ignores_mtime() {
        let fs = MemFs::new();
        fs.insert_at("a.txt", "same", UNIX_EPOCH);
        fs.insert_at("b.txt", "same", SystemTime::now());
        fs.insert_at("c.txt", "diff", UNIX_EPOCH);

        let s = StampStrategy::Content;
        assert_eq!(s.stamp(&fs, "a.txt").unwrap(), s.stamp(&fs, "b.txt").unwrap());
        assert_ne!(s.stamp(&fs, "a.txt").unwrap(), s.stamp(&fs, "c.txt").unwrap());
    }

    #[test]
    fn test_custom() {
        let fs = MemFs::new();
        fs.insert("a.txt", "Hello");
        fs.insert("b.txt", "hello");

        let s = StampStrategy::custom(|_, data| {
            Stamp::Custom(String::from_utf8_lossy(data).to_lowercase())
        });
        assert_eq!(s.stamp(&fs, "a.txt").unwrap(), s.stamp(&fs, "b.txt").unwrap());
    }

    #[test]
    fn test_dir_is_not_stamped() {
        let fs = MemFs::new();
        fs.insert("sub/a.txt", "a");
        assert!(matches!(
            StampStrategy::Metadata.stamp(&fs, "sub"),
            Err(FsError::IsDir { .. })
        ));
    }

    #[test]
    fn test_from_kind() {
        assert!(matches!(StampStrategy::from(StampKind::Content), StampStrategy::Content));
        assert!(matches!(StampStrategy::from(StampKind::default()), StampStrategy::Metadata));
    }
}
