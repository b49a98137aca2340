//! Real filesystem rooted at a directory.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use super::{DirEntry, EntryKind, FsError, Metadata, ReadFs, WriteFs};
use crate::path::{clean, to_os};

/// Disk-backed tree. Tree paths are resolved below `root`.
#[derive(Debug, Clone)]
pub struct OsFs {
    root: PathBuf,
}

impl OsFs {
    /// Create a tree rooted at the given directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn os_path(&self, path: &str) -> PathBuf {
        to_os(&self.root, path)
    }
}

fn to_metadata(m: &fs::Metadata) -> Metadata {
    if m.is_dir() {
        Metadata::dir()
    } else {
        Metadata::file(m.len(), m.modified().ok())
    }
}

impl ReadFs for OsFs {
    fn stat(&self, path: &str) -> Result<Metadata, FsError> {
        fs::metadata(self.os_path(path))
            .map(|m| to_metadata(&m))
            .map_err(|e| FsError::io(path, e))
    }

    fn read_file(&self, path: &str) -> Result<Vec<u8>, FsError> {
        let os_path = self.os_path(path);
        let map_err = |e| FsError::io(path, e);
        fs::metadata(&os_path).map_err(map_err).and_then(|m| {
            if m.is_dir() {
                Err(FsError::IsDir { path: clean(path) })
            } else {
                fs::read(&os_path).map_err(map_err)
            }
        })
    }

    fn read_dir(&self, path: &str) -> Result<Vec<DirEntry>, FsError> {
        let os_path = self.os_path(path);
        let meta = fs::metadata(&os_path).map_err(|e| FsError::io(path, e))?;
        if !meta.is_dir() {
            return Err(FsError::NotDir { path: clean(path) });
        }

        let mut entries = Vec::new();
        for entry in fs::read_dir(&os_path).map_err(|e| FsError::io(path, e))? {
            let entry = entry.map_err(|e| FsError::io(path, e))?;
            let name = entry.file_name().to_string_lossy().into_owned();
            // Follow symlinks so linked directories are walked like real ones.
            let meta = match fs::metadata(entry.path()) {
                Ok(m) => to_metadata(&m),
                // Dangling symlink
                Err(_) => continue,
            };
            entries.push(DirEntry::new(name, meta));
        }
        entries.sort_by(|a, b| a.name().cmp(b.name()));
        Ok(entries)
    }
}

impl WriteFs for OsFs {
    fn mkdir_all(&self, path: &str) -> Result<(), FsError> {
        fs::create_dir_all(self.os_path(path)).map_err(|e| FsError::io(path, e))
    }

    fn write_file(&self, path: &str, data: &[u8], mode: u32) -> Result<(), FsError> {
        let os_path = self.os_path(path);
        let map_err = |e| FsError::io(path, e);

        let mut options = fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(mode);
        }
        #[cfg(not(unix))]
        let _ = mode;

        let mut file = options.open(&os_path).map_err(map_err)?;
        file.write_all(data).map_err(map_err)
    }

    fn remove_all(&self, path: &str) -> Result<(), FsError> {
        let os_path = self.os_path(path);
        let result = match fs::symlink_metadata(&os_path) {
            Ok(m) if m.is_dir() => fs::remove_dir_all(&os_path),
            Ok(_) => fs::remove_file(&os_path),
            Err(e) => Err(e),
        };
        match result {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(FsError::io(path, e)),
            _ => Ok(()),
        }
    }

    fn set_modified(&self, path: &str, time: SystemTime) -> Result<(), FsError> {
        let map_err = |e| FsError::io(path, e);
        let file = fs::OpenOptions::new()
            .write(true)
            .open(self.os_path(path))
            .map_err(map_err)?;
        file.set_modified(time).map_err(map_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn test_read_file() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.txt"), "hello").unwrap();

        let fsys = OsFs::new(dir.path());
        assert_eq!(fsys.read_file("a.txt").unwrap(), b"hello");
        assert_eq!(fsys.stat("a.txt").unwrap().size, 5);
    }

    #[test]
    fn test_read_file_directory() {
        let dir = TempDir::new().unwrap();
        let fsys = OsFs::new(dir.path());
        assert!(matches!(fsys.read_file(""), Err(FsError::IsDir { .. })));
    }

    #[test]
    fn test_read_file_nonexistent() {
        let dir = TempDir::new().unwrap();
        let fsys = OsFs::new(dir.path());
        assert!(fsys.read_file("missing.txt").unwrap_err().is_not_exist());
    }

    #[test]
    fn test_read_dir_sorted() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("b.txt"), "b").unwrap();
        fs::write(dir.path().join("a.txt"), "a").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();

        let fsys = OsFs::new(dir.path());
        let entries = fsys.read_dir(".").unwrap();
        let names: Vec<_> = entries.iter().map(DirEntry::name).collect();
        assert_eq!(names, ["a.txt", "b.txt", "sub"]);
        assert!(entries[2].is_dir());
    }

    #[test]
    fn test_write_and_remove() {
        let dir = TempDir::new().unwrap();
        let fsys = OsFs::new(dir.path());

        fsys.mkdir_all("a/b").unwrap();
        fsys.write_file("a/b/c.txt", b"data", 0o644).unwrap();
        assert_eq!(fsys.read_file("a/b/c.txt").unwrap(), b"data");

        fsys.write_file("a/b/c.txt", b"new", 0o644).unwrap();
        assert_eq!(fsys.read_file("a/b/c.txt").unwrap(), b"new");

        fsys.remove_all("a").unwrap();
        assert!(!fsys.exists("a"));
        // Removing twice is fine
        fsys.remove_all("a").unwrap();
    }

    #[test]
    #[cfg(unix)]
    fn test_write_file_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let fsys = OsFs::new(dir.path());
        fsys.write_file("x.txt", b"x", 0o600).unwrap();

        let mode = fs::metadata(dir.path().join("x.txt")).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_set_modified() {
        let dir = TempDir::new().unwrap();
        let fsys = OsFs::new(dir.path());
        fsys.write_file("x.txt", b"x", 0o644).unwrap();

        let time = SystemTime::UNIX_EPOCH + Duration::from_secs(1_000_000);
        fsys.set_modified("x.txt", time).unwrap();
        assert_eq!(fsys.stat("x.txt").unwrap().modified, Some(time));
    }
}
