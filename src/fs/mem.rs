//! In-memory tree.

use std::collections::BTreeMap;
use std::time::SystemTime;

use parking_lot::RwLock;

use super::{DirEntry, FsError, Metadata, ReadFs, WriteFs};
use crate::path::{clean, parent};

#[derive(Debug, Clone)]
enum MemNode {
    File {
        data: Vec<u8>,
        mode: u32,
        modified: Option<SystemTime>,
    },
    Dir,
}

/// A simple map-based tree.
///
/// Inserting a file creates its parent directories. Useful as a sync source
/// or target in tests, and as scratch space for generators.
///
/// # Example
///
/// ```
/// use genfs::fs::{MemFs, ReadFs};
///
/// let fsys = MemFs::new();
/// fsys.insert("public/site.css", "body {}");
/// assert_eq!(fsys.read_file("public/site.css").unwrap(), b"body {}");
/// assert!(fsys.stat("public").unwrap().is_dir());
/// ```
#[derive(Debug, Default)]
pub struct MemFs {
    nodes: RwLock<BTreeMap<String, MemNode>>,
}

impl MemFs {
    /// Create a new empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a file with string content.
    pub fn insert(&self, path: &str, content: impl AsRef<str>) {
        self.insert_bytes(path, content.as_ref().as_bytes());
    }

    /// Insert a file with binary content.
    pub fn insert_bytes(&self, path: &str, content: impl Into<Vec<u8>>) {
        self.insert_at(path, content, SystemTime::now());
    }

    /// Insert a file with an explicit modification time.
    pub fn insert_at(&self, path: &str, content: impl Into<Vec<u8>>, modified: SystemTime) {
        let path = clean(path);
        let mut nodes = self.nodes.write();
        mark_parents(&mut nodes, &path);
        nodes.insert(
            path,
            MemNode::File {
                data: content.into(),
                mode: 0o644,
                modified: Some(modified),
            },
        );
    }

    /// Check if a file or directory exists at the path.
    pub fn contains(&self, path: &str) -> bool {
        let path = clean(path);
        path.is_empty() || self.nodes.read().contains_key(&path)
    }

    /// Remove a file, returning its content.
    pub fn remove(&self, path: &str) -> Option<Vec<u8>> {
        let mut nodes = self.nodes.write();
        match nodes.remove(&clean(path))? {
            MemNode::File { data, .. } => Some(data),
            MemNode::Dir => None,
        }
    }

    /// The mode a file was created with.
    pub fn mode(&self, path: &str) -> Option<u32> {
        match self.nodes.read().get(&clean(path))? {
            MemNode::File { mode, .. } => Some(*mode),
            MemNode::Dir => None,
        }
    }

    /// Get the number of files.
    pub fn len(&self) -> usize {
        self.nodes
            .read()
            .values()
            .filter(|n| matches!(n, MemNode::File { .. }))
            .count()
    }

    /// Check if there are no files.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All file paths, sorted.
    pub fn paths(&self) -> Vec<String> {
        self.nodes
            .read()
            .iter()
            .filter(|(_, n)| matches!(n, MemNode::File { .. }))
            .map(|(p, _)| p.clone())
            .collect()
    }
}

/// Insert `Dir` nodes for every ancestor of `path`.
fn mark_parents(nodes: &mut BTreeMap<String, MemNode>, path: &str) {
    let mut dir = parent(path);
    while !dir.is_empty() {
        nodes.entry(dir.to_string()).or_insert(MemNode::Dir);
        dir = parent(dir);
    }
}

/// Iterate keys strictly below `dir`.
fn descendants<'a>(
    nodes: &'a BTreeMap<String, MemNode>,
    dir: &str,
) -> impl Iterator<Item = (&'a String, &'a MemNode)> {
    let prefix = if dir.is_empty() {
        String::new()
    } else {
        format!("{dir}/")
    };
    nodes
        .range(prefix.clone()..)
        .take_while(move |(k, _)| k.starts_with(&prefix))
}

impl ReadFs for MemFs {
    fn stat(&self, path: &str) -> Result<Metadata, FsError> {
        let path = clean(path);
        if path.is_empty() {
            return Ok(Metadata::dir());
        }
        match self.nodes.read().get(&path) {
            Some(MemNode::File { data, modified, .. }) => {
                Ok(Metadata::file(data.len() as u64, *modified))
            }
            Some(MemNode::Dir) => Ok(Metadata::dir()),
            None => Err(FsError::NotExist { path }),
        }
    }

    fn read_file(&self, path: &str) -> Result<Vec<u8>, FsError> {
        let path = clean(path);
        match self.nodes.read().get(&path) {
            Some(MemNode::File { data, .. }) => Ok(data.clone()),
            Some(MemNode::Dir) => Err(FsError::IsDir { path }),
            None if path.is_empty() => Err(FsError::IsDir { path }),
            None => Err(FsError::NotExist { path }),
        }
    }

    fn read_dir(&self, path: &str) -> Result<Vec<DirEntry>, FsError> {
        let path = clean(path);
        let nodes = self.nodes.read();
        match nodes.get(&path) {
            Some(MemNode::Dir) => {}
            None if path.is_empty() => {}
            Some(MemNode::File { .. }) => return Err(FsError::NotDir { path }),
            None => return Err(FsError::NotExist { path }),
        }

        let skip = if path.is_empty() { 0 } else { path.len() + 1 };
        let entries = descendants(&nodes, &path)
            .filter(|(k, _)| !k[skip..].contains('/'))
            .map(|(k, node)| {
                let meta = match node {
                    MemNode::File { data, modified, .. } => {
                        Metadata::file(data.len() as u64, *modified)
                    }
                    MemNode::Dir => Metadata::dir(),
                };
                DirEntry::new(&k[skip..], meta)
            })
            .collect();
        Ok(entries)
    }
}

impl WriteFs for MemFs {
    fn mkdir_all(&self, path: &str) -> Result<(), FsError> {
        let path = clean(path);
        if path.is_empty() {
            return Ok(());
        }
        let mut nodes = self.nodes.write();
        let mut dir = path.as_str();
        loop {
            if let Some(MemNode::File { .. }) = nodes.get(dir) {
                return Err(FsError::NotDir {
                    path: dir.to_string(),
                });
            }
            if dir.is_empty() {
                break;
            }
            dir = parent(dir);
        }
        nodes.insert(path.clone(), MemNode::Dir);
        mark_parents(&mut nodes, &path);
        Ok(())
    }

    fn write_file(&self, path: &str, data: &[u8], mode: u32) -> Result<(), FsError> {
        let path = clean(path);
        let mut nodes = self.nodes.write();

        let dir = parent(&path);
        if !dir.is_empty() && !matches!(nodes.get(dir), Some(MemNode::Dir)) {
            return Err(FsError::NotExist {
                path: dir.to_string(),
            });
        }

        match nodes.get_mut(&path) {
            Some(MemNode::Dir) => Err(FsError::IsDir { path }),
            None if path.is_empty() => Err(FsError::IsDir { path }),
            Some(MemNode::File {
                data: existing,
                modified,
                ..
            }) => {
                *existing = data.to_vec();
                *modified = Some(SystemTime::now());
                Ok(())
            }
            None => {
                nodes.insert(
                    path,
                    MemNode::File {
                        data: data.to_vec(),
                        mode,
                        modified: Some(SystemTime::now()),
                    },
                );
                Ok(())
            }
        }
    }

    fn remove_all(&self, path: &str) -> Result<(), FsError> {
        let path = clean(path);
        let mut nodes = self.nodes.write();
        let doomed: Vec<String> = descendants(&nodes, &path).map(|(k, _)| k.clone()).collect();
        for key in doomed {
            nodes.remove(&key);
        }
        nodes.remove(&path);
        Ok(())
    }

    fn set_modified(&self, path: &str, time: SystemTime) -> Result<(), FsError> {
        let path = clean(path);
        match self.nodes.write().get_mut(&path) {
            Some(MemNode::File { modified, .. }) => {
                *modified = Some(time);
                Ok(())
            }
            Some(MemNode::Dir) => Ok(()),
            None => Err(FsError::NotExist { path }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_creates_parents() {
        let fsys = MemFs::new();
        fsys.insert("a/b/c.txt", "c");

        assert!(fsys.stat("a").unwrap().is_dir());
        assert!(fsys.stat("a/b").unwrap().is_dir());
        assert_eq!(fsys.len(), 1);
        assert_eq!(fsys.paths(), ["a/b/c.txt"]);
    }

    #[test]
    fn test_read_dir_direct_children_only() {
        let fsys = MemFs::new();
        fsys.insert("a/x.txt", "x");
        fsys.insert("a/sub/y.txt", "y");
        fsys.insert("ab.txt", "ab");

        let names: Vec<_> = fsys
            .read_dir("a")
            .unwrap()
            .iter()
            .map(|e| e.name().to_string())
            .collect();
        assert_eq!(names, ["sub", "x.txt"]);

        let root: Vec<_> = fsys
            .read_dir("")
            .unwrap()
            .iter()
            .map(|e| e.name().to_string())
            .collect();
        assert_eq!(root, ["a", "ab.txt"]);
    }

    #[test]
    fn test_read_dir_errors() {
        let fsys = MemFs::new();
        fsys.insert("a.txt", "a");
        assert!(matches!(fsys.read_dir("a.txt"), Err(FsError::NotDir { .. })));
        assert!(fsys.read_dir("missing").unwrap_err().is_not_exist());
    }

    #[test]
    fn test_write_requires_parent() {
        let fsys = MemFs::new();
        assert!(fsys.write_file("a/b.txt", b"b", 0o644).is_err());

        fsys.mkdir_all("a").unwrap();
        fsys.write_file("a/b.txt", b"b", 0o600).unwrap();
        assert_eq!(fsys.read_file("a/b.txt").unwrap(), b"b");
        assert_eq!(fsys.mode("a/b.txt"), Some(0o600));
    }

    #[test]
    fn test_mkdir_all_through_file_fails() {
        let fsys = MemFs::new();
        fsys.insert("a", "file");
        assert!(matches!(fsys.mkdir_all("a/b"), Err(FsError::NotDir { .. })));
    }

    #[test]
    fn test_remove_all_subtree() {
        let fsys = MemFs::new();
        fsys.insert("a/x.txt", "x");
        fsys.insert("a/sub/y.txt", "y");
        fsys.insert("ab.txt", "ab");

        fsys.remove_all("a").unwrap();
        assert!(!fsys.contains("a"));
        assert!(!fsys.contains("a/sub/y.txt"));
        assert!(fsys.contains("ab.txt"));
    }
}
