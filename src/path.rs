//! Path utilities.
//!
//! Every path inside the crate is slash-separated and relative to the root of
//! the tree it addresses. The root itself is the empty string.

use std::path::{Path, PathBuf};

/// Normalize a tree path.
///
/// Strips `.` segments, leading and trailing slashes, and collapses repeated
/// separators. `..` segments pop the previous segment and never escape the
/// root.
///
/// ```
/// use genfs::path::clean;
///
/// assert_eq!(clean("./a//b/"), "a/b");
/// assert_eq!(clean("/"), "");
/// assert_eq!(clean("a/../b"), "b");
/// ```
pub fn clean(path: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for segment in path.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            s => parts.push(s),
        }
    }
    parts.join("/")
}

/// Join two tree paths and normalize the result.
pub fn join(base: &str, rel: &str) -> String {
    if base.is_empty() {
        clean(rel)
    } else if rel.is_empty() {
        clean(base)
    } else {
        clean(&format!("{base}/{rel}"))
    }
}

/// Parent of a clean path; the root's parent is the root.
pub fn parent(path: &str) -> &str {
    path.rfind('/').map_or("", |i| &path[..i])
}

/// Last segment of a clean path.
pub fn base(path: &str) -> &str {
    path.rfind('/').map_or(path, |i| &path[i + 1..])
}

/// Dotted extension of the last segment (`".svelte"`), or `""`.
///
/// A leading dot on the file name (`.gitignore`) is not an extension.
pub fn ext(path: &str) -> &str {
    let name = base(path);
    match name.rfind('.') {
        Some(0) | None => "",
        Some(i) => &name[i..],
    }
}

/// The path without its extension.
pub fn strip_ext(path: &str) -> &str {
    &path[..path.len() - ext(path).len()]
}

/// Split off the first segment: `"a/b/c"` → `("a", "b/c")`.
pub fn split_first(path: &str) -> (&str, &str) {
    path.split_once('/').unwrap_or((path, ""))
}

/// Remainder of `path` below `prefix`, if `prefix` is an ancestor (or equal).
pub fn relative<'a>(prefix: &str, path: &'a str) -> Option<&'a str> {
    if prefix.is_empty() {
        return Some(path);
    }
    let rest = path.strip_prefix(prefix)?;
    if rest.is_empty() {
        Some("")
    } else {
        rest.strip_prefix('/')
    }
}

/// Resolve a tree path against an on-disk root directory.
pub fn to_os(root: &Path, path: &str) -> PathBuf {
    let path = clean(path);
    if path.is_empty() {
        root.to_path_buf()
    } else {
        root.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean() {
        assert_eq!(clean(""), "");
        assert_eq!(clean("."), "");
        assert_eq!(clean("./view/index.svelte"), "view/index.svelte");
        assert_eq!(clean("a/./b/../c"), "a/c");
        assert_eq!(clean("../../a"), "a");
    }

    #[test]
    fn test_join() {
        assert_eq!(join("", "a"), "a");
        assert_eq!(join("a", ""), "a");
        assert_eq!(join("a/b", "c/d"), "a/b/c/d");
    }

    #[test]
    fn test_parent_and_base() {
        assert_eq!(parent("a/b/c.txt"), "a/b");
        assert_eq!(parent("c.txt"), "");
        assert_eq!(base("a/b/c.txt"), "c.txt");
        assert_eq!(base("c.txt"), "c.txt");
    }

    #[test]
    fn test_ext() {
        assert_eq!(ext("view/hello.svelte"), ".svelte");
        assert_eq!(ext("archive.tar.gz"), ".gz");
        assert_eq!(ext("Makefile"), "");
        assert_eq!(ext("dir.d/.gitignore"), "");
        assert_eq!(strip_ext("view/hello.svelte"), "view/hello");
        assert_eq!(strip_ext("Makefile"), "Makefile");
    }

    #[test]
    fn test_relative() {
        assert_eq!(relative("public", "public/x.css"), Some("x.css"));
        assert_eq!(relative("public", "public"), Some(""));
        assert_eq!(relative("public", "publics/x.css"), None);
        assert_eq!(relative("", "a/b"), Some("a/b"));
    }

    #[test]
    fn test_split_first() {
        assert_eq!(split_first("a/b/c"), ("a", "b/c"));
        assert_eq!(split_first("a"), ("a", ""));
    }
}
