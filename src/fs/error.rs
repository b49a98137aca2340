//! Filesystem error type.

use std::io;

use thiserror::Error;

use crate::BoxError;

/// Error type for reads and writes against any tree.
///
/// Generator failures are tagged with the path being resolved, so the message
/// a caller prints always carries both the path and the cause.
///
/// # Example
///
/// ```ignore
/// match tree.read_file("bud/main.go") {
///     Ok(data) => { /* use the bytes */ }
///     Err(e) if e.is_not_exist() => { /* feature unused */ }
///     Err(e) => eprintln!("{e}"),
/// }
/// ```
#[derive(Debug, Error)]
pub enum FsError {
    /// Nothing exists at the path (no generator, no disk entry, or skipped).
    #[error("{path}: file does not exist")]
    NotExist {
        /// The requested path.
        path: String,
    },

    /// A file was requested but the path is a directory.
    #[error("{path}: is a directory")]
    IsDir {
        /// The requested path.
        path: String,
    },

    /// A directory was requested but the path is a file.
    #[error("{path}: not a directory")]
    NotDir {
        /// The requested path.
        path: String,
    },

    /// A generator callback failed.
    #[error("generate {path}: {source}")]
    Generator {
        /// The path the generator was producing.
        path: String,
        /// Error returned by the callback.
        source: BoxError,
    },

    /// I/O error from the underlying disk.
    #[error("{path}: {source}")]
    Io {
        /// The path being accessed.
        path: String,
        /// The underlying I/O error.
        source: io::Error,
    },
}

impl FsError {
    /// Create a not-exist error.
    pub fn not_exist(path: impl Into<String>) -> Self {
        Self::NotExist { path: path.into() }
    }

    /// Wrap an I/O error, folding `NotFound` into [`FsError::NotExist`].
    pub fn io(path: impl Into<String>, source: io::Error) -> Self {
        let path = path.into();
        if source.kind() == io::ErrorKind::NotFound {
            Self::NotExist { path }
        } else {
            Self::Io { path, source }
        }
    }

    /// Wrap a generator failure.
    pub fn generator(path: impl Into<String>, source: BoxError) -> Self {
        Self::Generator {
            path: path.into(),
            source,
        }
    }

    /// Check if this error means "nothing there".
    pub fn is_not_exist(&self) -> bool {
        match self {
            Self::NotExist { .. } => true,
            Self::Io { source, .. } => source.kind() == io::ErrorKind::NotFound,
            _ => false,
        }
    }

    /// The path this error refers to.
    pub fn path(&self) -> &str {
        match self {
            Self::NotExist { path }
            | Self::IsDir { path }
            | Self::NotDir { path }
            | Self::Generator { path, .. }
            | Self::Io { path, .. } => path,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_not_found_folds_to_not_exist() {
        let err = FsError::io("a.txt", io::Error::from(io::ErrorKind::NotFound));
        assert!(matches!(err, FsError::NotExist { .. }));
        assert!(err.is_not_exist());
    }

    #[test]
    fn test_generator_message_carries_path_and_cause() {
        let err = FsError::generator("bud/main.go", "boom".into());
        assert_eq!(err.to_string(), "generate bud/main.go: boom");
        assert_eq!(err.path(), "bud/main.go");
        assert!(!err.is_not_exist());
    }
}
