//! Error types for transpile operations.

use thiserror::Error;

use crate::BoxError;

/// Error during extension transforms.
#[derive(Debug, Error)]
pub enum TranspileError {
    /// No chain of transforms leads from one extension to the other.
    ///
    /// Unknown and unreachable extensions both end up here.
    #[error("no transpile path from {from:?} to {to:?}")]
    NoPath {
        /// Source extension.
        from: String,
        /// Requested extension.
        to: String,
    },

    /// A cross-extension transform was registered twice.
    #[error("transform from {from:?} to {to:?} is already registered")]
    DuplicateEdge {
        /// Source extension.
        from: String,
        /// Target extension.
        to: String,
    },

    /// A transform function failed.
    #[error("transpile {path} from {from:?} to {to:?}: {source}")]
    Transform {
        /// Path of the file being transformed.
        path: String,
        /// Extension before the failing step.
        from: String,
        /// Extension the failing step produces.
        to: String,
        /// Error returned by the function.
        source: BoxError,
    },
}

impl TranspileError {
    pub(crate) fn no_path(from: &str, to: &str) -> Self {
        Self::NoPath {
            from: from.to_string(),
            to: to.to_string(),
        }
    }
}
