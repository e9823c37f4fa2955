//! # Design
//!
//! - Provide structured, constant-message errors for the copy pipeline.
//! - Capture operation context (paths, fields, inputs) to make failures reproducible in tests.
//! - Preserve source errors without interpolating context into error messages;
//!   [`CopyError::cause`] renders the full chain for per-file reporting.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Result type for copy operations.
pub type CopyResult<T> = Result<T, CopyError>;

/// Errors produced by the scan-match-copy pipeline.
#[derive(Debug, Error)]
pub enum CopyError {
    /// IO failures while interacting with the filesystem.
    #[error("copy io failure")]
    Io {
        /// Operation that triggered the IO failure.
        operation: &'static str,
        /// Path involved in the IO failure.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// Walkdir traversal failures.
    #[error("copy walk failure")]
    Walkdir {
        /// Operation that triggered the walkdir failure.
        operation: &'static str,
        /// Path involved in the walkdir failure.
        path: PathBuf,
        /// Underlying walkdir error.
        source: walkdir::Error,
    },
    /// Job request validation failures.
    #[error("copy invalid input")]
    InvalidInput {
        /// Field that failed validation.
        field: &'static str,
        /// Static reason for the failure.
        reason: &'static str,
        /// Offending value when available.
        value: Option<String>,
    },
    /// A worker task panicked or was torn down before reporting.
    #[error("copy worker failure")]
    Join {
        /// Operation that was running on the worker.
        operation: &'static str,
        /// Underlying join error.
        source: tokio::task::JoinError,
    },
}

impl CopyError {
    pub(crate) fn io(operation: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }

    pub(crate) fn walkdir(
        operation: &'static str,
        path: impl Into<PathBuf>,
        source: walkdir::Error,
    ) -> Self {
        Self::Walkdir {
            operation,
            path: path.into(),
            source,
        }
    }

    pub(crate) fn invalid(field: &'static str, reason: &'static str, value: Option<String>) -> Self {
        Self::InvalidInput {
            field,
            reason,
            value,
        }
    }

    /// Path the failure is attached to, when there is one.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Io { path, .. } | Self::Walkdir { path, .. } => Some(path),
            Self::InvalidInput { .. } | Self::Join { .. } => None,
        }
    }

    /// Human-readable cause used as the detail of an errored outcome.
    #[must_use]
    pub fn cause(&self) -> String {
        match self {
            Self::Io {
                operation, source, ..
            } => format!("{operation}: {source}"),
            Self::Walkdir {
                operation, source, ..
            } => match source.io_error() {
                Some(io_err) => format!("{operation}: {io_err}"),
                None => format!("{operation}: {source}"),
            },
            Self::InvalidInput { field, reason, .. } => format!("{field}: {reason}"),
            Self::Join { operation, source } => format!("{operation}: {source}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;
    use tempfile::TempDir;
    use walkdir::WalkDir;

    #[test]
    fn copy_error_helpers_build_variants() -> Result<(), Box<dyn Error>> {
        let io_err = CopyError::io("classify.metadata", "a.txt", io::Error::other("io"));
        assert!(matches!(io_err, CopyError::Io { .. }));
        assert!(io_err.source().is_some());
        assert_eq!(io_err.cause(), "classify.metadata: io");
        assert_eq!(io_err.path(), Some(Path::new("a.txt")));

        let temp = TempDir::new()?;
        let missing = temp.path().join("missing");
        let walkdir_error = WalkDir::new(&missing)
            .into_iter()
            .next()
            .and_then(Result::err)
            .ok_or_else(|| io::Error::other("expected walkdir error"))?;
        let walk_err = CopyError::walkdir("walk.read_dir", &missing, walkdir_error);
        assert!(matches!(walk_err, CopyError::Walkdir { .. }));
        assert!(walk_err.source().is_some());
        assert!(walk_err.cause().starts_with("walk.read_dir: "));

        let invalid = CopyError::invalid("keywords", "empty", None);
        assert_eq!(invalid.to_string(), "copy invalid input");
        assert_eq!(invalid.cause(), "keywords: empty");
        assert!(invalid.path().is_none());
        Ok(())
    }
}
