//! Lazy enumeration of candidate files under the source root.
//!
//! # Design
//! - Directories that are, or sit beneath, the destination root are pruned
//!   before they are read, so freshly written copies are never re-scanned.
//! - Directory symlinks are not descended; file symlinks are candidates.
//! - The cancellation token is consulted before every entry; once it is set
//!   the iterator ends.
//! - Traversal errors are yielded in-line and the walk continues.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::{DirEntry, WalkDir};

use crate::cancel::CancelToken;
use crate::error::{CopyError, CopyResult};
use crate::model::CandidateFile;

/// Walker over one source tree for one job.
#[derive(Debug, Clone)]
pub struct TreeWalker {
    source_root: PathBuf,
    destination_root: PathBuf,
    cancel: CancelToken,
}

impl TreeWalker {
    /// Build a walker. Both roots are expected to be canonical.
    #[must_use]
    pub fn new(
        source_root: impl Into<PathBuf>,
        destination_root: impl Into<PathBuf>,
        cancel: CancelToken,
    ) -> Self {
        Self {
            source_root: source_root.into(),
            destination_root: destination_root.into(),
            cancel,
        }
    }

    /// Consume the walker and enumerate candidate files in file-name order.
    pub fn walk(self) -> impl Iterator<Item = CopyResult<CandidateFile>> {
        let Self {
            source_root,
            destination_root,
            cancel,
        } = self;
        let root = source_root.clone();

        WalkDir::new(&source_root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(move |entry| !is_pruned(entry, &destination_root))
            .take_while(move |_| !cancel.is_stopped())
            .filter_map(move |entry| match entry {
                Ok(entry) => candidate(entry).map(Ok),
                Err(err) => {
                    let path = err.path().map_or_else(|| root.clone(), Path::to_path_buf);
                    Some(Err(CopyError::walkdir("walk.read_dir", path, err)))
                }
            })
    }
}

fn is_pruned(entry: &DirEntry, destination_root: &Path) -> bool {
    if !entry.file_type().is_dir() {
        return false;
    }
    let resolved = fs::canonicalize(entry.path()).unwrap_or_else(|_| entry.path().to_path_buf());
    let pruned = resolved.starts_with(destination_root);
    if pruned {
        debug!(path = %entry.path().display(), "pruning destination subtree");
    }
    pruned
}

fn candidate(entry: DirEntry) -> Option<CandidateFile> {
    let file_type = entry.file_type();
    if file_type.is_file() {
        return Some(CandidateFile::new(entry.into_path()));
    }
    if file_type.is_symlink() {
        return match fs::metadata(entry.path()) {
            Ok(meta) if meta.is_file() => Some(CandidateFile::new(entry.into_path())),
            Ok(_) => None,
            Err(err) => {
                debug!(path = %entry.path().display(), error = %err, "skipping dangling symlink");
                None
            }
        };
    }
    None
}
