//! Per-file decision: keyword match, same-file guard, freshness.
//!
//! # Design
//! - Reads metadata only; never writes to the filesystem.
//! - The same-file check degrades to "not the same file" on any error.
//! - Ties on modification time favor the destination.

use std::fs::{self, Metadata};
use std::io;
use std::path::Path;
use std::time::SystemTime;

use crate::error::{CopyError, CopyResult};
use crate::model::{Classification, SkipReason, display_name};

/// Return the first keyword contained in `file_name`, in list order.
#[must_use]
pub fn match_keyword<'k>(file_name: &str, keywords: &'k [String]) -> Option<&'k str> {
    keywords
        .iter()
        .find(|keyword| file_name.contains(keyword.as_str()))
        .map(String::as_str)
}

/// Decide what to do with `source` given the keyword list and destination root.
///
/// # Errors
///
/// Returns [`CopyError::Io`] when the source metadata cannot be read, or when
/// the target exists but its metadata cannot be read.
pub fn classify(
    source: &Path,
    keywords: &[String],
    destination_root: &Path,
) -> CopyResult<Classification> {
    let name = display_name(source);
    let Some(keyword) = match_keyword(&name, keywords) else {
        return Ok(Classification::NoMatch);
    };
    let keyword = keyword.to_string();

    let Some(file_name) = source.file_name() else {
        return Err(CopyError::invalid(
            "candidate",
            "missing_file_name",
            Some(source.display().to_string()),
        ));
    };
    let target = destination_root.join(file_name);

    if is_same_file(source, &target) {
        return Ok(Classification::Skip {
            keyword,
            reason: SkipReason::SameFile,
        });
    }

    let source_meta =
        fs::metadata(source).map_err(|err| CopyError::io("classify.source_metadata", source, err))?;
    let target_meta = match fs::metadata(&target) {
        Ok(meta) => meta,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return Ok(Classification::Copy { keyword, target });
        }
        Err(err) => return Err(CopyError::io("classify.target_metadata", &target, err)),
    };

    let source_mtime = modified(&source_meta, source, "classify.source_mtime")?;
    let target_mtime = modified(&target_meta, &target, "classify.target_mtime")?;
    if source_mtime > target_mtime {
        Ok(Classification::Update { keyword, target })
    } else {
        Ok(Classification::Skip {
            keyword,
            reason: SkipReason::NotNewer,
        })
    }
}

fn modified(meta: &Metadata, path: &Path, operation: &'static str) -> CopyResult<SystemTime> {
    meta.modified()
        .map_err(|err| CopyError::io(operation, path, err))
}

/// Whether `source` and `target` resolve to the same file.
///
/// Compares open handles (device and inode on unix, volume serial and file
/// index on windows), so hard links and symlink aliases both count. Any lookup
/// failure, including a missing target, counts as "not the same".
#[must_use]
pub fn is_same_file(source: &Path, target: &Path) -> bool {
    same_file::is_same_file(source, target).unwrap_or(false)
}
