//! Byte copy that carries permission bits and timestamps to the target.

use std::fs;
use std::path::Path;

use filetime::FileTime;

use crate::error::{CopyError, CopyResult};

/// Copy `source` over `target`, then mirror its access and modification times.
///
/// The target is overwritten unconditionally; callers decide beforehand
/// whether a write is warranted. Returns the number of bytes copied.
///
/// # Errors
///
/// Returns [`CopyError::Io`] when the content copy, the metadata read or the
/// timestamp update fails.
pub fn copy_file(source: &Path, target: &Path) -> CopyResult<u64> {
    let bytes =
        fs::copy(source, target).map_err(|err| CopyError::io("transfer.copy", target, err))?;

    let metadata =
        fs::metadata(source).map_err(|err| CopyError::io("transfer.source_metadata", source, err))?;
    let accessed = FileTime::from_last_access_time(&metadata);
    let modified = FileTime::from_last_modification_time(&metadata);
    filetime::set_file_times(target, accessed, modified)
        .map_err(|err| CopyError::io("transfer.set_times", target, err))?;

    Ok(bytes)
}
