//! Scratch source/destination trees for copy-job tests.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use filetime::FileTime;
use tempfile::TempDir;

/// Temporary directory holding a source root and a destination root.
///
/// All paths are canonical, so they compare equal to what a job request
/// resolves them to. The tree is removed when the value is dropped.
pub struct TempTree {
    _temp: TempDir,
    root: PathBuf,
    source: PathBuf,
    destination: PathBuf,
}

impl TempTree {
    /// Sibling layout: `<root>/src` and `<root>/dst`.
    ///
    /// # Errors
    ///
    /// Returns an error if the temporary directories cannot be created.
    pub fn new() -> Result<Self> {
        Self::with_layout("src", "dst")
    }

    /// Nested layout: the destination lives inside the source at `<root>/src/out`.
    ///
    /// # Errors
    ///
    /// Returns an error if the temporary directories cannot be created.
    pub fn nested_destination() -> Result<Self> {
        Self::with_layout("src", "src/out")
    }

    fn with_layout(source: &str, destination: &str) -> Result<Self> {
        let temp = TempDir::new().context("failed to create temp dir")?;
        let root = fs::canonicalize(temp.path()).context("failed to canonicalize temp dir")?;
        let source = root.join(source);
        let destination = root.join(destination);
        fs::create_dir_all(&source).context("failed to create source root")?;
        fs::create_dir_all(&destination).context("failed to create destination root")?;
        Ok(Self {
            _temp: temp,
            root,
            source,
            destination,
        })
    }

    /// Canonical temp root containing both trees.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Canonical source root.
    #[must_use]
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Canonical destination root.
    #[must_use]
    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Write `contents` to `relative` under the source root.
    ///
    /// # Errors
    ///
    /// Returns an error if the file or its parents cannot be written.
    pub fn write_source(&self, relative: &str, contents: &[u8]) -> Result<PathBuf> {
        let path = self.source.join(relative);
        write_file(&path, contents)?;
        Ok(path)
    }

    /// Write `contents` to `relative` under the destination root.
    ///
    /// # Errors
    ///
    /// Returns an error if the file or its parents cannot be written.
    pub fn write_destination(&self, relative: &str, contents: &[u8]) -> Result<PathBuf> {
        let path = self.destination.join(relative);
        write_file(&path, contents)?;
        Ok(path)
    }

    /// Names of the regular files directly inside the destination root, sorted.
    ///
    /// # Errors
    ///
    /// Returns an error if the destination cannot be listed.
    pub fn destination_files(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.destination).context("failed to list destination")? {
            let entry = entry.context("failed to read destination entry")?;
            if entry.file_type()?.is_file() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }
}

/// Write a file, creating missing parent directories.
///
/// # Errors
///
/// Returns an error if a parent directory or the file cannot be written.
pub fn write_file(path: &Path, contents: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))
}

/// Pin a file's modification time to `seconds` after the Unix epoch.
///
/// # Errors
///
/// Returns an error if the timestamp cannot be updated.
pub fn set_mtime(path: &Path, seconds: i64) -> Result<()> {
    filetime::set_file_mtime(path, FileTime::from_unix_time(seconds, 0))
        .with_context(|| format!("failed to set mtime on {}", path.display()))
}

/// Modification time of a file in whole seconds since the Unix epoch.
///
/// # Errors
///
/// Returns an error if the metadata cannot be read.
pub fn mtime(path: &Path) -> Result<i64> {
    let metadata =
        fs::metadata(path).with_context(|| format!("failed to stat {}", path.display()))?;
    Ok(FileTime::from_last_modification_time(&metadata).unix_seconds())
}
