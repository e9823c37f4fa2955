//! Job request, per-file classification and outcome types.

use std::fmt::{self, Display, Formatter};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use keycopy_config::normalize_keywords;
use keycopy_events::{OutcomeKind, SummaryCounts};
use uuid::Uuid;

use crate::cancel::CancelToken;
use crate::error::{CopyError, CopyResult};

/// Immutable inputs for one scan-match-copy job.
///
/// Both roots are canonical once the request exists; keywords are trimmed,
/// non-empty, and keep their original order because matching is first-match.
#[derive(Debug, Clone)]
pub struct JobRequest {
    id: Uuid,
    keywords: Vec<String>,
    source_root: PathBuf,
    destination_root: PathBuf,
    cancel: CancelToken,
}

impl JobRequest {
    /// Validate and build a request.
    ///
    /// # Errors
    ///
    /// Returns [`CopyError::InvalidInput`] when no keyword survives trimming or
    /// when either root is missing or not a directory, and [`CopyError::Io`]
    /// when a root cannot be inspected (for example, permission denied) or
    /// canonicalized.
    pub fn new<I, S>(
        keywords: I,
        source_root: impl AsRef<Path>,
        destination_root: impl AsRef<Path>,
    ) -> CopyResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keywords = normalize_keywords(keywords);
        if keywords.is_empty() {
            return Err(CopyError::invalid("keywords", "empty", None));
        }
        let source_root = canonical_directory("source_root", source_root.as_ref())?;
        let destination_root = canonical_directory("destination_root", destination_root.as_ref())?;

        Ok(Self {
            id: Uuid::new_v4(),
            keywords,
            source_root,
            destination_root,
            cancel: CancelToken::new(),
        })
    }

    /// Identifier used for events, spans and logs.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Keywords in match order.
    #[must_use]
    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// Canonical source root.
    #[must_use]
    pub fn source_root(&self) -> &Path {
        &self.source_root
    }

    /// Canonical destination root.
    #[must_use]
    pub fn destination_root(&self) -> &Path {
        &self.destination_root
    }

    /// Cancellation token shared by every clone of this request.
    #[must_use]
    pub const fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }
}

fn canonical_directory(field: &'static str, path: &Path) -> CopyResult<PathBuf> {
    let metadata = fs::metadata(path).map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound {
            CopyError::invalid(field, "not_found", Some(path.display().to_string()))
        } else {
            CopyError::io("request.metadata", path, source)
        }
    })?;
    if !metadata.is_dir() {
        return Err(CopyError::invalid(
            field,
            "not_a_directory",
            Some(path.display().to_string()),
        ));
    }
    fs::canonicalize(path).map_err(|source| CopyError::io("request.canonicalize", path, source))
}

/// A regular file found beneath the source root, outside the destination subtree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFile {
    path: PathBuf,
}

impl CandidateFile {
    pub(crate) const fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Absolute path of the file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Final path segment, lossily converted for matching and reporting.
    #[must_use]
    pub fn file_name(&self) -> String {
        display_name(&self.path)
    }
}

pub(crate) fn display_name(path: &Path) -> String {
    path.file_name().map_or_else(
        || path.display().to_string(),
        |name| name.to_string_lossy().into_owned(),
    )
}

/// Why a matched file was left alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Source and target resolve to the same file.
    SameFile,
    /// The destination copy is at least as recent as the source.
    NotNewer,
}

impl SkipReason {
    /// Human-readable reason.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SameFile => "same file",
            Self::NotNewer => "existing is newer or equal",
        }
    }
}

impl Display for SkipReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decision for a single candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// No keyword occurs in the file name.
    NoMatch,
    /// The file matched but needs no work.
    Skip {
        /// Keyword that matched.
        keyword: String,
        /// Why nothing is copied.
        reason: SkipReason,
    },
    /// The target does not exist yet.
    Copy {
        /// Keyword that matched.
        keyword: String,
        /// Destination path to write.
        target: PathBuf,
    },
    /// The target exists and is strictly older than the source.
    Update {
        /// Keyword that matched.
        keyword: String,
        /// Destination path to overwrite.
        target: PathBuf,
    },
}

/// Result of executing the decision for one matched candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The file was copied to a new target.
    Copied {
        /// Source file name.
        file_name: String,
        /// Keyword that matched.
        keyword: String,
    },
    /// An older target was overwritten.
    Updated {
        /// Source file name.
        file_name: String,
        /// Keyword that matched.
        keyword: String,
    },
    /// Nothing was written.
    Skipped {
        /// Source file name.
        file_name: String,
        /// Why nothing was written.
        reason: SkipReason,
    },
    /// Classification or copy failed for this file only.
    Errored {
        /// Source file name (or path when the name is unavailable).
        file_name: String,
        /// Human-readable cause.
        cause: String,
    },
}

impl Outcome {
    pub(crate) fn errored(file_name: impl Into<String>, error: &CopyError) -> Self {
        Self::Errored {
            file_name: file_name.into(),
            cause: error.cause(),
        }
    }

    /// Outcome kind as published to observers.
    #[must_use]
    pub const fn kind(&self) -> OutcomeKind {
        match self {
            Self::Copied { .. } => OutcomeKind::Copied,
            Self::Updated { .. } => OutcomeKind::Updated,
            Self::Skipped { .. } => OutcomeKind::Skipped,
            Self::Errored { .. } => OutcomeKind::Errored,
        }
    }

    /// Human-readable detail: file name plus keyword, reason or cause.
    #[must_use]
    pub fn detail(&self) -> String {
        match self {
            Self::Copied { file_name, keyword } | Self::Updated { file_name, keyword } => {
                format!("{file_name} (keyword: {keyword})")
            }
            Self::Skipped { file_name, reason } => format!("{file_name} ({reason})"),
            Self::Errored { file_name, cause } => format!("{file_name}: {cause}"),
        }
    }
}

/// Terminal tally of a job, owned and mutated by the coordinator only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JobSummary {
    /// Files copied to a new target.
    pub copied: u64,
    /// Files that replaced an older target.
    pub updated: u64,
    /// Matched files left alone.
    pub skipped: u64,
    /// Files whose processing failed; not part of [`SummaryCounts`].
    pub errored: u64,
    /// Candidates whose name matched no keyword.
    pub unmatched: u64,
    /// Copies written by units already running when the job stopped. They
    /// are not reported individually and not part of the other counters.
    pub late_copies: u64,
    /// Whether the job stopped early.
    pub aborted: bool,
}

impl JobSummary {
    /// Fold one outcome into the tally.
    pub fn record(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Copied { .. } => self.copied += 1,
            Outcome::Updated { .. } => self.updated += 1,
            Outcome::Skipped { .. } => self.skipped += 1,
            Outcome::Errored { .. } => self.errored += 1,
        }
    }

    /// Counters delivered to the progress sink.
    #[must_use]
    pub const fn counts(&self) -> SummaryCounts {
        SummaryCounts {
            copied: self.copied,
            updated: self.updated,
            skipped: self.skipped,
        }
    }

    /// Matched candidates whose outcome was consumed.
    #[must_use]
    pub const fn processed(&self) -> u64 {
        self.copied + self.updated + self.skipped + self.errored
    }
}
