//! Event payload types emitted while a copy job runs.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Identifier assigned to each event emitted on the bus.
pub type EventId = u64;

/// Default buffer size for the in-memory replay ring.
pub const DEFAULT_REPLAY_CAPACITY: usize = 1_024;

/// Result of processing a single matched file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    /// The file did not exist at the destination and was copied.
    Copied,
    /// The destination copy was older and was overwritten.
    Updated,
    /// The file was left alone (same file, or destination not older).
    Skipped,
    /// Processing failed; the detail carries the cause.
    Errored,
}

impl OutcomeKind {
    /// Machine-friendly label used for metrics and JSON output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Copied => "copied",
            Self::Updated => "updated",
            Self::Skipped => "skipped",
            Self::Errored => "errored",
        }
    }

    /// Short label used in human-readable logs.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Copied => "copy",
            Self::Updated => "update",
            Self::Skipped => "skip",
            Self::Errored => "error",
        }
    }
}

/// Aggregate counters delivered with the final summary.
///
/// Errored outcomes are reported one by one and are not part of these counters.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize,
)]
pub struct SummaryCounts {
    /// Files copied into the destination for the first time.
    pub copied: u64,
    /// Files that replaced an older destination copy.
    pub updated: u64,
    /// Matched files that required no work.
    pub skipped: u64,
}

impl SummaryCounts {
    /// Sum of all three counters.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.copied + self.updated + self.skipped
    }

    /// Files that were actually written (copied or updated).
    #[must_use]
    pub const fn written(&self) -> u64 {
        self.copied + self.updated
    }
}

/// Typed job events surfaced to observers.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A copy job accepted its request and is about to scan.
    JobStarted {
        /// Identifier of the job.
        job_id: Uuid,
        /// Number of keywords the job matches against.
        keyword_count: usize,
    },
    /// The source walk finished and produced this many candidate files.
    CandidatesDiscovered {
        /// Identifier of the job.
        job_id: Uuid,
        /// Candidate files found under the source root.
        count: usize,
    },
    /// A matched file produced an actionable outcome.
    FileOutcome {
        /// Identifier of the job.
        job_id: Uuid,
        /// Outcome classification.
        kind: OutcomeKind,
        /// Human-readable detail (file name, keyword, or error cause).
        detail: String,
    },
    /// The job reached its terminal state.
    JobFinished {
        /// Identifier of the job.
        job_id: Uuid,
        /// Aggregate counters for the job.
        counts: SummaryCounts,
        /// Whether the job stopped because of cancellation or a rejected request.
        aborted: bool,
    },
}

impl Event {
    /// Machine-friendly discriminator for consumers.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::JobStarted { .. } => "job_started",
            Self::CandidatesDiscovered { .. } => "candidates_discovered",
            Self::FileOutcome { .. } => "file_outcome",
            Self::JobFinished { .. } => "job_finished",
        }
    }

    /// Identifier of the job the event belongs to.
    #[must_use]
    pub const fn job_id(&self) -> Uuid {
        match self {
            Self::JobStarted { job_id, .. }
            | Self::CandidatesDiscovered { job_id, .. }
            | Self::FileOutcome { job_id, .. }
            | Self::JobFinished { job_id, .. } => *job_id,
        }
    }
}

/// Metadata wrapper around events. Each envelope tracks the event id and emission timestamp.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct EventEnvelope {
    /// Monotonic identifier assigned to the wrapped event.
    pub id: EventId,
    /// Timestamp recording when the envelope was produced.
    pub timestamp: DateTime<Utc>,
    /// Wrapped event payload.
    pub event: Event,
}
