//! Observer interface for job progress and its event-bus adapter.

use keycopy_events::{Event, EventBus, OutcomeKind, SummaryCounts};
use tracing::debug;
use uuid::Uuid;

/// Receives progress from a running job.
///
/// `on_outcome` fires for every copied, updated or errored file (skipped files
/// are only counted). `on_summary` fires exactly once when the job ends.
/// Implementations are called from the coordinator task only.
pub trait ProgressSink: Send + Sync {
    /// The job accepted its request and is about to scan.
    fn on_started(&self, _keyword_count: usize) {}

    /// The source walk finished with this many candidate files.
    fn on_discovered(&self, _candidate_count: usize) {}

    /// A matched file produced an actionable outcome.
    fn on_outcome(&self, kind: OutcomeKind, detail: &str);

    /// The job reached its terminal state.
    fn on_summary(&self, counts: SummaryCounts, aborted: bool);
}

/// Sink that publishes job progress as [`Event`]s on the shared bus.
#[derive(Clone)]
pub struct EventSink {
    bus: EventBus,
    job_id: Uuid,
}

impl EventSink {
    /// Publish progress for `job_id` onto `bus`.
    #[must_use]
    pub const fn new(bus: EventBus, job_id: Uuid) -> Self {
        Self { bus, job_id }
    }

    fn publish(&self, event: Event) {
        if let Err(err) = self.bus.publish(event) {
            debug!(
                event_id = err.event_id(),
                event_kind = err.event_kind(),
                "progress event had no live subscribers"
            );
        }
    }
}

impl ProgressSink for EventSink {
    fn on_started(&self, keyword_count: usize) {
        self.publish(Event::JobStarted {
            job_id: self.job_id,
            keyword_count,
        });
    }

    fn on_discovered(&self, candidate_count: usize) {
        self.publish(Event::CandidatesDiscovered {
            job_id: self.job_id,
            count: candidate_count,
        });
    }

    fn on_outcome(&self, kind: OutcomeKind, detail: &str) {
        self.publish(Event::FileOutcome {
            job_id: self.job_id,
            kind,
            detail: detail.to_string(),
        });
    }

    fn on_summary(&self, counts: SummaryCounts, aborted: bool) {
        self.publish(Event::JobFinished {
            job_id: self.job_id,
            counts,
            aborted,
        });
    }
}
