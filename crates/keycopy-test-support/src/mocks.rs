//! Recording progress sink for asserting on job callbacks.

use std::sync::{Mutex, MutexGuard, PoisonError};

use keycopy_core::{CancelToken, OutcomeKind, ProgressSink, SummaryCounts};

/// Sink that records every callback, optionally tripping a cancellation
/// token once a number of outcomes have been reported.
#[derive(Default)]
pub struct RecordingSink {
    started: Mutex<Vec<usize>>,
    discovered: Mutex<Vec<usize>>,
    outcomes: Mutex<Vec<(OutcomeKind, String)>>,
    summaries: Mutex<Vec<(SummaryCounts, bool)>>,
    cancel_after: Option<(usize, CancelToken)>,
}

impl RecordingSink {
    /// Sink that only records.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sink that requests a stop on `token` once `outcomes` outcomes arrived.
    #[must_use]
    pub fn cancelling_after(outcomes: usize, token: CancelToken) -> Self {
        Self {
            cancel_after: Some((outcomes, token)),
            ..Self::default()
        }
    }

    /// Reported outcomes in arrival order.
    #[must_use]
    pub fn outcomes(&self) -> Vec<(OutcomeKind, String)> {
        lock(&self.outcomes).clone()
    }

    /// Reported outcome kinds in arrival order.
    #[must_use]
    pub fn outcome_kinds(&self) -> Vec<OutcomeKind> {
        lock(&self.outcomes).iter().map(|(kind, _)| *kind).collect()
    }

    /// Every summary delivered; a well-behaved job delivers exactly one.
    #[must_use]
    pub fn summaries(&self) -> Vec<(SummaryCounts, bool)> {
        lock(&self.summaries).clone()
    }

    /// Keyword counts passed to `on_started`.
    #[must_use]
    pub fn started(&self) -> Vec<usize> {
        lock(&self.started).clone()
    }

    /// Candidate counts passed to `on_discovered`.
    #[must_use]
    pub fn discovered(&self) -> Vec<usize> {
        lock(&self.discovered).clone()
    }
}

impl ProgressSink for RecordingSink {
    fn on_started(&self, keyword_count: usize) {
        lock(&self.started).push(keyword_count);
    }

    fn on_discovered(&self, candidate_count: usize) {
        lock(&self.discovered).push(candidate_count);
    }

    fn on_outcome(&self, kind: OutcomeKind, detail: &str) {
        let reported = {
            let mut outcomes = lock(&self.outcomes);
            outcomes.push((kind, detail.to_string()));
            outcomes.len()
        };
        if let Some((threshold, token)) = &self.cancel_after
            && reported >= *threshold
        {
            token.request_stop();
        }
    }

    fn on_summary(&self, counts: SummaryCounts, aborted: bool) {
        lock(&self.summaries).push((counts, aborted));
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trips_token_at_threshold() {
        let token = CancelToken::new();
        let sink = RecordingSink::cancelling_after(2, token.clone());
        sink.on_outcome(OutcomeKind::Copied, "a");
        assert!(!token.is_stopped());
        sink.on_outcome(OutcomeKind::Errored, "b: boom");
        assert!(token.is_stopped());
        assert_eq!(
            sink.outcome_kinds(),
            [OutcomeKind::Copied, OutcomeKind::Errored]
        );
        sink.on_summary(SummaryCounts::default(), true);
        assert_eq!(sink.summaries(), [(SummaryCounts::default(), true)]);
    }
}
