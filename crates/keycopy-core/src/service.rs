//! Job coordinator: walk, bounded fan-out, outcome aggregation, cancellation.
//!
//! # Design
//! - The walk and every per-file unit run on the blocking pool; the
//!   coordinator task only dispatches work and folds outcomes.
//! - At most `workers` units are in flight at any time.
//! - The stop flag is checked before the walk, before each dispatch and before
//!   each outcome is consumed. After a stop, units already running finish their
//!   write; their results are not reported, only tallied as late copies.
//! - Exactly one summary is delivered per job.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use keycopy_config::CopyPolicy;
use keycopy_events::OutcomeKind;
use keycopy_telemetry::{Metrics, job_span};
use tokio::task::{JoinError, JoinSet};
use tracing::{Instrument, debug, info, warn};

use crate::classify::classify;
use crate::error::CopyError;
use crate::model::{CandidateFile, Classification, JobRequest, JobSummary, Outcome};
use crate::sink::ProgressSink;
use crate::transfer::copy_file;
use crate::walk::TreeWalker;

/// Detail reported when a request names one directory as both roots.
pub const SAME_DIRECTORY_DETAIL: &str = "source and destination are the same directory";

/// Runs copy jobs against a fixed policy.
#[derive(Clone)]
pub struct CopyService {
    policy: CopyPolicy,
    metrics: Metrics,
}

impl CopyService {
    /// Construct a service that records into `metrics`.
    #[must_use]
    pub const fn new(policy: CopyPolicy, metrics: Metrics) -> Self {
        Self { policy, metrics }
    }

    /// Policy the service dispatches with.
    #[must_use]
    pub const fn policy(&self) -> CopyPolicy {
        self.policy
    }

    /// Ask a running (or not yet started) job to stop. Idempotent.
    pub fn request_cancel(&self, request: &JobRequest) {
        if !request.cancel_token().is_stopped() {
            info!(job_id = %request.id(), "cancellation requested");
        }
        request.cancel_token().request_stop();
    }

    /// Execute `request`, reporting progress to `sink`, and return the tally.
    ///
    /// Per-file failures become errored outcomes; the job itself never fails.
    pub async fn run(&self, request: &JobRequest, sink: &dyn ProgressSink) -> JobSummary {
        self.run_job(request, sink)
            .instrument(job_span(request.id()))
            .await
    }

    async fn run_job(&self, request: &JobRequest, sink: &dyn ProgressSink) -> JobSummary {
        let mut summary = JobSummary::default();
        self.metrics.set_in_flight_peak(0);

        if request.source_root() == request.destination_root() {
            warn!(
                root = %request.source_root().display(),
                "rejecting job: source and destination are the same directory"
            );
            sink.on_outcome(OutcomeKind::Errored, SAME_DIRECTORY_DETAIL);
            summary.aborted = true;
            self.metrics.inc_job("rejected");
            sink.on_summary(summary.counts(), true);
            return summary;
        }

        info!(
            source = %request.source_root().display(),
            destination = %request.destination_root().display(),
            keywords = request.keywords().len(),
            workers = self.policy.workers,
            "copy job started"
        );
        sink.on_started(request.keywords().len());

        let cancel = request.cancel_token().clone();
        if cancel.is_stopped() {
            return self.finish(sink, summary, true);
        }

        let walker = TreeWalker::new(
            request.source_root(),
            request.destination_root(),
            cancel.clone(),
        );
        let entries = match tokio::task::spawn_blocking(move || walker.walk().collect::<Vec<_>>())
            .await
        {
            Ok(entries) => entries,
            Err(source) => {
                let err = CopyError::Join {
                    operation: "walk",
                    source,
                };
                let root = request.source_root().display().to_string();
                self.consume(sink, &mut summary, Some(Outcome::errored(root, &err)));
                return self.finish(sink, summary, true);
            }
        };
        if cancel.is_stopped() {
            return self.finish(sink, summary, true);
        }

        let candidates = entries.iter().filter(|entry| entry.is_ok()).count();
        info!(candidates, "source walk finished");
        self.metrics.set_candidates(candidates);
        sink.on_discovered(candidates);

        let keywords: Arc<[String]> = Arc::from(request.keywords());
        let destination: Arc<Path> = Arc::from(request.destination_root());
        let workers = self.policy.workers.max(1);
        let mut pending = entries.into_iter();
        let mut tasks: JoinSet<Option<Outcome>> = JoinSet::new();
        let occupancy = Arc::new(Occupancy::default());

        let aborted = 'dispatch: loop {
            while tasks.len() < workers {
                if cancel.is_stopped() {
                    break 'dispatch true;
                }
                let Some(entry) = pending.next() else {
                    break;
                };
                match entry {
                    Ok(candidate) => {
                        let keywords = Arc::clone(&keywords);
                        let destination = Arc::clone(&destination);
                        let occupancy = Arc::clone(&occupancy);
                        tasks.spawn_blocking(move || {
                            let _unit = occupancy.enter();
                            process_candidate(&candidate, &keywords, &destination)
                        });
                    }
                    Err(err) => {
                        let name = err.path().map_or_else(
                            || request.source_root().display().to_string(),
                            |path| path.display().to_string(),
                        );
                        self.consume(sink, &mut summary, Some(Outcome::errored(name, &err)));
                    }
                }
            }
            self.metrics.set_in_flight(tasks.len());

            let next = tokio::select! {
                biased;
                () = cancel.stopped() => None,
                joined = tasks.join_next() => Some(joined),
            };
            let Some(next) = next else {
                break 'dispatch true;
            };
            let Some(joined) = next else {
                break 'dispatch false;
            };
            if cancel.is_stopped() {
                summary.late_copies += u64::from(wrote_copy(&joined));
                break 'dispatch true;
            }
            match joined {
                Ok(outcome) => self.consume(sink, &mut summary, outcome),
                Err(source) => {
                    let err = CopyError::Join {
                        operation: "process_candidate",
                        source,
                    };
                    self.consume(sink, &mut summary, Some(Outcome::errored("worker", &err)));
                }
            }
        };

        if aborted && !tasks.is_empty() {
            debug!(
                in_flight = tasks.len(),
                "waiting for in-flight copies after cancellation"
            );
            while let Some(joined) = tasks.join_next().await {
                summary.late_copies += u64::from(wrote_copy(&joined));
            }
        }
        self.metrics.set_in_flight_peak(occupancy.peak());
        self.finish(sink, summary, aborted)
    }

    fn consume(&self, sink: &dyn ProgressSink, summary: &mut JobSummary, outcome: Option<Outcome>) {
        let Some(outcome) = outcome else {
            summary.unmatched += 1;
            return;
        };
        summary.record(&outcome);
        let kind = outcome.kind();
        self.metrics.inc_outcome(kind.as_str());
        match kind {
            OutcomeKind::Skipped => debug!(detail = %outcome.detail(), "skip"),
            OutcomeKind::Errored => {
                let detail = outcome.detail();
                warn!(detail = %detail, "file failed");
                sink.on_outcome(kind, &detail);
            }
            OutcomeKind::Copied | OutcomeKind::Updated => {
                let detail = outcome.detail();
                debug!(detail = %detail, "{}", kind.label());
                sink.on_outcome(kind, &detail);
            }
        }
    }

    fn finish(&self, sink: &dyn ProgressSink, mut summary: JobSummary, aborted: bool) -> JobSummary {
        summary.aborted = aborted;
        self.metrics.set_in_flight(0);
        self.metrics
            .inc_job(if aborted { "aborted" } else { "completed" });
        info!(
            copied = summary.copied,
            updated = summary.updated,
            skipped = summary.skipped,
            errored = summary.errored,
            unmatched = summary.unmatched,
            late_copies = summary.late_copies,
            aborted,
            "copy job finished"
        );
        sink.on_summary(summary.counts(), aborted);
        summary
    }
}

fn wrote_copy(joined: &Result<Option<Outcome>, JoinError>) -> bool {
    matches!(
        joined,
        Ok(Some(Outcome::Copied { .. } | Outcome::Updated { .. }))
    )
}

/// Units executing right now and the most seen at once.
#[derive(Default)]
struct Occupancy {
    active: AtomicUsize,
    peak: AtomicUsize,
}

impl Occupancy {
    fn enter(self: &Arc<Self>) -> OccupancyGuard {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        OccupancyGuard(Arc::clone(self))
    }

    fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

struct OccupancyGuard(Arc<Occupancy>);

impl Drop for OccupancyGuard {
    fn drop(&mut self) {
        self.0.active.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Classify one candidate and carry out the decision. `None` means no keyword matched.
fn process_candidate(
    candidate: &CandidateFile,
    keywords: &[String],
    destination_root: &Path,
) -> Option<Outcome> {
    let file_name = candidate.file_name();
    let decision = match classify(candidate.path(), keywords, destination_root) {
        Ok(decision) => decision,
        Err(err) => return Some(Outcome::errored(file_name, &err)),
    };

    let outcome = match decision {
        Classification::NoMatch => return None,
        Classification::Skip { reason, .. } => Outcome::Skipped { file_name, reason },
        Classification::Copy { keyword, target } => match copy_file(candidate.path(), &target) {
            Ok(_) => Outcome::Copied { file_name, keyword },
            Err(err) => Outcome::errored(file_name, &err),
        },
        Classification::Update { keyword, target } => {
            match copy_file(candidate.path(), &target) {
                Ok(_) => Outcome::Updated { file_name, keyword },
                Err(err) => Outcome::errored(file_name, &err),
            }
        }
    };
    Some(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use keycopy_events::SummaryCounts;
    use std::error::Error;
    use std::fs;
    use std::sync::Mutex;
    use tempfile::TempDir;

    type TestResult = Result<(), Box<dyn Error>>;

    #[derive(Default)]
    struct Recorder {
        outcomes: Mutex<Vec<(OutcomeKind, String)>>,
        summaries: Mutex<Vec<(SummaryCounts, bool)>>,
    }

    impl ProgressSink for Recorder {
        fn on_outcome(&self, kind: OutcomeKind, detail: &str) {
            self.outcomes
                .lock()
                .expect("outcomes lock")
                .push((kind, detail.to_string()));
        }

        fn on_summary(&self, counts: SummaryCounts, aborted: bool) {
            self.summaries
                .lock()
                .expect("summaries lock")
                .push((counts, aborted));
        }
    }

    fn service(workers: usize) -> Result<CopyService, Box<dyn Error>> {
        Ok(CopyService::new(CopyPolicy { workers }, Metrics::new()?))
    }

    #[tokio::test]
    async fn copies_matches_and_counts_unmatched() -> TestResult {
        let temp = TempDir::new()?;
        let source = temp.path().join("src");
        let dest = temp.path().join("dst");
        fs::create_dir_all(source.join("nested"))?;
        fs::create_dir_all(&dest)?;
        fs::write(source.join("invoice_jan.txt"), b"jan")?;
        fs::write(source.join("nested/invoice_feb.txt"), b"feb")?;
        fs::write(source.join("report.txt"), b"r")?;

        let service = service(2)?;
        let request = JobRequest::new(["invoice"], &source, &dest)?;
        let sink = Recorder::default();
        let summary = service.run(&request, &sink).await;

        assert!(!summary.aborted);
        assert_eq!(summary.copied, 2);
        assert_eq!(summary.unmatched, 1);
        assert_eq!(fs::read(dest.join("invoice_feb.txt"))?, b"feb");
        assert!(!dest.join("report.txt").exists());

        let outcomes = sink.outcomes.lock().expect("outcomes lock");
        assert_eq!(outcomes.len(), 2);
        assert!(outcomes.iter().all(|(kind, _)| *kind == OutcomeKind::Copied));
        let summaries = sink.summaries.lock().expect("summaries lock");
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].0.copied, 2);

        let snapshot = service.metrics.snapshot();
        assert_eq!(snapshot.copied_total, 2);
        assert_eq!(snapshot.jobs_completed, 1);
        assert_eq!(snapshot.candidates, 3);
        assert_eq!(snapshot.in_flight, 0);
        Ok(())
    }

    #[tokio::test]
    async fn same_directory_is_rejected_without_touching_files() -> TestResult {
        let temp = TempDir::new()?;
        fs::write(temp.path().join("invoice.txt"), b"x")?;

        let service = service(4)?;
        let request = JobRequest::new(["invoice"], temp.path(), temp.path())?;
        let sink = Recorder::default();
        let summary = service.run(&request, &sink).await;

        assert!(summary.aborted);
        assert_eq!(summary.processed(), 0);
        let outcomes = sink.outcomes.lock().expect("outcomes lock");
        assert_eq!(
            outcomes.as_slice(),
            [(OutcomeKind::Errored, SAME_DIRECTORY_DETAIL.to_string())]
        );
        assert_eq!(sink.summaries.lock().expect("summaries lock").len(), 1);
        assert_eq!(service.metrics.snapshot().jobs_rejected, 1);
        Ok(())
    }

    #[tokio::test]
    async fn cancelled_before_start_processes_nothing() -> TestResult {
        let temp = TempDir::new()?;
        let source = temp.path().join("src");
        let dest = temp.path().join("dst");
        fs::create_dir_all(&source)?;
        fs::create_dir_all(&dest)?;
        fs::write(source.join("invoice.txt"), b"x")?;

        let service = service(4)?;
        let request = JobRequest::new(["invoice"], &source, &dest)?;
        service.request_cancel(&request);
        service.request_cancel(&request);
        let sink = Recorder::default();
        let summary = service.run(&request, &sink).await;

        assert!(summary.aborted);
        assert_eq!(summary.processed(), 0);
        assert!(!dest.join("invoice.txt").exists());
        let summaries = sink.summaries.lock().expect("summaries lock");
        assert_eq!(summaries.as_slice(), [(SummaryCounts::default(), true)]);
        assert_eq!(service.metrics.snapshot().jobs_aborted, 1);
        Ok(())
    }

    async fn peak_for(workers: usize, files: usize) -> Result<i64, Box<dyn Error>> {
        let temp = TempDir::new()?;
        let source = temp.path().join("src");
        let dest = temp.path().join("dst");
        fs::create_dir_all(&source)?;
        fs::create_dir_all(&dest)?;
        let payload = vec![7_u8; 256 * 1024];
        for index in 0..files {
            fs::write(source.join(format!("invoice_{index:02}.bin")), &payload)?;
        }

        let service = service(workers)?;
        let request = JobRequest::new(["invoice"], &source, &dest)?;
        let summary = service.run(&request, &Recorder::default()).await;
        assert_eq!(summary.copied, u64::try_from(files)?);
        Ok(service.metrics.snapshot().in_flight_peak)
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_units_never_exceed_workers() -> TestResult {
        assert_eq!(peak_for(1, 12).await?, 1);

        let peak = peak_for(3, 24).await?;
        assert!((1..=3).contains(&peak), "peak {peak} outside 1..=3");
        Ok(())
    }

    #[test]
    fn occupancy_tracks_high_water_mark() {
        let occupancy = Arc::new(Occupancy::default());
        let first = occupancy.enter();
        let second = occupancy.enter();
        drop(first);
        let third = occupancy.enter();
        drop((second, third));
        assert_eq!(occupancy.peak(), 2);
        assert_eq!(occupancy.active.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn process_candidate_maps_decisions() -> TestResult {
        let temp = TempDir::new()?;
        let dest = temp.path().join("dst");
        fs::create_dir_all(&dest)?;
        let file = temp.path().join("invoice.txt");
        fs::write(&file, b"x")?;
        let keywords = vec!["invoice".to_string()];

        let candidate = CandidateFile::new(file.clone());
        assert!(matches!(
            process_candidate(&candidate, &keywords, &dest),
            Some(Outcome::Copied { .. })
        ));
        assert!(matches!(
            process_candidate(&candidate, &keywords, &dest),
            Some(Outcome::Skipped { .. })
        ));
        let other = CandidateFile::new(temp.path().join("notes.txt"));
        assert_eq!(process_candidate(&other, &keywords, &dest), None);
        let gone = CandidateFile::new(temp.path().join("invoice_gone.txt"));
        assert!(matches!(
            process_candidate(&gone, &keywords, &dest),
            Some(Outcome::Errored { .. })
        ));
        Ok(())
    }
}
