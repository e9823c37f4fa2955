//! Prometheus-backed metrics registry and snapshot helpers.
//!
//! # Design
//! - Encapsulates collector registration to keep the public API small.
//! - Exposes the counters/gauges relevant to copy jobs only.

use std::fmt::{self, Display, Formatter};
use std::sync::Arc;

use prometheus::{Encoder, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use serde::Serialize;

use crate::error::{Result, TelemetryError};

const OUTCOME_KINDS: &[&str] = &["copied", "updated", "skipped", "errored"];
const JOB_STATUSES: &[&str] = &["completed", "aborted", "rejected"];

/// Collectors registered by [`Metrics`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricName {
    /// `copy_outcomes_total{kind}`
    CopyOutcomes,
    /// `copy_jobs_total{status}`
    CopyJobs,
    /// `copy_candidates`
    CopyCandidates,
    /// `copy_in_flight`
    CopyInFlight,
    /// `copy_in_flight_peak`
    CopyInFlightPeak,
}

impl MetricName {
    /// Every collector, in registration order.
    pub const ALL: [Self; 5] = [
        Self::CopyOutcomes,
        Self::CopyJobs,
        Self::CopyCandidates,
        Self::CopyInFlight,
        Self::CopyInFlightPeak,
    ];

    /// Exposition name of the collector.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CopyOutcomes => "copy_outcomes_total",
            Self::CopyJobs => "copy_jobs_total",
            Self::CopyCandidates => "copy_candidates",
            Self::CopyInFlight => "copy_in_flight",
            Self::CopyInFlightPeak => "copy_in_flight_peak",
        }
    }

    const fn help(self) -> &'static str {
        match self {
            Self::CopyOutcomes => "Per-file copy outcomes by kind",
            Self::CopyJobs => "Copy jobs finished by terminal status",
            Self::CopyCandidates => "Candidate files discovered by the latest walk",
            Self::CopyInFlight => "Copy work units currently dispatched",
            Self::CopyInFlightPeak => "Most work units executing at once during the latest job",
        }
    }

    fn opts(self) -> Opts {
        Opts::new(self.as_str(), self.help())
    }
}

impl Display for MetricName {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Prometheus-backed metrics registry shared across services.
#[derive(Clone)]
pub struct Metrics {
    inner: Arc<MetricsInner>,
}

struct MetricsInner {
    registry: Registry,
    copy_outcomes_total: IntCounterVec,
    copy_jobs_total: IntCounterVec,
    copy_candidates: IntGauge,
    copy_in_flight: IntGauge,
    copy_in_flight_peak: IntGauge,
}

/// Snapshot of the copy counters for reporting.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Files copied for the first time.
    pub copied_total: u64,
    /// Files that replaced an older destination copy.
    pub updated_total: u64,
    /// Matched files that needed no work.
    pub skipped_total: u64,
    /// Files that failed to process.
    pub errored_total: u64,
    /// Jobs that ran to completion.
    pub jobs_completed: u64,
    /// Jobs stopped by cancellation.
    pub jobs_aborted: u64,
    /// Jobs refused because source and destination were the same directory.
    pub jobs_rejected: u64,
    /// Candidate files found by the most recent walk.
    pub candidates: i64,
    /// Work units currently dispatched.
    pub in_flight: i64,
    /// Most work units that executed concurrently in the latest job.
    pub in_flight_peak: i64,
}

impl Metrics {
    /// Construct a new metrics registry with the standard collectors registered.
    ///
    /// # Errors
    ///
    /// Returns an error if any of the Prometheus collectors cannot be
    /// built or registered.
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let copy_outcomes_total = counter_vec(MetricName::CopyOutcomes, "kind")?;
        let copy_jobs_total = counter_vec(MetricName::CopyJobs, "status")?;
        let copy_candidates = gauge(MetricName::CopyCandidates)?;
        let copy_in_flight = gauge(MetricName::CopyInFlight)?;
        let copy_in_flight_peak = gauge(MetricName::CopyInFlightPeak)?;

        register(&registry, MetricName::CopyOutcomes, copy_outcomes_total.clone())?;
        register(&registry, MetricName::CopyJobs, copy_jobs_total.clone())?;
        register(&registry, MetricName::CopyCandidates, copy_candidates.clone())?;
        register(&registry, MetricName::CopyInFlight, copy_in_flight.clone())?;
        register(&registry, MetricName::CopyInFlightPeak, copy_in_flight_peak.clone())?;

        // Pre-create label series so a fresh render lists every kind at zero.
        for kind in OUTCOME_KINDS {
            let _ = copy_outcomes_total.with_label_values(&[*kind]);
        }
        for status in JOB_STATUSES {
            let _ = copy_jobs_total.with_label_values(&[*status]);
        }

        Ok(Self {
            inner: Arc::new(MetricsInner {
                registry,
                copy_outcomes_total,
                copy_jobs_total,
                copy_candidates,
                copy_in_flight,
                copy_in_flight_peak,
            }),
        })
    }

    /// Increment the per-file outcome counter for `kind`.
    pub fn inc_outcome(&self, kind: &str) {
        self.inner
            .copy_outcomes_total
            .with_label_values(&[kind])
            .inc();
    }

    /// Increment the finished-job counter for `status`.
    pub fn inc_job(&self, status: &str) {
        self.inner.copy_jobs_total.with_label_values(&[status]).inc();
    }

    /// Record how many candidates the latest walk produced.
    pub fn set_candidates(&self, count: usize) {
        self.inner
            .copy_candidates
            .set(i64::try_from(count).unwrap_or(i64::MAX));
    }

    /// Record how many work units are dispatched.
    pub fn set_in_flight(&self, count: usize) {
        self.inner
            .copy_in_flight
            .set(i64::try_from(count).unwrap_or(i64::MAX));
    }

    /// Record the concurrency high-water mark of the latest job.
    pub fn set_in_flight_peak(&self, count: usize) {
        self.inner
            .copy_in_flight_peak
            .set(i64::try_from(count).unwrap_or(i64::MAX));
    }

    /// Render the metrics registry using the Prometheus text exposition format.
    ///
    /// # Errors
    ///
    /// Returns an error if the metrics cannot be encoded or if the encoded
    /// buffer is not valid UTF-8.
    pub fn render(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.inner.registry.gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(|source| TelemetryError::MetricsEncode { source })?;
        String::from_utf8(buffer).map_err(|source| TelemetryError::MetricsUtf8 { source })
    }

    /// Take a point-in-time snapshot of the copy counters.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        let outcome = |kind: &str| {
            self.inner
                .copy_outcomes_total
                .with_label_values(&[kind])
                .get()
        };
        let jobs = |status: &str| self.inner.copy_jobs_total.with_label_values(&[status]).get();
        MetricsSnapshot {
            copied_total: outcome("copied"),
            updated_total: outcome("updated"),
            skipped_total: outcome("skipped"),
            errored_total: outcome("errored"),
            jobs_completed: jobs("completed"),
            jobs_aborted: jobs("aborted"),
            jobs_rejected: jobs("rejected"),
            candidates: self.inner.copy_candidates.get(),
            in_flight: self.inner.copy_in_flight.get(),
            in_flight_peak: self.inner.copy_in_flight_peak.get(),
        }
    }
}

fn counter_vec(metric: MetricName, label: &str) -> Result<IntCounterVec> {
    IntCounterVec::new(metric.opts(), &[label])
        .map_err(|source| TelemetryError::MetricsCollector { metric, source })
}

fn gauge(metric: MetricName) -> Result<IntGauge> {
    IntGauge::with_opts(metric.opts())
        .map_err(|source| TelemetryError::MetricsCollector { metric, source })
}

fn register<C>(registry: &Registry, metric: MetricName, collector: C) -> Result<()>
where
    C: prometheus::core::Collector + 'static,
{
    registry
        .register(Box::new(collector))
        .map_err(|source| TelemetryError::MetricsRegister { metric, source })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metrics_snapshot_reflects_updates() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let metrics = Metrics::new()?;
        metrics.inc_outcome("copied");
        metrics.inc_outcome("copied");
        metrics.inc_outcome("updated");
        metrics.inc_outcome("errored");
        metrics.inc_job("completed");
        metrics.set_candidates(12);
        metrics.set_in_flight(3);
        metrics.set_in_flight_peak(2);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.copied_total, 2);
        assert_eq!(snapshot.updated_total, 1);
        assert_eq!(snapshot.skipped_total, 0);
        assert_eq!(snapshot.errored_total, 1);
        assert_eq!(snapshot.jobs_completed, 1);
        assert_eq!(snapshot.jobs_aborted, 0);
        assert_eq!(snapshot.jobs_rejected, 0);
        assert_eq!(snapshot.candidates, 12);
        assert_eq!(snapshot.in_flight, 3);
        assert_eq!(snapshot.in_flight_peak, 2);

        let json = serde_json::to_value(&snapshot)?;
        assert_eq!(json["copied_total"], 2);

        let rendered = metrics.render()?;
        assert!(rendered.contains("copy_outcomes_total"));
        assert!(rendered.contains("copy_jobs_total"));
        assert!(rendered.contains("copy_candidates 12"));
        Ok(())
    }

    #[test]
    fn fresh_registry_renders_every_collector_and_kind() -> std::result::Result<(), TelemetryError> {
        let rendered = Metrics::new()?.render()?;
        for metric in MetricName::ALL {
            assert!(rendered.contains(metric.as_str()), "missing {metric}");
        }
        for kind in OUTCOME_KINDS {
            assert!(rendered.contains(&format!("kind=\"{kind}\"")), "missing {kind}");
        }
        Ok(())
    }

    #[test]
    fn duplicate_registration_names_the_collector() -> std::result::Result<(), TelemetryError> {
        let registry = Registry::new();
        let jobs = counter_vec(MetricName::CopyJobs, "status")?;
        register(&registry, MetricName::CopyJobs, jobs.clone())?;

        let second = register(&registry, MetricName::CopyJobs, jobs);
        assert!(matches!(
            second,
            Err(TelemetryError::MetricsRegister {
                metric: MetricName::CopyJobs,
                ..
            })
        ));
        Ok(())
    }
}
