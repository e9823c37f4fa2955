#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

//! Telemetry primitives shared across the keycopy workspace.
//!
//! This crate centralises logging and metrics so the core engine and the CLI
//! front end share one observability story.
//!
//! Layout: `init.rs` (subscriber installation), `context.rs` (application
//! span guard), `metrics.rs` (Prometheus registry), `error.rs` (errors).

pub mod context;
pub mod error;
pub mod init;
pub mod metrics;

pub use context::{GlobalContextGuard, job_span, record_app_mode};
pub use error::{Result, TelemetryError};
pub use init::{LogFormat, LoggingConfig, build_sha, init_logging};
pub use metrics::{MetricName, Metrics, MetricsSnapshot};
