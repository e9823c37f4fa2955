#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

//! Concurrent scan-match-copy engine.
//!
//! A job walks a source tree, keeps files whose names contain one of the
//! requested keywords, and copies them into a destination directory when the
//! destination has no copy yet or holds a strictly older one. Jobs are
//! cooperatively cancellable and report per-file outcomes plus a final summary
//! through a [`ProgressSink`].
//!
//! Layout: `classify.rs` (per-file decision), `transfer.rs` (byte copy),
//! `walk.rs` (source enumeration), `service.rs` (coordinator), `sink.rs`
//! (observer interface), `cancel.rs`, `model.rs`, `error.rs`.

pub mod cancel;
pub mod classify;
pub mod error;
pub mod model;
pub mod service;
pub mod sink;
pub mod transfer;
pub mod walk;

pub use cancel::CancelToken;
pub use classify::{classify, is_same_file, match_keyword};
pub use error::{CopyError, CopyResult};
pub use keycopy_events::{OutcomeKind, SummaryCounts};
pub use model::{CandidateFile, Classification, JobRequest, JobSummary, Outcome, SkipReason};
pub use service::{CopyService, SAME_DIRECTORY_DETAIL};
pub use sink::{EventSink, ProgressSink};
pub use transfer::copy_file;
pub use walk::TreeWalker;
