#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

//! Event bus carrying copy-job progress to observers.
//!
//! The bus provides typed job events, sequential identifiers, and a bounded
//! replay ring so late subscribers can catch up on a job that is already
//! running. Internally it uses `tokio::broadcast`; when a subscriber lags, the
//! oldest events are dropped for that subscriber only.
//!
//! Layout: `payloads.rs` (event types), `routing.rs` (`EventBus`),
//! `error.rs` (publish failures).

pub mod error;
pub mod payloads;
pub mod routing;

pub use error::{EventBusError, EventBusResult};
pub use payloads::{
    DEFAULT_REPLAY_CAPACITY, Event, EventEnvelope, EventId, OutcomeKind, SummaryCounts,
};
pub use routing::{EventBus, EventStream};
