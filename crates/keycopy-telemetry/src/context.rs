//! Span helpers for the application and for individual copy jobs.
//!
//! # Design
//! - Provides an application-level span guard so top-level logs carry mode/build info.
//! - Gives every copy job its own span so worker logs can be correlated.

use std::fmt::Display;

use tracing::{Span, span::Entered};

use crate::init::build_sha;

/// Guard that keeps the application-level span entered for the lifetime of the process.
pub struct GlobalContextGuard {
    _guard: Entered<'static>,
}

impl GlobalContextGuard {
    /// Enter the application-level tracing span for the lifetime of the guard.
    #[must_use]
    pub fn new(mode: impl Into<String>) -> Self {
        let mode = mode.into();
        let span: &'static Span = Box::leak(Box::new(
            tracing::info_span!("app", mode = %mode, build_sha = %build_sha()),
        ));
        let guard = span.enter();
        Self { _guard: guard }
    }
}

/// Record the current application mode on the active span.
pub fn record_app_mode(mode: &str) {
    Span::current().record("mode", tracing::field::display(mode));
}

/// Span wrapping a single copy job.
#[must_use]
pub fn job_span(job_id: impl Display) -> Span {
    tracing::info_span!("copy_job", job_id = %job_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_context_guard_sets_app_mode_field() {
        let guard = GlobalContextGuard::new("test");
        record_app_mode("run");
        drop(guard);
    }

    #[test]
    fn job_span_can_be_entered() {
        let span = job_span("00000000-0000-0000-0000-000000000000");
        let _entered = span.enter();
        tracing::info!("inside job span");
    }
}
