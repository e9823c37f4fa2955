//! Cooperative cancellation shared between a requester and one copy job.

use tokio_util::sync::CancellationToken;

/// Monotonic stop flag for a single job.
///
/// Clones observe the same flag. Once set it never resets; the walker and the
/// coordinator poll it, workers already running a copy are left to finish.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    inner: CancellationToken,
}

impl CancelToken {
    /// Create a fresh, unset token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the job to stop. Calling it more than once has no further effect.
    pub fn request_stop(&self) {
        self.inner.cancel();
    }

    /// Whether a stop has been requested.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.inner.is_cancelled()
    }

    /// Resolve once a stop has been requested.
    pub async fn stopped(&self) {
        self.inner.cancelled().await;
    }
}
