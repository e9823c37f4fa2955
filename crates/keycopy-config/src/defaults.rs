//! Default values and environment variable names.
//!
//! # Design
//! - Keep every tunable's default and its override variable side by side.

use std::num::NonZeroUsize;
use std::thread;

/// Environment variable naming an optional JSON configuration file.
pub const ENV_CONFIG_PATH: &str = "KEYCOPY_CONFIG";
/// Environment override for the worker pool size.
pub const ENV_WORKERS: &str = "KEYCOPY_WORKERS";
/// Environment override for the log level.
pub const ENV_LOG_LEVEL: &str = "KEYCOPY_LOG_LEVEL";
/// Environment override for the log format.
pub const ENV_LOG_FORMAT: &str = "KEYCOPY_LOG_FORMAT";

/// Upper bound accepted for the worker pool size.
pub const MAX_WORKERS: usize = 256;
/// Cap applied to the derived default pool size.
pub const DEFAULT_WORKER_CAP: usize = 32;
/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Worker pool size used when nothing is configured: `min(32, cpus + 4)`.
#[must_use]
pub fn default_workers() -> usize {
    let cpus = thread::available_parallelism().map_or(1, NonZeroUsize::get);
    (cpus + 4).min(DEFAULT_WORKER_CAP)
}

/// Log format used when nothing is configured: pretty in debug builds, JSON otherwise.
#[must_use]
pub const fn default_log_format() -> &'static str {
    if cfg!(debug_assertions) {
        "pretty"
    } else {
        "json"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_workers_is_bounded() {
        let workers = default_workers();
        assert!(workers >= 5, "cpus + 4 is at least five");
        assert!(workers <= DEFAULT_WORKER_CAP);
    }
}
