//! Typed configuration models.

use serde::{Deserialize, Serialize};

use crate::defaults::{DEFAULT_LOG_LEVEL, default_log_format, default_workers};

/// Effective application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Maximum number of files classified or copied concurrently.
    pub workers: usize,
    /// Log level directive handed to the tracing filter.
    pub log_level: String,
    /// Log output format (`pretty` or `json`).
    pub log_format: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            log_format: default_log_format().to_string(),
        }
    }
}

impl AppConfig {
    /// Snapshot of the settings the copy engine needs.
    #[must_use]
    pub const fn copy_policy(&self) -> CopyPolicy {
        CopyPolicy {
            workers: self.workers,
        }
    }
}

/// Copy engine settings handed to the core for one job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CopyPolicy {
    /// Maximum number of in-flight work units.
    pub workers: usize,
}

impl Default for CopyPolicy {
    fn default() -> Self {
        Self {
            workers: default_workers(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_documents_fill_defaults() -> Result<(), serde_json::Error> {
        let config: AppConfig = serde_json::from_str(r#"{"workers": 3}"#)?;
        assert_eq!(config.workers, 3);
        assert_eq!(config.log_level, DEFAULT_LOG_LEVEL);
        assert_eq!(config.copy_policy(), CopyPolicy { workers: 3 });
        Ok(())
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let parsed = serde_json::from_str::<AppConfig>(r#"{"threads": 3}"#);
        assert!(parsed.is_err());
    }
}
