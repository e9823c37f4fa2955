//! Subscriber installation for the keycopy binaries.
//!
//! Logs go to stderr so stdout stays reserved for job progress. A valid
//! `RUST_LOG` takes precedence over the configured level; a configured level
//! that does not parse is an error rather than a silent fallback.

use std::io;

use once_cell::sync::OnceCell;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

use crate::error::{Result, TelemetryError};

static BUILD_SHA: OnceCell<String> = OnceCell::new();

/// Build identifier recorded by [`init_logging`], or `dev` before it runs.
#[must_use]
pub fn build_sha() -> &'static str {
    BUILD_SHA.get().map_or("dev", String::as_str)
}

/// How the subscriber should be configured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    level: String,
    format: LogFormat,
    build_sha: String,
}

impl LoggingConfig {
    /// Log at `level` (an `EnvFilter` directive such as `info` or `keycopy_core=debug`).
    #[must_use]
    pub fn new(level: impl Into<String>, format: LogFormat) -> Self {
        Self {
            level: level.into(),
            format,
            build_sha: "dev".to_string(),
        }
    }

    /// Attach the build identifier recorded on the application span.
    #[must_use]
    pub fn with_build_sha(mut self, build_sha: impl Into<String>) -> Self {
        self.build_sha = build_sha.into();
        self
    }

    /// Configured filter directive.
    #[must_use]
    pub fn level(&self) -> &str {
        &self.level
    }

    /// Configured output format.
    #[must_use]
    pub const fn format(&self) -> LogFormat {
        self.format
    }
}

/// Install the global subscriber.
///
/// # Errors
///
/// Returns [`TelemetryError::InvalidFilter`] when the configured level does
/// not parse, and [`TelemetryError::SubscriberInstall`] when a global
/// subscriber is already in place.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let from_env = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = env_filter(from_env.as_deref(), &config.level)?;
    let _ = BUILD_SHA.set(config.build_sha.clone());

    let output: Box<dyn Layer<Registry> + Send + Sync> = match config.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_target(false)
            .with_writer(io::stderr)
            .boxed(),
        LogFormat::Pretty => fmt::layer()
            .with_target(false)
            .with_writer(io::stderr)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(output)
        .with(filter)
        .try_init()
        .map_err(|source| TelemetryError::SubscriberInstall { source })
}

fn env_filter(from_env: Option<&str>, level: &str) -> Result<EnvFilter> {
    if let Some(directives) = from_env.filter(|value| !value.trim().is_empty())
        && let Ok(filter) = EnvFilter::try_new(directives)
    {
        return Ok(filter);
    }
    EnvFilter::try_new(level).map_err(|source| TelemetryError::InvalidFilter {
        directive: level.to_string(),
        source,
    })
}

/// Output formats for the subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per line.
    Json,
    /// Human-readable lines.
    Pretty,
}

impl LogFormat {
    /// Pretty output for debug builds, JSON otherwise.
    #[must_use]
    pub const fn infer() -> Self {
        if cfg!(debug_assertions) {
            Self::Pretty
        } else {
            Self::Json
        }
    }

    /// Parse a configured format name; unknown names yield `None`.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "json" => Some(Self::Json),
            "pretty" => Some(Self::Pretty),
            _ => None,
        }
    }

    /// Configuration name of the format.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Pretty => "pretty",
        }
    }
}
