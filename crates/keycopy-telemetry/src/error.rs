//! Error types for telemetry operations.

use std::string::FromUtf8Error;

use thiserror::Error;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::util::TryInitError;

use crate::metrics::MetricName;

/// Result alias for telemetry operations.
pub type Result<T> = std::result::Result<T, TelemetryError>;

/// Errors raised while installing logging or operating the metrics registry.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The configured log level was not a valid filter directive.
    #[error("invalid log filter directive")]
    InvalidFilter {
        /// Directive string as configured.
        directive: String,
        /// Parser error from `tracing-subscriber`.
        source: ParseError,
    },
    /// A global subscriber was already installed.
    #[error("failed to install tracing subscriber")]
    SubscriberInstall {
        /// Underlying installation error.
        source: TryInitError,
    },
    /// A collector could not be constructed.
    #[error("failed to build metrics collector")]
    MetricsCollector {
        /// Collector that failed.
        metric: MetricName,
        /// Underlying Prometheus error.
        source: prometheus::Error,
    },
    /// A collector could not be added to the registry.
    #[error("failed to register metrics collector")]
    MetricsRegister {
        /// Collector that failed.
        metric: MetricName,
        /// Underlying Prometheus error.
        source: prometheus::Error,
    },
    /// The registry could not be encoded in the text exposition format.
    #[error("failed to encode metrics")]
    MetricsEncode {
        /// Underlying Prometheus error.
        source: prometheus::Error,
    },
    /// Encoded metrics were not UTF-8.
    #[error("metrics output was not valid utf-8")]
    MetricsUtf8 {
        /// Underlying conversion error.
        source: FromUtf8Error,
    },
}

impl TelemetryError {
    /// Collector tied to the failure, when there is one.
    #[must_use]
    pub const fn metric(&self) -> Option<MetricName> {
        match self {
            Self::MetricsCollector { metric, .. } | Self::MetricsRegister { metric, .. } => {
                Some(*metric)
            }
            Self::InvalidFilter { .. }
            | Self::SubscriberInstall { .. }
            | Self::MetricsEncode { .. }
            | Self::MetricsUtf8 { .. } => None,
        }
    }
}
