//! CLI error type and the exit codes it maps to.

use std::fmt::{self, Display, Formatter};

use keycopy_config::ConfigError;
use keycopy_core::CopyError;

/// CLI-level error type to distinguish validation, operational failures and
/// user cancellation.
#[derive(Debug)]
pub(crate) enum CliError {
    Validation(String),
    Failure(anyhow::Error),
    Aborted,
}

/// Convenience alias for functions returning a `CliError`.
pub(crate) type CliResult<T> = Result<T, CliError>;

impl CliError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn failure(error: impl Into<anyhow::Error>) -> Self {
        Self::Failure(error.into())
    }

    pub(crate) const fn exit_code(&self) -> i32 {
        match self {
            Self::Validation(_) => 2,
            Self::Failure(_) => 3,
            Self::Aborted => 130,
        }
    }

    pub(crate) fn display_message(&self) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::Failure(error) => format!("{error:#}"),
            Self::Aborted => "copy job cancelled".to_string(),
        }
    }
}

impl Display for CliError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str("cli error")
    }
}

impl std::error::Error for CliError {}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        let message = match &err {
            ConfigError::Io { path, source } => {
                format!("{err}: {}: {source}", path.display())
            }
            ConfigError::Json { path, source } => {
                format!("{err}: {}: {source}", path.display())
            }
            ConfigError::InvalidField {
                field,
                value,
                reason,
            } => match value {
                Some(value) => format!("{err}: {field}={value:?} ({reason})"),
                None => format!("{err}: {field} ({reason})"),
            },
        };
        Self::Validation(message)
    }
}

impl From<CopyError> for CliError {
    fn from(err: CopyError) -> Self {
        match &err {
            CopyError::InvalidInput {
                field,
                reason,
                value,
            } => Self::Validation(match value {
                Some(value) => format!("invalid {field}: {reason} ({value})"),
                None => format!("invalid {field}: {reason}"),
            }),
            CopyError::Io { .. } | CopyError::Walkdir { .. } | CopyError::Join { .. } => {
                let cause = err.cause();
                Self::Failure(anyhow::Error::new(err).context(cause))
            }
        }
    }
}
