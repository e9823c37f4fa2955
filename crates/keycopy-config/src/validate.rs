//! Validation helpers and parsing utilities for configuration values.

use crate::defaults::MAX_WORKERS;
use crate::error::{ConfigError, ConfigResult};

/// Split keyword text into keywords, one per line.
///
/// Surrounding whitespace is trimmed and blank lines are discarded. Order and
/// duplicates are preserved because keyword matching is first-match.
#[must_use]
pub fn parse_keywords(text: &str) -> Vec<String> {
    normalize_keywords(text.lines())
}

/// Trim keywords and drop blank entries.
#[must_use]
pub fn normalize_keywords<I, S>(entries: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    entries
        .into_iter()
        .filter_map(|entry| {
            let trimmed = entry.as_ref().trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        })
        .collect()
}

/// Parse a worker count from text (environment variables, CLI flags).
///
/// # Errors
///
/// Returns [`ConfigError::InvalidField`] when the text is not an integer in
/// `1..=MAX_WORKERS`.
pub fn parse_workers(value: &str) -> ConfigResult<usize> {
    let workers = value
        .trim()
        .parse::<usize>()
        .map_err(|_| ConfigError::invalid("workers", value, "not_an_integer"))?;
    validate_workers(workers)
}

/// Ensure the worker count is within the accepted range.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidField`] when `workers` is zero or above `MAX_WORKERS`.
pub fn validate_workers(workers: usize) -> ConfigResult<usize> {
    if (1..=MAX_WORKERS).contains(&workers) {
        Ok(workers)
    } else {
        Err(ConfigError::invalid(
            "workers",
            workers.to_string(),
            "out_of_range",
        ))
    }
}

/// Normalise and validate a log format name.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidField`] for anything but `pretty` or `json`.
pub fn validate_log_format(value: &str) -> ConfigResult<String> {
    let normalized = value.trim().to_ascii_lowercase();
    match normalized.as_str() {
        "pretty" | "json" => Ok(normalized),
        _ => Err(ConfigError::invalid("log_format", value, "unknown_format")),
    }
}

/// Ensure the log level is not blank.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidField`] for a blank level.
pub fn validate_log_level(value: &str) -> ConfigResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::invalid("log_level", value, "empty"));
    }
    Ok(trimmed.to_string())
}
