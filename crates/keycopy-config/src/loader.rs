//! Layered configuration loading.
//!
//! # Design
//! - Precedence, lowest first: built-in defaults, JSON file, environment.
//! - Command-line flags are applied by the caller on top of the result.
//! - The environment is injected as a lookup function so tests never touch
//!   process-wide state.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::defaults::{ENV_CONFIG_PATH, ENV_LOG_FORMAT, ENV_LOG_LEVEL, ENV_WORKERS};
use crate::error::{ConfigError, ConfigResult};
use crate::model::AppConfig;
use crate::validate::{parse_workers, validate_log_format, validate_log_level, validate_workers};

/// Load configuration from an optional file and the process environment.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or if any layer
/// supplies an invalid value.
pub fn load_config_from_env(path: Option<&Path>) -> ConfigResult<AppConfig> {
    load_config(path, |name| std::env::var(name).ok())
}

/// Load configuration from an optional file and an environment lookup.
///
/// When `path` is `None`, the file named by `KEYCOPY_CONFIG` is used if set.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or if any layer
/// supplies an invalid value.
pub fn load_config<F>(path: Option<&Path>, env: F) -> ConfigResult<AppConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let file_path = path
        .map(Path::to_path_buf)
        .or_else(|| env(ENV_CONFIG_PATH).map(PathBuf::from));

    let mut config = match file_path {
        Some(file) => read_config_file(&file)?,
        None => AppConfig::default(),
    };

    if let Some(value) = env(ENV_WORKERS) {
        config.workers = parse_workers(&value)?;
    }
    if let Some(value) = env(ENV_LOG_LEVEL) {
        config.log_level = value;
    }
    if let Some(value) = env(ENV_LOG_FORMAT) {
        config.log_format = value;
    }

    config.workers = validate_workers(config.workers)?;
    config.log_level = validate_log_level(&config.log_level)?;
    config.log_format = validate_log_format(&config.log_format)?;
    Ok(config)
}

fn read_config_file(path: &Path) -> ConfigResult<AppConfig> {
    debug!(path = %path.display(), "loading configuration file");
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| ConfigError::Json {
        path: path.to_path_buf(),
        source,
    })
}
