//! `keycopy config`: show the effective configuration.

use keycopy_config::AppConfig;

use crate::cli::OutputFormat;
use crate::error::CliResult;
use crate::output::render_config;

pub(crate) fn handle_config_show(config: &AppConfig, format: OutputFormat) -> CliResult<()> {
    render_config(config, format)
}
