//! Output renderers and formatting helpers for CLI commands.

use anyhow::anyhow;
use keycopy_config::AppConfig;
use keycopy_core::JobSummary;
use keycopy_events::{Event, EventEnvelope};
use serde_json::{Value, json};
use uuid::Uuid;

use crate::cli::OutputFormat;
use crate::error::{CliError, CliResult};

/// Render one progress event, or `None` when the event is not shown.
pub(crate) fn format_event(envelope: &EventEnvelope, format: OutputFormat) -> CliResult<Option<String>> {
    match format {
        OutputFormat::Json => serde_json::to_string(envelope)
            .map(Some)
            .map_err(|err| CliError::failure(anyhow!("failed to format event JSON: {err}"))),
        OutputFormat::Table => Ok(match &envelope.event {
            Event::JobStarted { keyword_count, .. } => {
                Some(format!("--- scanning for {keyword_count} keyword(s) ---"))
            }
            Event::CandidatesDiscovered { count, .. } => {
                Some(format!("candidates: {count} file(s)"))
            }
            Event::FileOutcome { kind, detail, .. } => Some(format!("{}: {detail}", kind.label())),
            Event::JobFinished { .. } => None,
        }),
    }
}

/// Notice for progress events the renderer fell too far behind to show.
pub(crate) fn format_dropped(count: u64, format: OutputFormat) -> CliResult<String> {
    match format {
        OutputFormat::Json => serde_json::to_string(&json!({ "dropped_events": count }))
            .map_err(|err| CliError::failure(anyhow!("failed to format JSON: {err}"))),
        OutputFormat::Table => Ok(format!(
            "warning: {count} progress event(s) were dropped; see the summary for totals"
        )),
    }
}

/// Summary as a JSON document.
pub(crate) fn summary_json(job_id: Uuid, summary: &JobSummary) -> Value {
    json!({
        "job_id": job_id,
        "copied": summary.copied,
        "updated": summary.updated,
        "skipped": summary.skipped,
        "errored": summary.errored,
        "unmatched": summary.unmatched,
        "late_copies": summary.late_copies,
        "aborted": summary.aborted,
    })
}

pub(crate) fn format_summary(
    job_id: Uuid,
    summary: &JobSummary,
    format: OutputFormat,
) -> CliResult<String> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(&summary_json(job_id, summary))
            .map_err(|err| CliError::failure(anyhow!("failed to format JSON: {err}"))),
        OutputFormat::Table => {
            let status = if summary.aborted {
                "aborted"
            } else {
                "completed"
            };
            let mut text = format!(
                "--- {status}: copied {}, updated {}, skipped {} ---",
                summary.copied, summary.updated, summary.skipped
            );
            if summary.errored > 0 {
                text = format!("{text}\nerrors: {}", summary.errored);
            }
            if summary.late_copies > 0 {
                text = format!(
                    "{text}\nfinished after cancellation: {} file(s) written but not reported",
                    summary.late_copies
                );
            }
            Ok(text)
        }
    }
}

pub(crate) fn render_config(config: &AppConfig, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => {
            let text = serde_json::to_string_pretty(config)
                .map_err(|err| CliError::failure(anyhow!("failed to format JSON: {err}")))?;
            println!("{text}");
        }
        OutputFormat::Table => {
            println!("workers: {}", config.workers);
            println!("log_level: {}", config.log_level);
            println!("log_format: {}", config.log_format);
        }
    }
    Ok(())
}
