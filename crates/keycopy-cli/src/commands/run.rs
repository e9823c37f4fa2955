//! `keycopy run`: execute one copy job and stream its progress.

use std::fs;
use std::path::Path;

use keycopy_config::{AppConfig, normalize_keywords, parse_keywords};
use keycopy_core::{CopyService, EventSink, JobRequest, JobSummary, SAME_DIRECTORY_DETAIL};
use keycopy_events::{Event, EventBus, EventStream};
use keycopy_telemetry::Metrics;
use tokio::task::JoinHandle;
use tracing::warn;
use uuid::Uuid;

use crate::cli::{OutputFormat, RunArgs};
use crate::error::{CliError, CliResult};
use crate::output::{format_dropped, format_event, format_summary};

pub(crate) async fn handle_run(
    args: RunArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> CliResult<()> {
    let keywords = collect_keywords(&args.keywords, args.keywords_file.as_deref())?;
    let request = JobRequest::new(&keywords, &args.source, &args.destination)?;
    let metrics = Metrics::new().map_err(CliError::failure)?;
    let service = CopyService::new(config.copy_policy(), metrics.clone());

    let interrupt = spawn_interrupt_handler(service.clone(), request.clone());
    let report = run_job(&service, &request, format, |line| println!("{line}")).await;
    interrupt.abort();
    let summary = report?;

    println!("{}", format_summary(request.id(), &summary, format)?);
    if args.metrics {
        print!("{}", metrics.render().map_err(CliError::failure)?);
    }
    job_status(&request, &summary)
}

/// Merge `--keyword` flags with the keywords file, trimmed and without blanks.
pub(crate) fn collect_keywords(flags: &[String], file: Option<&Path>) -> CliResult<Vec<String>> {
    let mut keywords = normalize_keywords(flags);
    if let Some(path) = file {
        let text = fs::read_to_string(path).map_err(|err| {
            CliError::validation(format!(
                "failed to read keywords file {}: {err}",
                path.display()
            ))
        })?;
        keywords.extend(parse_keywords(&text));
    }
    if keywords.is_empty() {
        return Err(CliError::validation(
            "at least one keyword is required (--keyword or --keywords-file)",
        ));
    }
    Ok(keywords)
}

/// Run the job while rendering its events through `emit`.
pub(crate) async fn run_job<F>(
    service: &CopyService,
    request: &JobRequest,
    format: OutputFormat,
    mut emit: F,
) -> CliResult<JobSummary>
where
    F: FnMut(String),
{
    let bus = EventBus::new();
    let mut stream = bus.subscribe(None);
    let sink = EventSink::new(bus, request.id());

    let (summary, rendered) = tokio::join!(
        service.run(request, &sink),
        render_events(&mut stream, request.id(), format, &mut emit),
    );
    rendered?;
    Ok(summary)
}

async fn render_events<F>(
    stream: &mut EventStream,
    job_id: Uuid,
    format: OutputFormat,
    emit: &mut F,
) -> CliResult<()>
where
    F: FnMut(String),
{
    while let Some(envelope) = stream.next().await {
        if envelope.event.job_id() != job_id {
            continue;
        }
        if let Some(line) = format_event(&envelope, format)? {
            emit(line);
        }
        if matches!(envelope.event, Event::JobFinished { .. }) {
            break;
        }
    }
    if stream.dropped() > 0 {
        emit(format_dropped(stream.dropped(), format)?);
    }
    Ok(())
}

fn spawn_interrupt_handler(service: CopyService, request: JobRequest) -> JoinHandle<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received; stopping after in-flight copies finish");
            service.request_cancel(&request);
        }
    })
}

/// Map a finished job onto the CLI's exit status.
pub(crate) fn job_status(request: &JobRequest, summary: &JobSummary) -> CliResult<()> {
    if !summary.aborted {
        return Ok(());
    }
    if request.source_root() == request.destination_root() {
        return Err(CliError::validation(SAME_DIRECTORY_DETAIL));
    }
    Err(CliError::Aborted)
}
