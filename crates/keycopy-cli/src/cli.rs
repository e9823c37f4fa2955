//! Argument parsing, configuration layering and command dispatch.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use keycopy_config::validate::validate_workers;
use keycopy_config::{AppConfig, load_config_from_env};
use keycopy_telemetry::{
    GlobalContextGuard, LogFormat, LoggingConfig, init_logging, record_app_mode,
};

use crate::commands::config::handle_config_show;
use crate::commands::run::handle_run;
use crate::error::CliResult;

const BUILD_SHA: Option<&str> = option_env!("KEYCOPY_BUILD_SHA");

/// Parses CLI arguments, loads configuration, installs logging and executes
/// the requested command. Returns the process exit code.
pub async fn run() -> i32 {
    let cli = Cli::parse();
    match execute(cli).await {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("error: {}", err.display_message());
            err.exit_code()
        }
    }
}

async fn execute(cli: Cli) -> CliResult<()> {
    let config = effective_config(&cli)?;
    init_telemetry(&config);
    let _context = GlobalContextGuard::new("cli");
    record_app_mode(command_label(&cli.command));

    match cli.command {
        Command::Run(args) => handle_run(args, &config, cli.output).await,
        Command::Config(_) => handle_config_show(&config, cli.output),
    }
}

/// Defaults, then the JSON file, then the environment, then command-line flags.
pub(crate) fn effective_config(cli: &Cli) -> CliResult<AppConfig> {
    let mut config = load_config_from_env(cli.config.as_deref())?;
    if let Command::Run(args) = &cli.command
        && let Some(workers) = args.workers
    {
        config.workers = validate_workers(workers)?;
    }
    Ok(config)
}

fn init_telemetry(config: &AppConfig) {
    let format = LogFormat::from_name(&config.log_format).unwrap_or_else(LogFormat::infer);
    let logging = LoggingConfig::new(&config.log_level, format)
        .with_build_sha(BUILD_SHA.unwrap_or("dev"));
    if let Err(err) = init_logging(&logging) {
        eprintln!("warning: logging unavailable: {err}");
    }
}

const fn command_label(command: &Command) -> &'static str {
    match command {
        Command::Run(_) => "run",
        Command::Config(_) => "config",
    }
}

#[derive(Parser)]
#[command(
    name = "keycopy",
    version,
    about = "Copy files whose names contain a keyword into a destination directory"
)]
pub(crate) struct Cli {
    #[arg(
        long,
        global = true,
        help = "JSON configuration file (defaults to $KEYCOPY_CONFIG when set)"
    )]
    pub(crate) config: Option<PathBuf>,
    #[arg(
        long = "output",
        alias = "format",
        global = true,
        value_enum,
        default_value_t = OutputFormat::Table,
        help = "Select output format for progress and summaries"
    )]
    pub(crate) output: OutputFormat,
    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Subcommand)]
pub(crate) enum Command {
    /// Scan the source tree and copy matching files.
    Run(RunArgs),
    /// Print the effective configuration.
    Config(ConfigArgs),
}

#[derive(Args)]
pub(crate) struct RunArgs {
    #[arg(
        long = "keyword",
        short = 'k',
        value_name = "KEYWORD",
        help = "Substring to look for in file names; repeatable, first match wins"
    )]
    pub(crate) keywords: Vec<String>,
    #[arg(long, value_name = "FILE", help = "File with one keyword per line")]
    pub(crate) keywords_file: Option<PathBuf>,
    #[arg(long, short = 's', value_name = "DIR")]
    pub(crate) source: PathBuf,
    #[arg(long = "dest", short = 'd', alias = "destination", value_name = "DIR")]
    pub(crate) destination: PathBuf,
    #[arg(long, help = "Maximum number of files processed concurrently")]
    pub(crate) workers: Option<usize>,
    #[arg(long, help = "Print Prometheus metrics after the job")]
    pub(crate) metrics: bool,
}

#[derive(Default, Args)]
pub(crate) struct ConfigArgs {}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    #[default]
    Table,
    Json,
}
