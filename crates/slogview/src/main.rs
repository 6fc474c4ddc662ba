use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};

use slogview_chart as chart;
use slogview_db::Database;
use slogview_logging::{init_tracing, LogFormat, Logger};
use slogview_parser::LogEncoding;

mod config;
mod report;
mod run;

use config::ProjectConfig;
use run::{run, RunConfig, RunOutcome};

const DEFAULT_LOG_LEVEL: &str = "error";

#[derive(Parser, Debug)]
#[command(
    name = "slogview",
    about = "Parse a central model session log into users, sessions, syncs and link loads",
    version,
    author
)]
struct Cli {
    /// Path to the session log (.slog)
    log_path: PathBuf,

    /// Project code used to name the store and the chart
    project_code: String,

    /// Store session records and render the timeline chart
    #[arg(long)]
    store: bool,

    /// Directory for the session store (default: ~/.local/share/slogview/db)
    #[arg(long = "store_path")]
    store_path: Option<PathBuf>,

    /// Render the timeline chart without storing
    #[arg(long)]
    chart: bool,

    /// Directory for the timeline chart (default: ~/.local/share/slogview/html)
    #[arg(long = "html_dir")]
    html_dir: Option<PathBuf>,

    /// Text encoding of the log file
    #[arg(long, value_enum)]
    encoding: Option<EncodingChoice>,

    /// Close each sync with the matching <STC marker of its session
    #[arg(long = "pair_syncs")]
    pair_syncs: bool,

    /// Log output format
    #[arg(long = "log_format", value_enum)]
    log_format: Option<LogFormatChoice>,

    /// Tracing filter (RUST_LOG takes precedence)
    #[arg(long = "log_level")]
    log_level: Option<String>,

    /// Also append every event as JSON to this file
    #[arg(long = "log_file")]
    log_file: Option<PathBuf>,

    /// Print the session records as JSON on stdout
    #[arg(long = "json_output")]
    json_output: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum EncodingChoice {
    Auto,
    Utf16le,
    Utf8,
}

impl From<EncodingChoice> for LogEncoding {
    fn from(choice: EncodingChoice) -> Self {
        match choice {
            EncodingChoice::Auto => LogEncoding::Auto,
            EncodingChoice::Utf16le => LogEncoding::Utf16le,
            EncodingChoice::Utf8 => LogEncoding::Utf8,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormatChoice {
    Pretty,
    Json,
    Compact,
}

impl From<LogFormatChoice> for LogFormat {
    fn from(choice: LogFormatChoice) -> Self {
        match choice {
            LogFormatChoice::Pretty => LogFormat::Pretty,
            LogFormatChoice::Json => LogFormat::Json,
            LogFormatChoice::Compact => LogFormat::Compact,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let working_dir = std::env::current_dir().context("Failed to get current directory")?;
    let project = ProjectConfig::load(&working_dir)?.unwrap_or_default();

    let log_level = cli
        .log_level
        .clone()
        .or_else(|| project.log_level.clone())
        .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());
    let config = resolve_config(&cli, project);

    init_tracing(&log_level, config.log_format);
    tracing::debug!(?config, "Resolved configuration");

    let logger = match cli.log_file {
        Some(ref path) => Logger::with_file(config.log_format, path)
            .with_context(|| format!("Failed to open log file {}", path.display()))?,
        None => Logger::new(config.log_format),
    };

    let outcome = run(&config, &logger)?;

    if let RunOutcome::Parsed(ref summary) = outcome {
        if cli.json_output {
            let json = serde_json::to_string_pretty(&summary.records)?;
            println!("{}", json);
        }
    }

    std::process::exit(outcome.exit_code());
}

/// Command line flags win over `slogview.toml`, which wins over built-in defaults.
fn resolve_config(cli: &Cli, project: ProjectConfig) -> RunConfig {
    RunConfig {
        log_path: cli.log_path.clone(),
        project_code: cli.project_code.clone(),
        store: cli.store,
        store_path: cli
            .store_path
            .clone()
            .or(project.store_path)
            .unwrap_or_else(Database::default_dir),
        chart: cli.chart,
        html_dir: cli
            .html_dir
            .clone()
            .or(project.html_dir)
            .unwrap_or_else(chart::default_dir),
        encoding: cli
            .encoding
            .map(LogEncoding::from)
            .or(project.encoding)
            .unwrap_or_default(),
        pair_syncs: cli.pair_syncs || project.pair_syncs.unwrap_or(false),
        log_format: cli
            .log_format
            .map(LogFormat::from)
            .or(project.log_format)
            .unwrap_or_default(),
    }
}
