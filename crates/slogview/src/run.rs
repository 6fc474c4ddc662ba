//! One parse of one log: read, index, report, then optionally store and chart.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use slogview_chart::{write_timeline, TimelineBar};
use slogview_db::{store_all, Database};
use slogview_logging::{LogEvent, LogFormat, Logger};
use slogview_parser::{
    parse_log, record_projection, tabular_projection, BuildOptions, LogEncoding, SourceError,
    UserRecords,
};

use crate::report::{report_index, report_store, StoreSummary};

/// Everything a run needs, resolved from the command line and `slogview.toml`.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub log_path: PathBuf,
    pub project_code: String,
    pub store: bool,
    pub store_path: PathBuf,
    pub chart: bool,
    pub html_dir: PathBuf,
    pub encoding: LogEncoding,
    pub pair_syncs: bool,
    pub log_format: LogFormat,
}

#[derive(Debug)]
pub enum RunOutcome {
    /// The log file does not exist; nothing was parsed.
    SourceMissing,
    Parsed(RunSummary),
}

#[derive(Debug)]
pub struct RunSummary {
    pub users: usize,
    pub sessions: usize,
    pub records: Vec<UserRecords>,
    pub store: Option<StoreSummary>,
    pub chart: Option<PathBuf>,
}

impl RunOutcome {
    pub fn exit_code(&self) -> i32 {
        match self {
            RunOutcome::SourceMissing => 1,
            RunOutcome::Parsed(_) => 0,
        }
    }
}

pub fn run(config: &RunConfig, logger: &Logger) -> Result<RunOutcome> {
    let started = Instant::now();

    let file_name = config
        .log_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let log_path = std::path::absolute(&config.log_path).unwrap_or_else(|_| config.log_path.clone());

    logger.log(&LogEvent::ParseStarted {
        file_name,
        log_path: log_path.clone(),
    });

    let options = BuildOptions {
        pair_syncs: config.pair_syncs,
    };
    let index = match parse_log(&config.log_path, config.encoding, options) {
        Ok(index) => index,
        Err(SourceError::NotFound(path)) => {
            logger.log(&LogEvent::SourceMissing { log_path: path });
            return Ok(RunOutcome::SourceMissing);
        }
        Err(e) => return Err(e).context("Failed to read session log"),
    };

    report_index(&index, logger);

    let records = record_projection(&index);
    let mut store = None;
    let mut chart = None;

    if config.store && !index.is_empty() {
        let db = Database::open_for_project(&config.store_path, &config.project_code)
            .with_context(|| format!("Failed to open store in {}", config.store_path.display()))?;
        logger.log(&LogEvent::StoreOpened {
            path: Database::project_path(&config.store_path, &config.project_code),
            records: index.session_count(),
        });

        let reports = store_all(&db, &records);
        store = Some(report_store(&reports, logger));
    }

    if (config.chart || config.store) && !index.is_empty() {
        let bars: Vec<TimelineBar> = tabular_projection(&index)
            .into_iter()
            .map(|row| TimelineBar {
                category: row.user,
                range_start: row.start,
                range_end: row.end,
            })
            .collect();

        let path = write_timeline(&config.html_dir, &config.project_code, &bars)
            .with_context(|| format!("Failed to write chart to {}", config.html_dir.display()))?;
        logger.log(&LogEvent::ChartWritten {
            path: path.clone(),
            bars: bars.len(),
        });
        chart = Some(path);
    }

    logger.log(&LogEvent::ParseFinished {
        log_path,
        users: index.users().len(),
        sessions: index.session_count(),
        duration_secs: started.elapsed().as_secs_f64(),
    });

    Ok(RunOutcome::Parsed(RunSummary {
        users: index.users().len(),
        sessions: index.session_count(),
        records,
        store,
        chart,
    }))
}
