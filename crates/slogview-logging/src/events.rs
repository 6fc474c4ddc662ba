use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Structured events emitted while parsing and reporting a session log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LogEvent {
    ParseStarted {
        file_name: String,
        log_path: PathBuf,
    },
    SourceMissing {
        log_path: PathBuf,
    },
    UsersFound {
        count: usize,
    },
    UserReport {
        user: String,
        sessions: usize,
    },
    SessionReport {
        user: String,
        session_id: String,
        host: String,
        build: String,
        start: String,
        end: Option<String>,
        duration: Option<String>,
    },
    LinkReport {
        session_id: String,
        link_id: String,
        start: String,
        duration: String,
        path: String,
    },
    SyncReport {
        session_id: String,
        sync_id: String,
        start: String,
        duration: Option<String>,
    },
    /// A match that could not be attached to the index
    MatchSkipped {
        stage: String,
        token: String,
        reason: String,
    },
    StoreOpened {
        path: PathBuf,
        records: usize,
    },
    RecordStored {
        user: String,
        session_id: String,
    },
    RecordPresent {
        user: String,
        session_id: String,
    },
    RecordFailed {
        user: String,
        session_id: String,
        error: String,
    },
    ChartWritten {
        path: PathBuf,
        bars: usize,
    },
    ParseFinished {
        log_path: PathBuf,
        users: usize,
        sessions: usize,
        duration_secs: f64,
    },
}

impl LogEvent {
    /// Add a timestamp to serialize with the event
    fn with_timestamp(&self) -> serde_json::Value {
        let mut value = serde_json::to_value(self).unwrap_or_default();
        if let Some(obj) = value.as_object_mut() {
            obj.insert(
                "timestamp".to_string(),
                serde_json::Value::String(chrono::Utc::now().to_rfc3339()),
            );
        }
        value
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Colored console report
    #[default]
    Pretty,
    /// JSON lines format for machine consumption
    Json,
    /// Compact single-line format
    Compact,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            "compact" => Ok(LogFormat::Compact),
            _ => Err(format!("Unknown log format: {}", s)),
        }
    }
}

/// Logger for slogview events - handles both console output and file logging
pub struct Logger {
    format: LogFormat,
    file_writer: Option<Mutex<File>>,
}

impl Logger {
    pub fn new(format: LogFormat) -> Self {
        Self {
            format,
            file_writer: None,
        }
    }

    /// Create a logger with file output in addition to console
    pub fn with_file(format: LogFormat, log_path: &Path) -> std::io::Result<Self> {
        if let Some(parent) = log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_path)?;

        Ok(Self {
            format,
            file_writer: Some(Mutex::new(file)),
        })
    }

    pub fn format(&self) -> LogFormat {
        self.format
    }

    pub fn log(&self, event: &LogEvent) {
        // File output is always JSON
        if let Some(ref writer) = self.file_writer {
            if let Ok(mut file) = writer.lock() {
                let json = event.with_timestamp();
                let _ = writeln!(file, "{}", json);
            }
        }

        match self.format {
            LogFormat::Json => self.log_json(event),
            LogFormat::Pretty => self.log_pretty(event),
            LogFormat::Compact => self.log_compact(event),
        }
    }

    fn log_json(&self, event: &LogEvent) {
        if let Ok(json) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{}", json);
        }
    }

    fn log_pretty(&self, event: &LogEvent) {
        let mut stderr = std::io::stderr();
        match event {
            LogEvent::ParseStarted {
                file_name,
                log_path,
            } => {
                let _ = writeln!(
                    stderr,
                    "{}",
                    format!("+parsing: {}", file_name).bright_cyan().bold()
                );
                let _ = writeln!(stderr, " at path: {}", log_path.display());
            }
            LogEvent::SourceMissing { .. } => {
                let _ = writeln!(
                    stderr,
                    "{}",
                    "+slog not found at specified path!".bright_red().bold()
                );
            }
            LogEvent::UsersFound { count } => {
                let _ = writeln!(
                    stderr,
                    "{}",
                    format!("-found {} users:", count).bright_yellow().bold()
                );
            }
            LogEvent::UserReport { user, .. } => {
                let _ = writeln!(stderr, "{}", format!("-{}:", user).bright_green().bold());
            }
            LogEvent::SessionReport {
                session_id,
                host,
                build,
                start,
                duration,
                ..
            } => {
                let _ = writeln!(stderr, "     session {}", session_id.yellow().bold());
                let _ = writeln!(
                    stderr,
                    "     on {} {} | start {} | duration {}",
                    host,
                    build,
                    start,
                    duration.as_deref().unwrap_or("open")
                );
            }
            LogEvent::LinkReport {
                start,
                duration,
                path,
                ..
            } => {
                let _ = writeln!(
                    stderr,
                    "          link open start {} | duration {}",
                    start, duration
                );
                let _ = writeln!(stderr, "             {}", path.dimmed());
            }
            LogEvent::SyncReport { start, duration, .. } => {
                let line = match duration {
                    Some(d) => format!("          sync start {} | duration {}", start, d),
                    None => format!("          sync start {}", start),
                };
                let _ = writeln!(stderr, "{}", line.yellow());
            }
            LogEvent::MatchSkipped {
                stage,
                token,
                reason,
            } => {
                let _ = writeln!(
                    stderr,
                    "{} {} {}: {}",
                    "⚠".bright_yellow(),
                    stage.dimmed(),
                    token,
                    reason.dimmed()
                );
            }
            LogEvent::StoreOpened { path, .. } => {
                let _ = writeln!(stderr, "{}", "-db access.".bright_cyan().bold());
                let _ = writeln!(stderr, " at path: {}", path.display().to_string().dimmed());
            }
            LogEvent::RecordStored { user, session_id } => {
                let _ = writeln!(
                    stderr,
                    "{}",
                    format!(" {} with session {} stored in db", user, session_id).green()
                );
            }
            LogEvent::RecordPresent { user, session_id } => {
                let _ = writeln!(
                    stderr,
                    "{}",
                    format!(" {} with session {} already in db", user, session_id).yellow()
                );
            }
            LogEvent::RecordFailed {
                user,
                session_id,
                error,
            } => {
                let _ = writeln!(
                    stderr,
                    "{} {} with session {} not stored: {}",
                    "✗".bright_red(),
                    user,
                    session_id,
                    error.bright_red()
                );
            }
            LogEvent::ChartWritten { path, .. } => {
                let _ = writeln!(
                    stderr,
                    "{} {}",
                    "-chart:".bright_cyan().bold(),
                    path.display()
                );
            }
            LogEvent::ParseFinished { log_path, .. } => {
                let _ = writeln!(
                    stderr,
                    "{}",
                    format!("+finished parsing {}", log_path.display())
                        .bright_cyan()
                        .bold()
                );
            }
        }
    }

    fn log_compact(&self, event: &LogEvent) {
        let mut stderr = std::io::stderr();
        let timestamp = chrono::Utc::now().format("%H:%M:%S");
        let msg = match event {
            LogEvent::ParseStarted { log_path, .. } => {
                format!("[{}] parse:start {}", timestamp, log_path.display())
            }
            LogEvent::SourceMissing { log_path } => {
                format!("[{}] parse:missing {}", timestamp, log_path.display())
            }
            LogEvent::UsersFound { count } => format!("[{}] users:{}", timestamp, count),
            LogEvent::UserReport { user, sessions } => {
                format!("[{}] user:{} sessions={}", timestamp, user, sessions)
            }
            LogEvent::SessionReport {
                session_id,
                start,
                duration,
                ..
            } => format!(
                "[{}] session:{} {} {}",
                timestamp,
                session_id,
                start,
                duration.as_deref().unwrap_or("open")
            ),
            LogEvent::LinkReport {
                link_id, duration, ..
            } => format!("[{}] link:{} {}", timestamp, link_id, duration),
            LogEvent::SyncReport { sync_id, start, .. } => {
                format!("[{}] sync:{} {}", timestamp, sync_id, start)
            }
            LogEvent::MatchSkipped { stage, token, .. } => {
                format!("[{}] skip:{}:{}", timestamp, stage, token)
            }
            LogEvent::StoreOpened { path, records } => {
                format!("[{}] db:open {} records={}", timestamp, path.display(), records)
            }
            LogEvent::RecordStored { session_id, .. } => {
                format!("[{}] db:stored:{}", timestamp, session_id)
            }
            LogEvent::RecordPresent { session_id, .. } => {
                format!("[{}] db:present:{}", timestamp, session_id)
            }
            LogEvent::RecordFailed {
                session_id, error, ..
            } => format!("[{}] db:failed:{} {}", timestamp, session_id, error),
            LogEvent::ChartWritten { path, bars } => {
                format!("[{}] chart:{} bars={}", timestamp, path.display(), bars)
            }
            LogEvent::ParseFinished {
                users,
                sessions,
                duration_secs,
                ..
            } => format!(
                "[{}] parse:done users={} sessions={} {:.2}s",
                timestamp, users, sessions, duration_secs
            ),
        };
        let _ = writeln!(stderr, "{}", msg);
    }
}
