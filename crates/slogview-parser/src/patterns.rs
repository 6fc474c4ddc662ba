//! Text patterns for the event markers found in a session log.
//!
//! Each pattern is matched independently against the whole log text. Regions
//! that do not fit a pattern are skipped silently, so a truncated or garbled
//! block simply contributes no event.

use chrono::NaiveDateTime;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ParseError;

/// Format of every timestamp in the log once the sub-second suffix is removed.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

lazy_static! {
    static ref HEADER: Regex = Regex::new(concat!(
        r#"(?P<start>\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2})(?:\.\d+)? >Session[ \t]+(?:[^\n]*[ \t])?(?P<token>\S+)[ \t]*\n"#,
        r#" user="(?P<user>[^"\n]+)"[^\n]*\n"#,
        r#" build="(?P<build>[^"\n]+)"[^\n]*\n"#,
        r#" journal="[^\n]+\n"#,
        r#" host=[^"\n]*"(?P<host>[^"\n]+)"[^\n]*\n"#,
        r#" server=[^"\n]*"[^"\n]+"[^\n]*\n"#,
        r#" central="(?P<central>[^"\n]+)"[^\n]*\n"#,
    ))
    .expect("valid header pattern");
    static ref TERMINATOR: Regex = Regex::new(
        r"(?P<token>\$\S+)[^\n]*?(?P<end>\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2})(?:\.\d+)? <Session"
    )
    .expect("valid terminator pattern");
    static ref SYNC_OPEN: Regex = Regex::new(
        r"(?m)(?P<token>\$\S+)[^\n]*?(?P<at>\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2})(?:\.\d+)? >STC[ \t]*$"
    )
    .expect("valid sync open pattern");
    static ref SYNC_CLOSE: Regex = Regex::new(
        r"(?m)(?P<token>\$\S+)[^\n]*?(?P<at>\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2})(?:\.\d+)? <STC[ \t]*$"
    )
    .expect("valid sync close pattern");
    static ref LINK_LOAD: Regex = Regex::new(concat!(
        r#"(?s)(?P<token>\$\S+) (?P<start>\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2})(?:\.\d+)? >OpenLink\s+"(?P<path>[^"]+)""#,
        r#".+? (?P<end>\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2})(?:\.\d+)? <OpenLink"#,
    ))
    .expect("valid link load pattern");
}

/// The kinds of event the scanner knows how to find.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Multi-line block opening a session.
    Header,
    /// Line closing a session.
    Terminator,
    /// `>STC` line starting a synchronize-with-central.
    SyncOpen,
    /// `<STC` line ending a synchronize-with-central.
    SyncClose,
    /// `>OpenLink ... <OpenLink` block, possibly spanning lines.
    LinkLoad,
}

impl EventKind {
    /// Every kind, in the order the session index consumes them.
    pub const ALL: [EventKind; 5] = [
        EventKind::Header,
        EventKind::Terminator,
        EventKind::SyncOpen,
        EventKind::SyncClose,
        EventKind::LinkLoad,
    ];

    /// The compiled pattern for this kind.
    pub fn pattern(self) -> &'static Regex {
        match self {
            EventKind::Header => &*HEADER,
            EventKind::Terminator => &*TERMINATOR,
            EventKind::SyncOpen => &*SYNC_OPEN,
            EventKind::SyncClose => &*SYNC_CLOSE,
            EventKind::LinkLoad => &*LINK_LOAD,
        }
    }
}

/// Parse a log timestamp, discarding any `.mmm` sub-second suffix.
pub fn parse_timestamp(text: &str) -> Result<NaiveDateTime, ParseError> {
    let trimmed = text.trim();
    let whole_seconds = trimmed.split('.').next().unwrap_or(trimmed);

    NaiveDateTime::parse_from_str(whole_seconds, TIMESTAMP_FORMAT).map_err(|_| {
        ParseError::TimestampParse {
            text: text.to_string(),
        }
    })
}

/// Format a timestamp the way it appears in the log, without sub-seconds.
pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Canonical host name: everything before the first `.` of the host field.
pub fn canonical_host(raw: &str) -> &str {
    raw.split('.').next().unwrap_or(raw)
}
