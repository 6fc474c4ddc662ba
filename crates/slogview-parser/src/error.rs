use std::path::PathBuf;

use thiserror::Error;

/// Stage of the session index build that produced an error or diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Header,
    Terminator,
    SyncOpen,
    SyncClose,
    LinkLoad,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Header => "header",
            Stage::Terminator => "terminator",
            Stage::SyncOpen => "sync_open",
            Stage::SyncClose => "sync_close",
            Stage::LinkLoad => "link_load",
        };
        f.write_str(name)
    }
}

/// Per-record errors. These are recovered where they occur: the record is
/// dropped and the build continues.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Malformed timestamp: {text:?}")]
    TimestampParse { text: String },

    #[error("Session token {token} referenced by {stage} was never opened by a header")]
    UnresolvedToken { token: String, stage: Stage },
}

/// Errors reading the log file itself. These are fatal for a run.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Log not found at {0}")]
    NotFound(PathBuf),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
