use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::duration::Elapsed;
use crate::error::{ParseError, Stage};

/// A user as named in session headers. Case-sensitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub name: String,
    /// Sessions in the order their headers were first seen.
    pub sessions: Vec<Session>,
}

impl User {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sessions: Vec::new(),
        }
    }

    /// Look up one of this user's sessions by token.
    pub fn session(&self, token: &str) -> Option<&Session> {
        self.sessions.iter().find(|s| s.token == token)
    }
}

/// One working session against a central model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub start: NaiveDateTime,
    /// Set by the first matching terminator, never overwritten.
    pub end: Option<NaiveDateTime>,
    pub duration: Option<Elapsed>,
    pub host: String,
    pub build: String,
    pub central: String,
    pub syncs: Vec<SyncEvent>,
    pub links: Vec<LinkLoad>,
}

impl Session {
    pub fn new(token: impl Into<String>, start: NaiveDateTime) -> Self {
        Self {
            token: token.into(),
            start,
            end: None,
            duration: None,
            host: String::new(),
            build: String::new(),
            central: String::new(),
            syncs: Vec::new(),
            links: Vec::new(),
        }
    }

    /// Whether a terminator has been attached.
    pub fn is_closed(&self) -> bool {
        self.end.is_some()
    }
}

/// A synchronize-with-central interval. Only the start is filled unless sync
/// pairing is enabled for the build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncEvent {
    pub id: String,
    pub start: NaiveDateTime,
    pub end: Option<NaiveDateTime>,
    pub duration: Option<Elapsed>,
}

/// The opening of a linked model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkLoad {
    pub id: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub duration: Elapsed,
    /// Path exactly as written between the quotes in the log.
    pub path: String,
}

/// A match that was dropped while building the index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub stage: Stage,
    pub token: String,
    pub reason: String,
}

impl Diagnostic {
    pub fn new(stage: Stage, token: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            stage,
            token: token.into(),
            reason: reason.into(),
        }
    }

    pub fn from_error(stage: Stage, token: impl Into<String>, error: &ParseError) -> Self {
        Self::new(stage, token, error.to_string())
    }
}
