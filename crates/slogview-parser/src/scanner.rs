//! Full-text passes over the log, one per event kind.

use regex::Captures;

use crate::patterns::EventKind;

/// A session header block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderMatch {
    pub offset: usize,
    pub token: String,
    pub user: String,
    pub build: String,
    /// Host field as written, before truncation at the first dot.
    pub host: String,
    pub central: String,
    pub start: String,
}

/// A session terminator line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminatorMatch {
    pub offset: usize,
    pub token: String,
    pub end: String,
}

/// A `>STC` or `<STC` marker line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncMarker {
    pub offset: usize,
    pub token: String,
    pub at: String,
}

/// A complete link-load block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkLoadMatch {
    pub offset: usize,
    pub token: String,
    pub start: String,
    pub end: String,
    pub path: String,
}

/// One raw match produced by [`Scanner::scan`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawMatch {
    Header(HeaderMatch),
    Terminator(TerminatorMatch),
    SyncOpen(SyncMarker),
    SyncClose(SyncMarker),
    LinkLoad(LinkLoadMatch),
}

impl RawMatch {
    pub fn kind(&self) -> EventKind {
        match self {
            RawMatch::Header(_) => EventKind::Header,
            RawMatch::Terminator(_) => EventKind::Terminator,
            RawMatch::SyncOpen(_) => EventKind::SyncOpen,
            RawMatch::SyncClose(_) => EventKind::SyncClose,
            RawMatch::LinkLoad(_) => EventKind::LinkLoad,
        }
    }

    /// Byte offset of the match in the scanned text.
    pub fn offset(&self) -> usize {
        match self {
            RawMatch::Header(m) => m.offset,
            RawMatch::Terminator(m) => m.offset,
            RawMatch::SyncOpen(m) | RawMatch::SyncClose(m) => m.offset,
            RawMatch::LinkLoad(m) => m.offset,
        }
    }
}

/// Stateless scanner over a fully loaded log.
///
/// Every call walks the whole text again; matches come back in textual order
/// and an empty result is a normal outcome.
#[derive(Debug, Clone, Copy)]
pub struct Scanner<'a> {
    text: &'a str,
}

impl<'a> Scanner<'a> {
    pub fn new(text: &'a str) -> Self {
        Self { text }
    }

    /// Run the pass for one event kind.
    pub fn scan(&self, kind: EventKind) -> Vec<RawMatch> {
        match kind {
            EventKind::Header => self.headers().into_iter().map(RawMatch::Header).collect(),
            EventKind::Terminator => self
                .terminators()
                .into_iter()
                .map(RawMatch::Terminator)
                .collect(),
            EventKind::SyncOpen => self
                .sync_opens()
                .into_iter()
                .map(RawMatch::SyncOpen)
                .collect(),
            EventKind::SyncClose => self
                .sync_closes()
                .into_iter()
                .map(RawMatch::SyncClose)
                .collect(),
            EventKind::LinkLoad => self
                .link_loads()
                .into_iter()
                .map(RawMatch::LinkLoad)
                .collect(),
        }
    }

    pub fn headers(&self) -> Vec<HeaderMatch> {
        self.captures(EventKind::Header, |offset, caps| HeaderMatch {
            offset,
            token: caps["token"].to_string(),
            user: caps["user"].to_string(),
            build: caps["build"].to_string(),
            host: caps["host"].to_string(),
            central: caps["central"].to_string(),
            start: caps["start"].to_string(),
        })
    }

    pub fn terminators(&self) -> Vec<TerminatorMatch> {
        self.captures(EventKind::Terminator, |offset, caps| TerminatorMatch {
            offset,
            token: caps["token"].to_string(),
            end: caps["end"].to_string(),
        })
    }

    pub fn sync_opens(&self) -> Vec<SyncMarker> {
        self.captures(EventKind::SyncOpen, sync_marker)
    }

    pub fn sync_closes(&self) -> Vec<SyncMarker> {
        self.captures(EventKind::SyncClose, sync_marker)
    }

    pub fn link_loads(&self) -> Vec<LinkLoadMatch> {
        self.captures(EventKind::LinkLoad, |offset, caps| LinkLoadMatch {
            offset,
            token: caps["token"].to_string(),
            start: caps["start"].to_string(),
            end: caps["end"].to_string(),
            path: caps["path"].to_string(),
        })
    }

    fn captures<T>(&self, kind: EventKind, build: impl Fn(usize, &Captures<'_>) -> T) -> Vec<T> {
        kind.pattern()
            .captures_iter(self.text)
            .map(|caps| {
                let offset = caps.get(0).map(|m| m.start()).unwrap_or_default();
                build(offset, &caps)
            })
            .collect()
    }
}

fn sync_marker(offset: usize, caps: &Captures<'_>) -> SyncMarker {
    SyncMarker {
        offset,
        token: caps["token"].to_string(),
        at: caps["at"].to_string(),
    }
}
