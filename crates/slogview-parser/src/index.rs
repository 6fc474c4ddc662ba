//! Correlates scanned events into the user → session → event graph.
//!
//! The build runs in four ordered stages: headers create sessions,
//! terminators close them, sync markers and link loads attach to them. Only
//! headers carry a user name, so later stages find their owner through a
//! token index that lives for the duration of the build.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::duration::Elapsed;
use crate::error::{ParseError, Stage};
use crate::patterns::{canonical_host, format_timestamp, parse_timestamp};
use crate::scanner::{HeaderMatch, LinkLoadMatch, Scanner, SyncMarker, TerminatorMatch};
use crate::types::{Diagnostic, LinkLoad, Session, SyncEvent, User};

/// Knobs for [`SessionIndex::build_with`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildOptions {
    /// Pair the i-th `<STC` of a session with its i-th `>STC` and fill in
    /// sync end and duration. Off by default: sync closes are only counted.
    pub pair_syncs: bool,
}

/// Immutable snapshot of one parsed log.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionIndex {
    users: Vec<User>,
    diagnostics: Vec<Diagnostic>,
    sync_closes_seen: usize,
}

impl SessionIndex {
    /// Build with default options.
    pub fn build(text: &str) -> Self {
        Self::build_with(text, BuildOptions::default())
    }

    pub fn build_with(text: &str, options: BuildOptions) -> Self {
        let scanner = Scanner::new(text);
        let mut builder = IndexBuilder::default();

        builder.add_headers(&scanner.headers());
        builder.close_sessions(&scanner.terminators());
        builder.attach_syncs(&scanner.sync_opens(), &scanner.sync_closes(), options);
        builder.attach_links(&scanner.link_loads());

        let index = builder.finish();
        debug!(
            users = index.users.len(),
            sessions = index.session_count(),
            skipped = index.diagnostics.len(),
            "Session index built"
        );
        index
    }

    /// Users in the order of their first header.
    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn user(&self, name: &str) -> Option<&User> {
        self.users.iter().find(|u| u.name == name)
    }

    /// Find a session and its owner by token.
    pub fn session(&self, token: &str) -> Option<(&User, &Session)> {
        self.users
            .iter()
            .find_map(|u| u.session(token).map(|s| (u, s)))
    }

    pub fn session_count(&self) -> usize {
        self.users.iter().map(|u| u.sessions.len()).sum()
    }

    /// Matches that were dropped, in the order they were encountered.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Number of `<STC` markers found in the log.
    pub fn sync_closes_seen(&self) -> usize {
        self.sync_closes_seen
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Slot {
    user: usize,
    session: usize,
}

#[derive(Default)]
struct IndexBuilder {
    users: Vec<User>,
    user_slots: HashMap<String, usize>,
    owners: HashMap<String, Slot>,
    diagnostics: Vec<Diagnostic>,
    sync_closes_seen: usize,
}

impl IndexBuilder {
    fn add_headers(&mut self, headers: &[HeaderMatch]) {
        for header in headers {
            let start = match parse_timestamp(&header.start) {
                Ok(ts) => ts,
                Err(e) => {
                    self.skip(Stage::Header, &header.token, &e);
                    continue;
                }
            };

            let mut session = Session::new(header.token.clone(), start);
            session.host = canonical_host(&header.host).to_string();
            session.build = header.build.clone();
            session.central = header.central.clone();

            let user = self.user_slot(&header.user);
            self.insert_session(user, session);
        }
    }

    fn close_sessions(&mut self, terminators: &[TerminatorMatch]) {
        for term in terminators {
            let Some(slot) = self.resolve(Stage::Terminator, &term.token) else {
                continue;
            };
            let end = match parse_timestamp(&term.end) {
                Ok(ts) => ts,
                Err(e) => {
                    self.skip(Stage::Terminator, &term.token, &e);
                    continue;
                }
            };

            let session = self.session_mut(slot);
            if let Some(existing) = session.end {
                let reason = format!(
                    "Session already closed at {}, ignoring end {}",
                    format_timestamp(&existing),
                    format_timestamp(&end)
                );
                self.note(Stage::Terminator, &term.token, reason);
                continue;
            }

            session.duration = Some(Elapsed::between(&session.start, &end));
            session.end = Some(end);
        }
    }

    fn attach_syncs(&mut self, opens: &[SyncMarker], closes: &[SyncMarker], options: BuildOptions) {
        for (i, open) in opens.iter().enumerate() {
            let Some(slot) = self.resolve(Stage::SyncOpen, &open.token) else {
                continue;
            };
            let start = match parse_timestamp(&open.at) {
                Ok(ts) => ts,
                Err(e) => {
                    self.skip(Stage::SyncOpen, &open.token, &e);
                    continue;
                }
            };

            self.session_mut(slot).syncs.push(SyncEvent {
                id: format!("{:02}{}", i, open.token),
                start,
                end: None,
                duration: None,
            });
        }

        self.sync_closes_seen = closes.len();
        if options.pair_syncs {
            self.pair_sync_closes(closes);
        }
    }

    fn pair_sync_closes(&mut self, closes: &[SyncMarker]) {
        let mut paired: HashMap<&str, usize> = HashMap::new();

        for close in closes {
            let Some(slot) = self.resolve(Stage::SyncClose, &close.token) else {
                continue;
            };
            let end = match parse_timestamp(&close.at) {
                Ok(ts) => ts,
                Err(e) => {
                    self.skip(Stage::SyncClose, &close.token, &e);
                    continue;
                }
            };

            let position = paired.entry(close.token.as_str()).or_insert(0);
            let n = *position;
            *position += 1;

            match self.session_mut(slot).syncs.get_mut(n) {
                Some(sync) => {
                    sync.duration = Some(Elapsed::between(&sync.start, &end));
                    sync.end = Some(end);
                }
                None => {
                    let reason = format!("No sync open to pair with close #{}", n + 1);
                    self.note(Stage::SyncClose, &close.token, reason);
                }
            }
        }
    }

    fn attach_links(&mut self, links: &[LinkLoadMatch]) {
        for (i, link) in links.iter().enumerate() {
            let Some(slot) = self.resolve(Stage::LinkLoad, &link.token) else {
                continue;
            };
            let times = parse_timestamp(&link.start)
                .and_then(|start| parse_timestamp(&link.end).map(|end| (start, end)));
            let (start, end) = match times {
                Ok(pair) => pair,
                Err(e) => {
                    self.skip(Stage::LinkLoad, &link.token, &e);
                    continue;
                }
            };

            self.session_mut(slot).links.push(LinkLoad {
                id: format!("{:04}{}", i, link.token),
                start,
                end,
                duration: Elapsed::between(&start, &end),
                path: link.path.clone(),
            });
        }
    }

    fn finish(self) -> SessionIndex {
        SessionIndex {
            users: self.users,
            diagnostics: self.diagnostics,
            sync_closes_seen: self.sync_closes_seen,
        }
    }

    fn user_slot(&mut self, name: &str) -> usize {
        if let Some(&slot) = self.user_slots.get(name) {
            return slot;
        }
        self.users.push(User::new(name));
        let slot = self.users.len() - 1;
        self.user_slots.insert(name.to_string(), slot);
        slot
    }

    /// Last header wins for a repeated token. The replaced session keeps its
    /// position when the owner is unchanged and moves otherwise.
    fn insert_session(&mut self, user: usize, session: Session) {
        let token = session.token.clone();

        if let Some(prev) = self.owners.get(&token).copied() {
            debug!(token = %token, "Repeated session header, replacing earlier session");
            if prev.user == user {
                self.users[user].sessions[prev.session] = session;
                return;
            }
            self.users[prev.user].sessions.remove(prev.session);
            for slot in self.owners.values_mut() {
                if slot.user == prev.user && slot.session > prev.session {
                    slot.session -= 1;
                }
            }
        }

        self.users[user].sessions.push(session);
        let slot = Slot {
            user,
            session: self.users[user].sessions.len() - 1,
        };
        self.owners.insert(token, slot);
    }

    fn resolve(&mut self, stage: Stage, token: &str) -> Option<Slot> {
        match self.owners.get(token) {
            Some(&slot) => Some(slot),
            None => {
                let error = ParseError::UnresolvedToken {
                    token: token.to_string(),
                    stage,
                };
                self.skip(stage, token, &error);
                None
            }
        }
    }

    fn session_mut(&mut self, slot: Slot) -> &mut Session {
        &mut self.users[slot.user].sessions[slot.session]
    }

    fn skip(&mut self, stage: Stage, token: &str, error: &ParseError) {
        warn!(stage = %stage, token = %token, "Skipping match: {}", error);
        self.diagnostics.push(Diagnostic::from_error(stage, token, error));
    }

    fn note(&mut self, stage: Stage, token: &str, reason: String) {
        warn!(stage = %stage, token = %token, "Skipping match: {}", reason);
        self.diagnostics.push(Diagnostic::new(stage, token, reason));
    }
}
