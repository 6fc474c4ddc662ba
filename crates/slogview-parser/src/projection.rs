//! Read-only views of a [`SessionIndex`]: plain records for storage and flat
//! rows for the timeline chart.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::duration::Elapsed;
use crate::index::SessionIndex;
use crate::patterns::format_timestamp;
use crate::types::{LinkLoad, Session, SyncEvent};

/// Plain sync record. Missing values are empty strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncRecord {
    pub sync_id: String,
    pub sync_start: String,
    pub sync_end: String,
    pub sync_duration: String,
}

/// Plain link-load record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRecord {
    pub link_id: String,
    pub link_open_start: String,
    pub link_open_end: String,
    pub link_open_duration: String,
    pub link_path: String,
}

/// Session flattened to scalars plus its embedded sync and link records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub session_id: String,
    pub start: String,
    pub end: String,
    pub duration: String,
    pub build: String,
    #[serde(rename = "hosts")]
    pub host: String,
    pub central: String,
    pub syncs: Vec<SyncRecord>,
    pub links: Vec<LinkRecord>,
}

/// All session records of one user, in index order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecords {
    pub user: String,
    pub sessions: Vec<SessionRecord>,
}

/// One closed session as a chart row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineRow {
    pub user: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl From<&SyncEvent> for SyncRecord {
    fn from(sync: &SyncEvent) -> Self {
        Self {
            sync_id: sync.id.clone(),
            sync_start: format_timestamp(&sync.start),
            sync_end: optional_timestamp(sync.end.as_ref()),
            sync_duration: optional_elapsed(sync.duration.as_ref()),
        }
    }
}

impl From<&LinkLoad> for LinkRecord {
    fn from(link: &LinkLoad) -> Self {
        Self {
            link_id: link.id.clone(),
            link_open_start: format_timestamp(&link.start),
            link_open_end: format_timestamp(&link.end),
            link_open_duration: link.duration.to_string(),
            link_path: link.path.clone(),
        }
    }
}

impl From<&Session> for SessionRecord {
    fn from(session: &Session) -> Self {
        Self {
            session_id: session.token.clone(),
            start: format_timestamp(&session.start),
            end: optional_timestamp(session.end.as_ref()),
            duration: optional_elapsed(session.duration.as_ref()),
            build: session.build.clone(),
            host: session.host.clone(),
            central: session.central.clone(),
            syncs: session.syncs.iter().map(SyncRecord::from).collect(),
            links: session.links.iter().map(LinkRecord::from).collect(),
        }
    }
}

/// Records for the record store, one entry per user.
pub fn record_projection(index: &SessionIndex) -> Vec<UserRecords> {
    index
        .users()
        .iter()
        .map(|user| UserRecords {
            user: user.name.clone(),
            sessions: user.sessions.iter().map(SessionRecord::from).collect(),
        })
        .collect()
}

/// Chart rows for every session that has an end. Open sessions are left out
/// since they have no bar to draw.
pub fn tabular_projection(index: &SessionIndex) -> Vec<TimelineRow> {
    index
        .users()
        .iter()
        .flat_map(|user| {
            user.sessions.iter().filter_map(move |session| {
                session.end.map(|end| TimelineRow {
                    user: user.name.clone(),
                    start: session.start,
                    end,
                })
            })
        })
        .collect()
}

fn optional_timestamp(ts: Option<&NaiveDateTime>) -> String {
    ts.map(format_timestamp).unwrap_or_default()
}

fn optional_elapsed(elapsed: Option<&Elapsed>) -> String {
    elapsed.map(Elapsed::to_string).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patterns::parse_timestamp;

    #[test]
    fn test_open_session_record_has_empty_end() {
        let start = parse_timestamp("2024-01-01 09:00:00").unwrap();
        let mut session = Session::new("$aaaaaaaa", start);
        session.host = "ws01".to_string();

        let record = SessionRecord::from(&session);
        assert_eq!(record.session_id, "$aaaaaaaa");
        assert_eq!(record.start, "2024-01-01 09:00:00");
        assert_eq!(record.end, "");
        assert_eq!(record.duration, "");
        assert_eq!(record.host, "ws01");
    }

    #[test]
    fn test_sync_record_without_close() {
        let sync = SyncEvent {
            id: "00$aaaaaaaa".to_string(),
            start: parse_timestamp("2024-01-01 09:10:00").unwrap(),
            end: None,
            duration: None,
        };
        let record = SyncRecord::from(&sync);
        assert_eq!(record.sync_start, "2024-01-01 09:10:00");
        assert_eq!(record.sync_end, "");
        assert_eq!(record.sync_duration, "");
    }
}
