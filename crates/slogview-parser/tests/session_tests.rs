use std::fs;

use pretty_assertions::assert_eq;
use slogview_parser::{
    format_timestamp, parse_log, record_projection, tabular_projection, BuildOptions, Elapsed,
    LogEncoding, SessionIndex, Stage,
};
use tempfile::TempDir;

/// Helper: a well-formed session header block.
fn header(token: &str, user: &str, start: &str, host: &str) -> String {
    format!(
        concat!(
            "{token} {start}.000 >Session  {token}\n",
            " user=\"{user}\"\n",
            " build=\"20240101_1515(x64)\"\n",
            " journal=\"C:\\Users\\{user}\\journal.0001.txt\"\n",
            " host={host_upper} \"{host}\"\n",
            " server=\"REVITSRV\" \"srv01.example.com\"\n",
            " central=\"\\\\srv01\\projects\\456_11\\central.rvt\"\n",
        ),
        token = token,
        start = start,
        user = user,
        host = host,
        host_upper = host.to_uppercase(),
    )
}

fn terminator(token: &str, end: &str) -> String {
    format!("{} {}.000 <Session\n", token, end)
}

/// Helper: a log with two users, three sessions, syncs and link loads,
/// interleaved the way a shared central log is.
fn sample_log() -> String {
    [
        header("$aaaaaaaa", "jdoe", "2024-01-01 09:00:00", "ws01.office.example.com"),
        header("$bbbbbbbb", "asmith", "2024-01-01 09:02:00", "ws02.office.example.com"),
        "$aaaaaaaa 2024-01-01 09:05:00.000 >OpenLink \"C:\\model\\link.rvt\"\n".to_string(),
        ":0:< opening worksets\n".to_string(),
        "$aaaaaaaa 2024-01-01 09:07:30.000 <OpenLink\n".to_string(),
        "$bbbbbbbb 2024-01-01 09:10:00.123 >STC\n".to_string(),
        "$aaaaaaaa 2024-01-01 09:11:00.000 >STC\n".to_string(),
        "$bbbbbbbb 2024-01-01 09:12:30.456 <STC\n".to_string(),
        "$aaaaaaaa 2024-01-01 09:13:00.000 <STC\n".to_string(),
        "$bbbbbbbb 2024-01-01 09:20:00.000 >STC\n".to_string(),
        header("$cccccccc", "jdoe", "2024-01-01 11:00:00", "ws01.office.example.com"),
        terminator("$aaaaaaaa", "2024-01-01 10:30:00"),
        terminator("$bbbbbbbb", "2024-01-01 12:00:00"),
    ]
    .concat()
}

// ============================================================
// End-to-end scenarios
// ============================================================

#[test]
fn test_single_session_round_trip() {
    let log = [
        header("$AAAAAAAA", "jdoe", "2024-01-01 09:00:00", "ws01.example.com"),
        "$AAAAAAAA garbage 2024-01-01 10:30:00.000 <Session\n".to_string(),
    ]
    .concat();

    let index = SessionIndex::build(&log);

    assert_eq!(index.users().len(), 1);
    let user = &index.users()[0];
    assert_eq!(user.name, "jdoe");
    assert_eq!(user.sessions.len(), 1);

    let session = &user.sessions[0];
    assert_eq!(session.token, "$AAAAAAAA");
    assert_eq!(format_timestamp(&session.start), "2024-01-01 09:00:00");
    assert_eq!(format_timestamp(&session.end.unwrap()), "2024-01-01 10:30:00");
    assert_eq!(session.duration.unwrap().to_string(), "1:30:00");
    assert_eq!(session.host, "ws01");

    assert_eq!(tabular_projection(&index).len(), 1);
}

#[test]
fn test_link_load_scenario() {
    let index = SessionIndex::build(&sample_log());
    let (_, session) = index.session("$aaaaaaaa").unwrap();

    assert_eq!(session.links.len(), 1);
    let link = &session.links[0];
    assert_eq!(link.id, "0000$aaaaaaaa");
    assert_eq!(link.duration.to_string(), "0:02:30");
    assert_eq!(link.path, r"C:\model\link.rvt");
    assert_eq!(format_timestamp(&link.start), "2024-01-01 09:05:00");
    assert_eq!(format_timestamp(&link.end), "2024-01-01 09:07:30");
}

// ============================================================
// Index construction
// ============================================================

#[test]
fn test_users_and_sessions_in_encounter_order() {
    let index = SessionIndex::build(&sample_log());

    let users: Vec<_> = index.users().iter().map(|u| u.name.as_str()).collect();
    assert_eq!(users, vec!["jdoe", "asmith"]);

    let jdoe = index.user("jdoe").unwrap();
    let tokens: Vec<_> = jdoe.sessions.iter().map(|s| s.token.as_str()).collect();
    assert_eq!(tokens, vec!["$aaaaaaaa", "$cccccccc"]);
    assert_eq!(index.session_count(), 3);
}

#[test]
fn test_header_fields() {
    let index = SessionIndex::build(&sample_log());
    let (_, session) = index.session("$bbbbbbbb").unwrap();

    assert_eq!(format_timestamp(&session.start), "2024-01-01 09:02:00");
    assert_eq!(session.build, "20240101_1515(x64)");
    assert_eq!(session.host, "ws02");
    assert_eq!(session.central, r"\\srv01\projects\456_11\central.rvt");
}

#[test]
fn test_open_session_stays_open() {
    let index = SessionIndex::build(&sample_log());
    let (_, session) = index.session("$cccccccc").unwrap();

    assert!(!session.is_closed());
    assert!(session.duration.is_none());
}

#[test]
fn test_negative_duration_is_preserved() {
    let log = [
        header("$aaaaaaaa", "jdoe", "2024-01-01 10:00:00", "ws01"),
        terminator("$aaaaaaaa", "2024-01-01 09:59:00"),
    ]
    .concat();

    let index = SessionIndex::build(&log);
    let (_, session) = index.session("$aaaaaaaa").unwrap();
    let duration = session.duration.unwrap();

    assert_eq!(duration, Elapsed::from_secs(-60));
    assert_eq!(duration.to_string(), "-1 day, 23:59:00");
}

#[test]
fn test_unknown_terminator_creates_no_session() {
    let log = [
        header("$aaaaaaaa", "jdoe", "2024-01-01 09:00:00", "ws01"),
        terminator("$ffffffff", "2024-01-01 10:00:00"),
    ]
    .concat();

    let index = SessionIndex::build(&log);

    assert_eq!(index.session_count(), 1);
    assert!(index.session("$ffffffff").is_none());
    assert_eq!(index.diagnostics().len(), 1);
    assert_eq!(index.diagnostics()[0].stage, Stage::Terminator);
    assert_eq!(index.diagnostics()[0].token, "$ffffffff");
}

#[test]
fn test_unresolved_sub_events_are_skipped() {
    let log = [
        "$ffffffff 2024-01-01 09:10:00.000 >STC\n",
        "$ffffffff 2024-01-01 09:05:00.000 >OpenLink \"C:\\x.rvt\"\n",
        "$ffffffff 2024-01-01 09:06:00.000 <OpenLink\n",
    ]
    .concat();

    let index = SessionIndex::build(&log);

    assert!(index.is_empty());
    let stages: Vec<_> = index.diagnostics().iter().map(|d| d.stage).collect();
    assert_eq!(stages, vec![Stage::SyncOpen, Stage::LinkLoad]);
}

#[test]
fn test_build_is_idempotent() {
    let log = sample_log();
    let first = SessionIndex::build(&log);
    let second = SessionIndex::build(&log);

    assert_eq!(first, second);
    assert_eq!(record_projection(&first), record_projection(&second));
}

#[test]
fn test_garbage_yields_empty_index() {
    let index = SessionIndex::build("not a session log\n>Session\n<Session\n");
    assert!(index.is_empty());
    assert!(index.diagnostics().is_empty());
}

// ============================================================
// Syncs
// ============================================================

#[test]
fn test_syncs_default_records_opens_only() {
    let index = SessionIndex::build(&sample_log());

    let (_, b) = index.session("$bbbbbbbb").unwrap();
    let ids: Vec<_> = b.syncs.iter().map(|s| s.id.as_str()).collect();
    // Ordinals count every >STC in the log, not per session.
    assert_eq!(ids, vec!["00$bbbbbbbb", "02$bbbbbbbb"]);
    assert_eq!(format_timestamp(&b.syncs[0].start), "2024-01-01 09:10:00");
    assert!(b.syncs.iter().all(|s| s.end.is_none() && s.duration.is_none()));

    let (_, a) = index.session("$aaaaaaaa").unwrap();
    assert_eq!(a.syncs.len(), 1);
    assert_eq!(a.syncs[0].id, "01$aaaaaaaa");

    assert_eq!(index.sync_closes_seen(), 2);
}

#[test]
fn test_syncs_paired_by_position() {
    let index = SessionIndex::build_with(&sample_log(), BuildOptions { pair_syncs: true });

    let (_, b) = index.session("$bbbbbbbb").unwrap();
    assert_eq!(format_timestamp(&b.syncs[0].end.unwrap()), "2024-01-01 09:12:30");
    assert_eq!(b.syncs[0].duration.unwrap().to_string(), "0:02:30");
    // Second open has no close yet.
    assert!(b.syncs[1].end.is_none());

    let (_, a) = index.session("$aaaaaaaa").unwrap();
    assert_eq!(a.syncs[0].duration, Some(Elapsed::from_secs(120)));
}

// ============================================================
// Projections
// ============================================================

#[test]
fn test_tabular_projection_excludes_open_sessions() {
    let index = SessionIndex::build(&sample_log());
    let rows = tabular_projection(&index);

    let summary: Vec<_> = rows
        .iter()
        .map(|r| (r.user.as_str(), format_timestamp(&r.start), format_timestamp(&r.end)))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("jdoe", "2024-01-01 09:00:00".to_string(), "2024-01-01 10:30:00".to_string()),
            ("asmith", "2024-01-01 09:02:00".to_string(), "2024-01-01 12:00:00".to_string()),
        ]
    );
}

#[test]
fn test_record_projection_shape() {
    let index = SessionIndex::build(&sample_log());
    let records = record_projection(&index);

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].user, "jdoe");
    assert_eq!(records[0].sessions.len(), 2);
    assert_eq!(records[0].sessions[1].end, "");

    let json = serde_json::to_value(&records[0].sessions[0]).unwrap();
    assert_eq!(json["session_id"], "$aaaaaaaa");
    assert_eq!(json["hosts"], "ws01");
    assert_eq!(json["duration"], "1:30:00");
    assert_eq!(json["links"][0]["link_path"], r"C:\model\link.rvt");
    assert_eq!(json["links"][0]["link_open_duration"], "0:02:30");
    assert_eq!(json["syncs"][0]["sync_id"], "01$aaaaaaaa");
    assert_eq!(json["syncs"][0]["sync_end"], "");
}

// ============================================================
// Reading from disk
// ============================================================

#[test]
fn test_parse_log_from_utf16_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("central.slog");

    let mut bytes = vec![0xFF, 0xFE];
    for unit in sample_log().replace('\n', "\r\n").encode_utf16() {
        bytes.extend_from_slice(&unit.to_le_bytes());
    }
    fs::write(&path, bytes).unwrap();

    let index = parse_log(&path, LogEncoding::Auto, BuildOptions::default()).unwrap();
    assert_eq!(index, SessionIndex::build(&sample_log()));
}
