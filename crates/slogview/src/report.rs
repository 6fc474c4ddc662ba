//! Console report of a parsed log, emitted as logger events.

use slogview_db::{StoreReport, UpsertOutcome};
use slogview_logging::{LogEvent, Logger};
use slogview_parser::{format_timestamp, SessionIndex};

/// Counts from one [`slogview_db::store_all`] pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StoreSummary {
    pub stored: usize,
    pub present: usize,
    pub failed: usize,
}

/// Report users, sessions, links and syncs in index order, then skipped matches.
pub fn report_index(index: &SessionIndex, logger: &Logger) {
    logger.log(&LogEvent::UsersFound {
        count: index.users().len(),
    });

    for user in index.users() {
        logger.log(&LogEvent::UserReport {
            user: user.name.clone(),
            sessions: user.sessions.len(),
        });

        for session in &user.sessions {
            logger.log(&LogEvent::SessionReport {
                user: user.name.clone(),
                session_id: session.token.clone(),
                host: session.host.clone(),
                build: session.build.clone(),
                start: format_timestamp(&session.start),
                end: session.end.as_ref().map(format_timestamp),
                duration: session.duration.map(|d| d.to_string()),
            });

            for link in &session.links {
                logger.log(&LogEvent::LinkReport {
                    session_id: session.token.clone(),
                    link_id: link.id.clone(),
                    start: format_timestamp(&link.start),
                    duration: link.duration.to_string(),
                    path: link.path.clone(),
                });
            }

            for sync in &session.syncs {
                logger.log(&LogEvent::SyncReport {
                    session_id: session.token.clone(),
                    sync_id: sync.id.clone(),
                    start: format_timestamp(&sync.start),
                    duration: sync.duration.map(|d| d.to_string()),
                });
            }
        }
    }

    for diagnostic in index.diagnostics() {
        logger.log(&LogEvent::MatchSkipped {
            stage: diagnostic.stage.to_string(),
            token: diagnostic.token.clone(),
            reason: diagnostic.reason.clone(),
        });
    }
}

/// Report every store outcome and tally them.
pub fn report_store(reports: &[StoreReport], logger: &Logger) -> StoreSummary {
    let mut summary = StoreSummary::default();

    for report in reports {
        let user = report.collection.clone();
        let session_id = report.session_id.clone();
        let event = match &report.outcome {
            Ok(UpsertOutcome::Stored) => {
                summary.stored += 1;
                LogEvent::RecordStored { user, session_id }
            }
            Ok(UpsertOutcome::AlreadyPresent) => {
                summary.present += 1;
                LogEvent::RecordPresent { user, session_id }
            }
            Err(e) => {
                summary.failed += 1;
                LogEvent::RecordFailed {
                    user,
                    session_id,
                    error: e.to_string(),
                }
            }
        };
        logger.log(&event);
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use slogview_db::StoreError;
    use slogview_logging::LogFormat;

    fn report(session_id: &str, outcome: Result<UpsertOutcome, StoreError>) -> StoreReport {
        StoreReport {
            collection: "jdoe".to_string(),
            session_id: session_id.to_string(),
            outcome,
        }
    }

    #[test]
    fn test_store_summary_counts() {
        let reports = vec![
            report("$a", Ok(UpsertOutcome::Stored)),
            report("$b", Ok(UpsertOutcome::AlreadyPresent)),
            report("$c", Ok(UpsertOutcome::Stored)),
            report(
                "$d",
                Err(StoreError::Io(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    "disk full",
                ))),
            ),
        ];

        let summary = report_store(&reports, &Logger::new(LogFormat::Compact));

        assert_eq!(
            summary,
            StoreSummary {
                stored: 2,
                present: 1,
                failed: 1,
            }
        );
    }
}
