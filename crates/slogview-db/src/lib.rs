//! Record store for slogview.
//!
//! Parsed sessions are kept in one SQLite file per project. Each user is a
//! collection, and a record is only written if its collection does not
//! already hold the same `session_id`, so importing the same log twice is
//! harmless.

mod error;
mod records;

pub use error::StoreError;
pub use records::{Records, UpsertOutcome};

use rusqlite::Connection;
use slogview_parser::{SessionRecord, UserRecords};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Anything that can persist session records with append-if-absent semantics.
pub trait RecordSink {
    /// Store `record` in `collection` unless its session id is already there.
    fn upsert(&self, collection: &str, record: &SessionRecord) -> Result<UpsertOutcome, StoreError>;

    /// Records of one collection, oldest first.
    fn stored(&self, collection: &str) -> Result<Vec<SessionRecord>, StoreError>;
}

/// Outcome of storing one record during [`store_all`].
#[derive(Debug)]
pub struct StoreReport {
    pub collection: String,
    pub session_id: String,
    pub outcome: Result<UpsertOutcome, StoreError>,
}

/// Offer every record to the sink. A failing record does not stop the rest.
pub fn store_all(sink: &dyn RecordSink, users: &[UserRecords]) -> Vec<StoreReport> {
    let mut reports = Vec::new();

    for user in users {
        for record in &user.sessions {
            let outcome = sink.upsert(&user.user, record);
            if let Err(ref e) = outcome {
                tracing::warn!(
                    user = %user.user,
                    session_id = %record.session_id,
                    "Failed to store record: {}",
                    e
                );
            }
            reports.push(StoreReport {
                collection: user.user.clone(),
                session_id: record.session_id.clone(),
                outcome,
            });
        }
    }

    reports
}

/// The main database struct that owns the SQLite connection.
pub struct Database {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl Database {
    /// Open or create the store for a project inside `dir`.
    ///
    /// The file is named `<project_code>_db.sqlite`; `dir` is created if
    /// missing.
    pub fn open_for_project(dir: &Path, project_code: &str) -> Result<Self, StoreError> {
        std::fs::create_dir_all(dir)?;
        Self::open_at(&Self::project_path(dir, project_code))
    }

    /// Open or create a database at a specific path.
    pub fn open_at(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            path: Some(path.to_path_buf()),
        })
    }

    /// Open an in-memory database (useful for testing).
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            path: None,
        })
    }

    /// Default directory for project stores: `~/.local/share/slogview/db`.
    pub fn default_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("slogview")
            .join("db")
    }

    pub fn project_path(dir: &Path, project_code: &str) -> PathBuf {
        dir.join(format!("{}_db.sqlite", project_code))
    }

    /// File backing this database, `None` when in memory.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Access the records store.
    pub fn records(&self) -> Records<'_> {
        let conn = self.conn.lock().expect("Database lock poisoned");
        Records::new(conn)
    }

    fn init_schema(conn: &Connection) -> Result<(), rusqlite::Error> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS session_records (
                collection TEXT NOT NULL,
                session_id TEXT NOT NULL,
                document TEXT NOT NULL,
                stored_at TEXT NOT NULL,
                PRIMARY KEY (collection, session_id)
            );

            CREATE INDEX IF NOT EXISTS idx_session_records_collection
                ON session_records(collection);
            "#,
        )
    }
}

impl RecordSink for Database {
    fn upsert(&self, collection: &str, record: &SessionRecord) -> Result<UpsertOutcome, StoreError> {
        self.records().upsert(collection, record)
    }

    fn stored(&self, collection: &str) -> Result<Vec<SessionRecord>, StoreError> {
        self.records().list(collection)
    }
}
