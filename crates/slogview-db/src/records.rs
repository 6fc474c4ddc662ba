//! Session records keyed by (collection, session_id).

use chrono::Utc;
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use slogview_parser::SessionRecord;
use std::sync::MutexGuard;

use crate::StoreError;

/// Result of offering a record to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpsertOutcome {
    /// The record was new and has been written.
    Stored,
    /// A record with the same session id already exists in the collection.
    AlreadyPresent,
}

/// Records store with a borrowed connection.
pub struct Records<'db> {
    conn: MutexGuard<'db, Connection>,
}

impl<'db> Records<'db> {
    /// Create a new Records store with a borrowed connection.
    pub(crate) fn new(conn: MutexGuard<'db, Connection>) -> Self {
        Self { conn }
    }

    /// Insert the record unless the collection already holds its session id.
    pub fn upsert(
        &self,
        collection: &str,
        record: &SessionRecord,
    ) -> Result<UpsertOutcome, StoreError> {
        let document = serde_json::to_string(record)?;

        let inserted = self.conn.execute(
            r#"
            INSERT OR IGNORE INTO session_records (collection, session_id, document, stored_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![
                collection,
                record.session_id,
                document,
                Utc::now().to_rfc3339(),
            ],
        )?;

        Ok(if inserted == 1 {
            UpsertOutcome::Stored
        } else {
            UpsertOutcome::AlreadyPresent
        })
    }

    /// All records of a collection in insertion order.
    pub fn list(&self, collection: &str) -> Result<Vec<SessionRecord>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT document FROM session_records WHERE collection = ?1 ORDER BY rowid",
        )?;
        let rows = stmt.query_map(params![collection], |row| row.get::<_, String>(0))?;

        let mut records = Vec::new();
        for row in rows {
            records.push(serde_json::from_str(&row?)?);
        }

        Ok(records)
    }

    /// Names of all collections that hold at least one record.
    pub fn collections(&self) -> Result<Vec<String>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT DISTINCT collection FROM session_records ORDER BY collection")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut collections = Vec::new();
        for row in rows {
            collections.push(row?);
        }

        Ok(collections)
    }

    /// Number of records in a collection.
    pub fn count(&self, collection: &str) -> Result<usize, StoreError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM session_records WHERE collection = ?1",
            params![collection],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}
