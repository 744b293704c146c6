use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use crate::violation::domain::violation_record::{StoredViolation, ViolationRecord};
use crate::violation::domain::violation_store::{StoreError, ViolationStore};

/// Path value that selects a private in-memory database.
pub const IN_MEMORY: &str = ":memory:";

/// SQLite-backed violation log: a single `violations` table, insert-only.
pub struct SqliteViolationStore {
    conn: Connection,
}

fn backend(e: rusqlite::Error) -> StoreError {
    StoreError::Backend(Box::new(e))
}

impl SqliteViolationStore {
    /// Opens (creating if needed) the database at `path`. `:memory:` opens a
    /// throwaway in-memory database.
    pub fn open(path: &str) -> Result<Self, StoreError> {
        let conn = if path == IN_MEMORY {
            Connection::open_in_memory()
        } else {
            Connection::open(Path::new(path))
        }
        .map_err(backend)?;

        let store = Self { conn };
        store.ensure_schema()?;
        log::info!("Opened violation store at {path}");
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::open(IN_MEMORY)
    }

    fn ensure_schema(&self) -> Result<(), StoreError> {
        self.conn
            .execute_batch(
                r#"
                CREATE TABLE IF NOT EXISTS violations (
                  id INTEGER PRIMARY KEY AUTOINCREMENT,
                  type TEXT NOT NULL,
                  timestamp TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_violations_timestamp ON violations(timestamp);
                "#,
            )
            .map_err(backend)
    }
}

impl ViolationStore for SqliteViolationStore {
    fn append(&mut self, record: &ViolationRecord) -> Result<i64, StoreError> {
        self.conn
            .execute(
                "INSERT INTO violations (type, timestamp) VALUES (?1, ?2)",
                params![record.kind, record.timestamp],
            )
            .map_err(backend)?;
        Ok(self.conn.last_insert_rowid())
    }

    fn list_recent(&mut self, limit: Option<usize>) -> Result<Vec<StoredViolation>, StoreError> {
        // SQLite treats a negative LIMIT as unbounded.
        let limit = limit.map_or(-1, |n| n as i64);
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, type, timestamp FROM violations \
                 ORDER BY timestamp DESC, id DESC LIMIT ?1",
            )
            .map_err(backend)?;

        let rows = stmt
            .query_map(params![limit], |row| {
                let timestamp: DateTime<Utc> = row.get(2)?;
                Ok(StoredViolation {
                    id: row.get(0)?,
                    record: ViolationRecord::new(row.get::<_, String>(1)?, timestamp),
                })
            })
            .map_err(backend)?;

        rows.collect::<Result<Vec<_>, _>>().map_err(backend)
    }
}

impl Drop for SqliteViolationStore {
    fn drop(&mut self) {
        log::debug!("Closing violation store");
    }
}
