//! SQLite implementation of the JournalStore trait

use super::{JournalStore, PersistenceError, UsageByIp};
use crate::models::{event::TIMESTAMP_FORMAT, LoginEvent};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection};
use std::path::Path;

/// SQLite-backed login journal
///
/// The database file and its parent directories are created on first use.
pub struct SqliteJournal {
    conn: Connection,
}

impl SqliteJournal {
    /// Open (creating if necessary) the journal at the specified path
    pub fn open<P: AsRef<Path>>(db_path: P) -> Result<Self, PersistenceError> {
        let path = db_path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        let journal = SqliteJournal { conn };
        journal.initialize_schema()?;
        Ok(journal)
    }

    /// Create an in-memory journal (useful for testing)
    pub fn in_memory() -> Result<Self, PersistenceError> {
        let conn = Connection::open_in_memory()?;
        let journal = SqliteJournal { conn };
        journal.initialize_schema()?;
        Ok(journal)
    }

    fn initialize_schema(&self) -> Result<(), PersistenceError> {
        self.conn.execute_batch(include_str!("schema.sql"))?;
        Ok(())
    }

    fn parse_timestamp(text: &str) -> Result<NaiveDateTime, PersistenceError> {
        NaiveDateTime::parse_from_str(text, TIMESTAMP_FORMAT).map_err(|_| {
            PersistenceError::InvalidData(format!("Invalid journal timestamp: {}", text))
        })
    }
}

impl JournalStore for SqliteJournal {
    fn append(&self, event: &LoginEvent) -> Result<(), PersistenceError> {
        self.conn.execute(
            "INSERT INTO journal (timestamp, ip, username, backend) VALUES (?, ?, ?, ?)",
            params![
                event.timestamp_text(),
                event.ip,
                event.username,
                event.backend.tag()
            ],
        )?;
        Ok(())
    }

    fn max_timestamp(&self) -> Result<Option<NaiveDateTime>, PersistenceError> {
        let max: Option<String> =
            self.conn
                .query_row("SELECT max(timestamp) FROM journal", [], |row| row.get(0))?;

        match max {
            Some(text) => Ok(Some(Self::parse_timestamp(&text)?)),
            None => Ok(None),
        }
    }

    fn prune(&self, cutoff: NaiveDateTime) -> Result<usize, PersistenceError> {
        let deleted = self.conn.execute(
            "DELETE FROM journal WHERE timestamp < ?",
            params![cutoff.format(TIMESTAMP_FORMAT).to_string()],
        )?;
        Ok(deleted)
    }

    fn aggregate(&self) -> Result<UsageByIp, PersistenceError> {
        let mut stmt = self.conn.prepare(
            "SELECT ip, username, count(*) AS cnt
             FROM journal
             GROUP BY ip, username
             ORDER BY ip, username",
        )?;

        let rows = stmt.query_map([], |row| {
            let ip: String = row.get(0)?;
            let username: String = row.get(1)?;
            let count: i64 = row.get(2)?;
            Ok((ip, username, count))
        })?;

        let mut usage = UsageByIp::new();
        for row in rows {
            let (ip, username, count) = row?;
            usage.entry(ip).or_default().push((username, count));
        }
        Ok(usage)
    }

    fn clear(&self) -> Result<(), PersistenceError> {
        self.conn.execute("DELETE FROM journal", [])?;
        Ok(())
    }
}
