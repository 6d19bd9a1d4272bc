//! Persistence module for the login journal
//!
//! The journal is an append-only record of successful logins; it is the
//! resume cursor between runs and the sole input of the aggregation step.

pub mod sqlite_journal;

pub use sqlite_journal::SqliteJournal;

use crate::models::LoginEvent;
use chrono::NaiveDateTime;
use std::collections::BTreeMap;
use thiserror::Error;

/// Per-IP usage: ordered (username, login_count) pairs, keyed by IP in
/// lexicographic order.
pub type UsageByIp = BTreeMap<String, Vec<(String, i64)>>;

/// Errors that can occur during persistence operations
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid data in database: {0}")]
    InvalidData(String),
}

/// Trait for journal backends
///
/// A single SQLite implementation exists today; the trait keeps the
/// pipeline testable against alternative backends.
pub trait JournalStore {
    /// Append one event; committed immediately, no batching
    fn append(&self, event: &LoginEvent) -> Result<(), PersistenceError>;

    /// Greatest stored timestamp, or `None` when the journal is empty
    fn max_timestamp(&self) -> Result<Option<NaiveDateTime>, PersistenceError>;

    /// Delete events strictly older than `cutoff`; returns deleted row count
    fn prune(&self, cutoff: NaiveDateTime) -> Result<usize, PersistenceError>;

    /// Group stored events by IP into (username, count) pairs
    fn aggregate(&self) -> Result<UsageByIp, PersistenceError>;

    /// Delete all rows (debug/test helper)
    fn clear(&self) -> Result<(), PersistenceError>;
}
