pub mod sqlite;

use crate::{core::allocator::AllocatorState, message::LogRecord};

#[derive(Debug)]
pub enum PersistError {
    Sqlite(rusqlite::Error),
    Serde(serde_json::Error),
    /// Uniqueness invariant violated in the backing store. Not recoverable.
    Corruption(String),
    Message(String),
}

impl From<rusqlite::Error> for PersistError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

impl From<serde_json::Error> for PersistError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serde(value)
    }
}

pub type PersistResult<T> = Result<T, PersistError>;

/// Durable storage seam for the request log.
///
/// The backing store holds two logical collections: one allocator-state
/// singleton and the record collection keyed by unique id. Implementations
/// report uniqueness violations as [`PersistError::Corruption`] rather than
/// silently picking a survivor.
pub trait LogSink: Send {
    /// Overwrites the allocator singleton.
    fn store_allocator(&mut self, state: &AllocatorState) -> PersistResult<()>;
    /// Loads the allocator singleton, `None` when the store is fresh.
    fn load_allocator(&mut self) -> PersistResult<Option<AllocatorState>>;
    /// Appends a newly created record.
    fn append_record(&mut self, record: &LogRecord) -> PersistResult<()>;
    /// Rewrites an existing record after a response was attached.
    fn update_record(&mut self, record: &LogRecord) -> PersistResult<()>;
    /// Loads every record.
    fn load_records(&mut self) -> PersistResult<Vec<LogRecord>>;
    /// Pushes buffered writes to durable media.
    fn flush(&mut self) -> PersistResult<()> {
        Ok(())
    }
}
